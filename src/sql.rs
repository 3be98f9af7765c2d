//! INSERT statement rendering for metadata records.
//!
//! Values are interpolated verbatim between single quotes, exactly the way
//! the table service's parser has always received them. A value containing
//! `'` therefore produces a malformed statement; rendering lives behind
//! [`StatementBuilder`] so an escaping builder can replace it later.

use std::fmt;

use thiserror::Error;

use crate::types::{Attribute, MetadataRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlStatement(String);

impl SqlStatement {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SqlStatement {
    fn from(sql: String) -> Self {
        Self(sql)
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statements for one record in the main/attributes layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwoTableStatements {
    pub main: SqlStatement,
    pub attributes: Vec<SqlStatement>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SqlError {
    #[error("table name must not be empty")]
    EmptyTableName,
    #[error("failed to encode attributes of record {id}: {reason}")]
    AttributesEncoding { id: u64, reason: String },
}

pub trait StatementBuilder {
    /// Row of the single denormalized table, attributes as a JSON text blob.
    fn insert_record(&self, table: &str, record: &MetadataRecord) -> Result<SqlStatement, SqlError>;
    /// Row of the main table in the two-table layout.
    fn insert_main(&self, table: &str, record: &MetadataRecord) -> SqlStatement;
    /// Row of the attributes table, keyed by the owning record's id.
    fn insert_attribute(&self, table: &str, main_id: u64, attribute: &Attribute) -> SqlStatement;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InterpolatingBuilder;

impl StatementBuilder for InterpolatingBuilder {
    fn insert_record(&self, table: &str, record: &MetadataRecord) -> Result<SqlStatement, SqlError> {
        let attributes =
            serde_json::to_string(&record.attributes).map_err(|e| SqlError::AttributesEncoding {
                id: record.id,
                reason: e.to_string(),
            })?;
        Ok(SqlStatement(format!(
            "INSERT INTO {table} (id, name, description, image, attributes) VALUES ({}, '{}', '{}', '{}', '{}');",
            record.id, record.name, record.description, record.image, attributes
        )))
    }

    fn insert_main(&self, table: &str, record: &MetadataRecord) -> SqlStatement {
        SqlStatement(format!(
            "INSERT INTO {table} (id, name, description, image) VALUES ({}, '{}', '{}', '{}');",
            record.id, record.name, record.description, record.image
        ))
    }

    fn insert_attribute(&self, table: &str, main_id: u64, attribute: &Attribute) -> SqlStatement {
        SqlStatement(format!(
            "INSERT INTO {table} (main_id, trait_type, value) VALUES ({main_id}, '{}', '{}');",
            attribute.trait_type, attribute.value
        ))
    }
}

fn require_name(table: &str) -> Result<(), SqlError> {
    if table.trim().is_empty() {
        return Err(SqlError::EmptyTableName);
    }
    Ok(())
}

/// One statement per record, in record order.
pub fn build_single_table<B: StatementBuilder + ?Sized>(
    builder: &B,
    table: &str,
    records: &[MetadataRecord],
) -> Result<Vec<SqlStatement>, SqlError> {
    require_name(table)?;
    records
        .iter()
        .map(|record| builder.insert_record(table, record))
        .collect()
}

/// One main statement per record plus one attribute statement per trait,
/// in record order and, within a record, in attribute order.
pub fn build_two_tables<B: StatementBuilder + ?Sized>(
    builder: &B,
    main_table: &str,
    attributes_table: &str,
    records: &[MetadataRecord],
) -> Result<Vec<TwoTableStatements>, SqlError> {
    require_name(main_table)?;
    require_name(attributes_table)?;
    Ok(records
        .iter()
        .map(|record| TwoTableStatements {
            main: builder.insert_main(main_table, record),
            attributes: record
                .attributes
                .iter()
                .map(|attr| builder.insert_attribute(attributes_table, record.id, attr))
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, attributes: Vec<(&str, &str)>) -> MetadataRecord {
        MetadataRecord {
            id,
            name: "A".into(),
            description: "d".into(),
            image: "ipfs://X".into(),
            attributes: attributes
                .into_iter()
                .map(|(t, v)| Attribute {
                    trait_type: t.into(),
                    value: v.into(),
                })
                .collect(),
        }
    }

    #[test]
    fn single_table_renders_exact_statement() {
        let stmts =
            build_single_table(&InterpolatingBuilder, "tbl", &[record(0, vec![("t", "v")])])
                .unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(
            stmts[0].as_str(),
            r#"INSERT INTO tbl (id, name, description, image, attributes) VALUES (0, 'A', 'd', 'ipfs://X', '[{"trait_type":"t","value":"v"}]');"#
        );
    }

    #[test]
    fn two_tables_renders_main_and_attribute_rows() {
        let stmts = build_two_tables(
            &InterpolatingBuilder,
            "main",
            "attrs",
            &[record(0, vec![("t", "v")])],
        )
        .unwrap();
        assert_eq!(
            stmts,
            vec![TwoTableStatements {
                main: SqlStatement(
                    "INSERT INTO main (id, name, description, image) VALUES (0, 'A', 'd', 'ipfs://X');"
                        .into()
                ),
                attributes: vec![SqlStatement(
                    "INSERT INTO attrs (main_id, trait_type, value) VALUES (0, 't', 'v');".into()
                )],
            }]
        );
    }

    #[test]
    fn statements_follow_record_and_attribute_order() {
        let records = vec![
            record(7, vec![("a", "1"), ("b", "2")]),
            record(3, vec![("c", "3")]),
        ];
        let stmts = build_two_tables(&InterpolatingBuilder, "m", "x", &records).unwrap();
        assert!(stmts[0].main.as_str().contains("VALUES (7,"));
        assert!(stmts[1].main.as_str().contains("VALUES (3,"));
        assert!(stmts[0].attributes[0].as_str().contains("'a', '1'"));
        assert!(stmts[0].attributes[1].as_str().contains("'b', '2'"));
        assert!(stmts[1].attributes[0].as_str().contains("VALUES (3, 'c', '3')"));
    }

    #[test]
    fn record_without_attributes_yields_no_attribute_rows() {
        let stmts =
            build_two_tables(&InterpolatingBuilder, "m", "x", &[record(1, vec![])]).unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].attributes.is_empty());

        let single = build_single_table(&InterpolatingBuilder, "t", &[record(1, vec![])]).unwrap();
        assert!(single[0].as_str().ends_with("'ipfs://X', '[]');"));
    }

    #[test]
    fn values_are_interpolated_verbatim() {
        let mut r = record(2, vec![]);
        r.name = "O'Brien".into();
        let stmts = build_single_table(&InterpolatingBuilder, "t", &[r]).unwrap();
        assert!(stmts[0].as_str().contains("'O'Brien'"));
    }

    #[test]
    fn empty_table_name_is_rejected() {
        assert_eq!(
            build_single_table(&InterpolatingBuilder, "", &[]),
            Err(SqlError::EmptyTableName)
        );
        assert_eq!(
            build_two_tables(&InterpolatingBuilder, "main", " ", &[]),
            Err(SqlError::EmptyTableName)
        );
    }

    #[test]
    fn empty_record_list_yields_no_statements() {
        let stmts = build_single_table(&InterpolatingBuilder, "t", &[]).unwrap();
        assert!(stmts.is_empty());
    }
}
