use anyhow::{Context, Result};
use rusqlite::{params, types::ValueRef, Connection, OptionalExtension};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;

use super::traits::{QueryError, Row, TableReader, TableService};
use crate::db;
use crate::sql::SqlStatement;
use crate::types::{Receipt, TableHandle, WriteResult};
use crate::waiter::ReceiptSource;

const DB_SCHEMA: db::Schema = db::Schema {
    label: "table database",
    version: 1,
    create: r#"
    CREATE TABLE _registry (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        prefix TEXT NOT NULL,
        schema TEXT NOT NULL,
        tx_hash TEXT NOT NULL
    );
    CREATE TABLE _receipts (
        tx_hash TEXT PRIMARY KEY,
        chain_id INTEGER NOT NULL,
        block_number INTEGER NOT NULL,
        table_id INTEGER
    );
    "#,
};

/// Table service backed by a local SQLite database.
///
/// User tables live next to two bookkeeping tables, `_registry` and
/// `_receipts`. Every create and write is a transaction with a hash and a
/// monotonically increasing block number; its receipt is recorded in the
/// same database transaction as the change itself.
#[derive(Clone)]
pub struct SqliteTableService {
    pub path: String,
    chain_id: u64,
}

fn tx_hash(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    format!("0x{}", hex::encode(hasher.finalize()))
}

fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn db_next_block(conn: &Connection) -> rusqlite::Result<u64> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(block_number), 0) + 1 FROM _receipts",
        [],
        |row| row.get(0),
    )?;
    Ok(next as u64)
}

fn db_save_receipt(conn: &Connection, receipt: &Receipt) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO _receipts (tx_hash, chain_id, block_number, table_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            receipt.tx_hash,
            receipt.chain_id as i64,
            receipt.block_number as i64,
            receipt.table_id.map(|id| id as i64)
        ],
    )?;
    Ok(())
}

fn db_load_receipt(conn: &Connection, tx_hash: &str) -> rusqlite::Result<Option<Receipt>> {
    conn.query_row(
        "SELECT tx_hash, chain_id, block_number, table_id FROM _receipts WHERE tx_hash = ?1",
        params![tx_hash],
        |row| {
            let chain_id: i64 = row.get(1)?;
            let block_number: i64 = row.get(2)?;
            let table_id: Option<i64> = row.get(3)?;
            Ok(Receipt {
                tx_hash: row.get(0)?,
                chain_id: chain_id as u64,
                block_number: block_number as u64,
                table_id: table_id.map(|id| id as u64),
            })
        },
    )
    .optional()
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::from(v),
        ValueRef::Real(v) => Value::from(v),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(hex::encode(b)),
    }
}

fn db_query(conn: &Connection, sql: &str) -> Result<Vec<Row>, QueryError> {
    let failed = |e: rusqlite::Error| QueryError::Failed(e.to_string());

    let mut stmt = conn.prepare(sql).map_err(failed)?;
    if !stmt.readonly() {
        return Err(QueryError::NotReadOnly);
    }
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([]).map_err(failed)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(failed)? {
        let mut obj = Row::new();
        for (i, column) in columns.iter().enumerate() {
            obj.insert(column.clone(), to_json(row.get_ref(i).map_err(failed)?));
        }
        out.push(obj);
    }
    Ok(out)
}

impl SqliteTableService {
    pub fn new<P: AsRef<Path>>(path: P, chain_id: u64) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            chain_id,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn reset_all(&self) -> Result<()> {
        if !Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        db::open(&self.path, &DB_SCHEMA)
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .open()
            .with_context(|| format!("opening table database {}", self.path))?;
        f(&conn)
    }
}

impl ReceiptSource for SqliteTableService {
    fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>> {
        self.with_conn(|conn| Ok(db_load_receipt(conn, tx_hash)?))
    }
}

impl TableService for SqliteTableService {
    fn create(&self, schema: &str, prefix: &str) -> Result<TableHandle> {
        if !is_valid_prefix(prefix) {
            anyhow::bail!("invalid table prefix `{prefix}`");
        }
        let chain_id = self.chain_id;

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO _registry (name, prefix, schema, tx_hash) VALUES ('', ?1, ?2, '')",
                params![prefix, schema],
            )?;
            let table_id = tx.last_insert_rowid() as u64;
            let name = format!("{prefix}_{chain_id}_{table_id}");

            tx.execute(&format!("CREATE TABLE {name} ({schema})"), [])
                .with_context(|| format!("creating table {name}"))?;

            let receipt = Receipt {
                tx_hash: tx_hash(&[
                    b"create",
                    &chain_id.to_be_bytes(),
                    &table_id.to_be_bytes(),
                    schema.as_bytes(),
                ]),
                chain_id,
                block_number: db_next_block(&tx)?,
                table_id: Some(table_id),
            };
            tx.execute(
                "UPDATE _registry SET name = ?1, tx_hash = ?2 WHERE id = ?3",
                params![name, receipt.tx_hash, table_id as i64],
            )?;
            db_save_receipt(&tx, &receipt)?;
            tx.commit()?;

            Ok(TableHandle {
                name,
                creation_tx_hash: receipt.tx_hash,
            })
        })
    }

    fn write(&self, statement: &SqlStatement) -> Result<WriteResult> {
        let chain_id = self.chain_id;

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let block_number = db_next_block(&tx)?;

            let rows_affected = {
                let mut stmt = tx
                    .prepare(statement.as_str())
                    .with_context(|| format!("preparing `{statement}`"))?;
                if stmt.readonly() {
                    anyhow::bail!("write statement does not modify any table: `{statement}`");
                }
                stmt.execute([])
                    .with_context(|| format!("executing `{statement}`"))?
            };

            let receipt = Receipt {
                tx_hash: tx_hash(&[
                    b"write",
                    &chain_id.to_be_bytes(),
                    &block_number.to_be_bytes(),
                    statement.as_str().as_bytes(),
                ]),
                chain_id,
                block_number,
                table_id: None,
            };
            db_save_receipt(&tx, &receipt)?;
            tx.commit()?;

            Ok(WriteResult {
                tx_hash: receipt.tx_hash,
                rows_affected,
            })
        })
    }
}

impl TableReader for SqliteTableService {
    fn query(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        let conn = self
            .open()
            .map_err(|e| QueryError::Failed(e.to_string()))?;
        db_query(&conn, sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{build_single_table, InterpolatingBuilder};
    use crate::types::{Attribute, MetadataRecord};
    use tempfile::TempDir;

    const SCHEMA: &str = "id int, name text, description text, image text, attributes text, primary key (id)";

    fn service() -> (TempDir, SqliteTableService) {
        let dir = TempDir::new().unwrap();
        let svc = SqliteTableService::new(dir.path().join("tables.sqlite"), 80001);
        svc.init().unwrap();
        (dir, svc)
    }

    fn insert(svc: &SqliteTableService, table: &str, id: u64) -> WriteResult {
        let record = MetadataRecord {
            id,
            name: format!("Token {id}"),
            description: "d".into(),
            image: "ipfs://X".into(),
            attributes: vec![Attribute {
                trait_type: "t".into(),
                value: "v".into(),
            }],
        };
        let stmts = build_single_table(&InterpolatingBuilder, table, &[record]).unwrap();
        svc.write(&stmts[0]).unwrap()
    }

    #[test]
    fn create_names_tables_by_prefix_chain_and_id() {
        let (_dir, svc) = service();
        let first = svc.create(SCHEMA, "table_nft_main").unwrap();
        let second = svc.create("main_id int, trait_type text, value text", "table_nft_attributes").unwrap();
        assert_eq!(first.name, "table_nft_main_80001_1");
        assert_eq!(second.name, "table_nft_attributes_80001_2");
        assert_ne!(first.creation_tx_hash, second.creation_tx_hash);
        assert!(first.creation_tx_hash.starts_with("0x"));
    }

    #[test]
    fn create_records_a_receipt() {
        let (_dir, svc) = service();
        let handle = svc.create(SCHEMA, "table_nft_basic").unwrap();
        let receipt = svc.receipt(&handle.creation_tx_hash).unwrap().unwrap();
        assert_eq!(receipt.chain_id, 80001);
        assert_eq!(receipt.table_id, Some(1));
        assert_eq!(receipt.block_number, 1);
    }

    #[test]
    fn receipt_is_absent_for_unknown_tx() {
        let (_dir, svc) = service();
        assert!(svc.receipt("0xdeadbeef").unwrap().is_none());
    }

    #[test]
    fn create_rejects_invalid_prefix() {
        let (_dir, svc) = service();
        let err = svc.create(SCHEMA, "1bad; DROP").unwrap_err();
        assert!(err.to_string().contains("invalid table prefix"));
    }

    #[test]
    fn failed_create_leaves_no_registry_entry() {
        let (_dir, svc) = service();
        assert!(svc.create("id int,,", "broken").is_err());
        let handle = svc.create(SCHEMA, "table_nft_basic").unwrap();
        let rows = svc.query("SELECT COUNT(*) AS n FROM _registry").unwrap();
        assert_eq!(rows[0]["n"], Value::from(1));
        assert_eq!(handle.name, "table_nft_basic_80001_1");
    }

    #[test]
    fn write_inserts_rows_and_advances_blocks() {
        let (_dir, svc) = service();
        let handle = svc.create(SCHEMA, "table_nft_basic").unwrap();
        let first = insert(&svc, &handle.name, 0);
        let second = insert(&svc, &handle.name, 1);
        assert_eq!(first.rows_affected, 1);
        assert_ne!(first.tx_hash, second.tx_hash);

        let r1 = svc.receipt(&first.tx_hash).unwrap().unwrap();
        let r2 = svc.receipt(&second.tx_hash).unwrap().unwrap();
        assert!(r2.block_number > r1.block_number);

        let rows = svc
            .query(&format!("SELECT id, name FROM {} ORDER BY id", handle.name))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["name"], Value::from("Token 1"));
    }

    #[test]
    fn write_fails_on_duplicate_primary_key() {
        let (_dir, svc) = service();
        let handle = svc.create(SCHEMA, "table_nft_basic").unwrap();
        insert(&svc, &handle.name, 0);
        let stmts = build_single_table(
            &InterpolatingBuilder,
            &handle.name,
            &[MetadataRecord {
                id: 0,
                name: "dup".into(),
                description: "d".into(),
                image: "i".into(),
                attributes: vec![],
            }],
        )
        .unwrap();
        assert!(svc.write(&stmts[0]).is_err());
    }

    #[test]
    fn write_rejects_read_statements() {
        let (_dir, svc) = service();
        let handle = svc.create(SCHEMA, "table_nft_basic").unwrap();
        let select = crate::sql::SqlStatement::from(format!("SELECT * FROM {}", handle.name));
        let err = svc.write(&select).unwrap_err();
        assert!(err.to_string().contains("does not modify"));
    }

    #[test]
    fn query_rejects_mutations() {
        let (_dir, svc) = service();
        let handle = svc.create(SCHEMA, "table_nft_basic").unwrap();
        let res = svc.query(&format!("DELETE FROM {}", handle.name));
        assert_eq!(res, Err(QueryError::NotReadOnly));
    }

    #[test]
    fn query_resolves_json_metadata() {
        let (_dir, svc) = service();
        let handle = svc.create(SCHEMA, "table_nft_basic").unwrap();
        insert(&svc, &handle.name, 0);
        let rows = svc
            .query(&format!(
                "SELECT json_object('id', id, 'attributes', json(attributes)) AS m FROM {} WHERE id = 0",
                handle.name
            ))
            .unwrap();
        let parsed: Value = serde_json::from_str(rows[0]["m"].as_str().unwrap()).unwrap();
        assert_eq!(parsed["attributes"][0]["trait_type"], Value::from("t"));
    }

    #[test]
    fn init_fails_on_mismatched_schema_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tables.sqlite");
        Connection::open(&path)
            .unwrap()
            .execute_batch("PRAGMA user_version = 999;")
            .unwrap();
        let err = SqliteTableService::new(&path, 1).init().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("schema version mismatch"));
        assert!(msg.contains("--reset"));
    }

    #[test]
    fn reset_all_removes_database() {
        let (_dir, svc) = service();
        assert!(Path::new(&svc.path).exists());
        svc.reset_all().unwrap();
        assert!(!Path::new(&svc.path).exists());
    }
}
