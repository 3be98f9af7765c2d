use thiserror::Error;

use crate::sql::SqlStatement;
use crate::types::{TableHandle, WriteResult};
use crate::waiter::ReceiptSource;

pub type Row = serde_json::Map<String, serde_json::Value>;

/// A service that creates and mutates tables through ordered transactions.
pub trait TableService: ReceiptSource {
    /// Creates a table from a column `schema`; the service picks the final name.
    fn create(&self, schema: &str, prefix: &str) -> anyhow::Result<TableHandle>;
    fn write(&self, statement: &SqlStatement) -> anyhow::Result<WriteResult>;
}

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("only read statements are allowed")]
    NotReadOnly,
    #[error("query failed: {0}")]
    Failed(String),
}

/// Read side used by the gateway.
pub trait TableReader {
    fn query(&self, sql: &str) -> Result<Vec<Row>, QueryError>;
}
