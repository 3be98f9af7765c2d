/// A table created on the table service. `name` encodes `{prefix}_{chain_id}_{table_id}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableHandle {
    pub name: String,
    pub creation_tx_hash: String,
}

/// Proof that a transaction was included and processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub table_id: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteResult {
    pub tx_hash: String,
    pub rows_affected: usize,
}
