use anyhow::Result;
use ethereum_types::H160;

/// Constructor arguments of the three NFT contract flavours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractArgs {
    /// Metadata served from a content-addressed directory.
    TableNft { base_uri: String },
    OneTableNft {
        base_uri: String,
        table: String,
    },
    TwoTablesNft {
        base_uri: String,
        main_table: String,
        attributes_table: String,
    },
}

impl ContractArgs {
    pub fn kind(&self) -> &'static str {
        match self {
            ContractArgs::TableNft { .. } => "TableNFT",
            ContractArgs::OneTableNft { .. } => "OneTableNFT",
            ContractArgs::TwoTablesNft { .. } => "TwoTablesNFT",
        }
    }

    pub fn base_uri(&self) -> &str {
        match self {
            ContractArgs::TableNft { base_uri }
            | ContractArgs::OneTableNft { base_uri, .. }
            | ContractArgs::TwoTablesNft { base_uri, .. } => base_uri,
        }
    }

    /// The query a table-backed token URI resolves to.
    pub fn metadata_query(&self, token_id: u64) -> Option<String> {
        match self {
            ContractArgs::TableNft { .. } => None,
            ContractArgs::OneTableNft { table, .. } => Some(format!(
                "SELECT json_object('id',id,'name',name,'description',description,'image',image,'attributes',json(attributes)) FROM {table} WHERE id={token_id}"
            )),
            ContractArgs::TwoTablesNft {
                main_table,
                attributes_table,
                ..
            } => Some(format!(
                "SELECT json_object('id',id,'name',name,'description',description,'image',image,'attributes',json_group_array(json_object('trait_type',trait_type,'value',value))) FROM {main_table} JOIN {attributes_table} ON {main_table}.id = {attributes_table}.main_id WHERE id={token_id} group by id"
            )),
        }
    }

    /// `base_uri` followed by the percent-encoded metadata query, or by the
    /// token id for directory-backed contracts.
    pub fn token_uri(&self, token_id: u64) -> String {
        match self.metadata_query(token_id) {
            Some(query) => format!("{}{}", self.base_uri(), percent_encode(&query)),
            None => format!("{}{}", self.base_uri(), token_id),
        }
    }
}

/// Every byte but ASCII letters, digits and `_` becomes `%XX`, so table
/// names stay readable and spaces are `%20`.
fn percent_encode(query: &str) -> String {
    let mut out = String::with_capacity(query.len() * 3);
    for byte in query.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

pub trait DeployedContract {
    fn address(&self) -> H160;
    fn base_uri(&self) -> Result<String>;
    /// Mints the next token to the deployer and returns its id.
    fn mint(&self) -> Result<u64>;
    fn token_uri(&self, token_id: u64) -> Result<String>;
}

pub trait ContractDeployer {
    fn deploy(&self, args: ContractArgs) -> Result<Box<dyn DeployedContract>>;
}
