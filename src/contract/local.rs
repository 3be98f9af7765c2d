use anyhow::{Context, Result};
use ethereum_types::H160;
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::{path::Path, str::FromStr};

use super::traits::{ContractArgs, ContractDeployer, DeployedContract};
use crate::db;

const DB_SCHEMA: db::Schema = db::Schema {
    label: "contract registry",
    version: 1,
    create: r#"
    CREATE TABLE contracts (
        address TEXT PRIMARY KEY,
        deployer TEXT NOT NULL,
        nonce INTEGER NOT NULL,
        kind TEXT NOT NULL,
        base_uri TEXT NOT NULL,
        main_table TEXT,
        attributes_table TEXT,
        max_supply INTEGER NOT NULL,
        minted INTEGER NOT NULL
    );
    "#,
};

/// Account identity derived from the signing credential.
pub fn signer_address(private_key: &str) -> H160 {
    let digest = Sha256::digest(private_key.trim().as_bytes());
    H160::from_slice(&digest[12..])
}

fn contract_address(deployer: H160, nonce: u64) -> H160 {
    let mut hasher = Sha256::new();
    hasher.update(deployer.as_bytes());
    hasher.update(nonce.to_be_bytes());
    H160::from_slice(&hasher.finalize()[12..])
}

fn format_address(address: H160) -> String {
    format!("0x{:x}", address)
}

struct StoredContract {
    args: ContractArgs,
    max_supply: u64,
    minted: u64,
}

fn map_contract_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredContract> {
    let kind: String = row.get(0)?;
    let base_uri: String = row.get(1)?;
    let main_table: Option<String> = row.get(2)?;
    let attributes_table: Option<String> = row.get(3)?;
    let max_supply: i64 = row.get(4)?;
    let minted: i64 = row.get(5)?;

    let args = match (kind.as_str(), main_table, attributes_table) {
        ("TableNFT", None, None) => ContractArgs::TableNft { base_uri },
        ("OneTableNFT", Some(table), None) => ContractArgs::OneTableNft { base_uri, table },
        ("TwoTablesNFT", Some(main_table), Some(attributes_table)) => ContractArgs::TwoTablesNft {
            base_uri,
            main_table,
            attributes_table,
        },
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("inconsistent contract row of kind {kind}"),
                )),
            ))
        }
    };
    Ok(StoredContract {
        args,
        max_supply: max_supply as u64,
        minted: minted as u64,
    })
}

fn db_load_contract(conn: &Connection, address: H160) -> rusqlite::Result<Option<StoredContract>> {
    conn.query_row(
        "SELECT kind, base_uri, main_table, attributes_table, max_supply, minted FROM contracts WHERE address = ?1",
        params![format_address(address)],
        map_contract_row,
    )
    .optional()
}

fn db_next_nonce(conn: &Connection, deployer: H160) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contracts WHERE deployer = ?1",
        params![format_address(deployer)],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn db_insert_contract(
    conn: &Connection,
    address: H160,
    deployer: H160,
    nonce: u64,
    args: &ContractArgs,
    max_supply: u64,
) -> rusqlite::Result<()> {
    let (main_table, attributes_table) = match args {
        ContractArgs::TableNft { .. } => (None, None),
        ContractArgs::OneTableNft { table, .. } => (Some(table.as_str()), None),
        ContractArgs::TwoTablesNft {
            main_table,
            attributes_table,
            ..
        } => (Some(main_table.as_str()), Some(attributes_table.as_str())),
    };
    conn.execute(
        r#"
        INSERT INTO contracts (
            address, deployer, nonce, kind, base_uri, main_table, attributes_table, max_supply, minted
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
        "#,
        params![
            format_address(address),
            format_address(deployer),
            nonce as i64,
            args.kind(),
            args.base_uri(),
            main_table,
            attributes_table,
            max_supply as i64
        ],
    )?;
    Ok(())
}

/// File-backed registry shared by the deployer and the contracts it returns.
#[derive(Clone)]
struct Registry {
    path: String,
}

impl Registry {
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = db::open(&self.path, &DB_SCHEMA)
            .with_context(|| format!("opening contract registry {}", self.path))?;
        f(&conn)
    }

    fn load(&self, address: H160) -> Result<StoredContract> {
        self.with_conn(|conn| {
            db_load_contract(conn, address)?
                .with_context(|| format!("no contract deployed at {}", format_address(address)))
        })
    }
}

/// Deploys contracts into a local registry, signed by `deployer`.
pub struct LocalDeployer {
    registry: Registry,
    deployer: H160,
    max_supply: u64,
}

impl LocalDeployer {
    pub fn new<P: AsRef<Path>>(path: P, deployer: H160, max_supply: u64) -> Self {
        Self {
            registry: Registry {
                path: path.as_ref().to_string_lossy().to_string(),
            },
            deployer,
            max_supply,
        }
    }

    pub fn init(&self) -> Result<()> {
        self.registry.with_conn(|_conn| Ok(()))
    }

    pub fn reset_all(&self) -> Result<()> {
        if !Path::new(&self.registry.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.registry.path)?;
        Ok(())
    }

    pub fn deployer(&self) -> H160 {
        self.deployer
    }

    /// A handle on an already deployed contract, parsed from its `0x` address.
    pub fn contract_at(&self, address: &str) -> Result<LocalContract> {
        let address =
            H160::from_str(address).with_context(|| format!("invalid contract address {address}"))?;
        self.registry.load(address)?;
        Ok(LocalContract {
            registry: self.registry.clone(),
            address,
        })
    }
}

impl ContractDeployer for LocalDeployer {
    fn deploy(&self, args: ContractArgs) -> Result<Box<dyn DeployedContract>> {
        let address = self.registry.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let nonce = db_next_nonce(&tx, self.deployer)?;
            let address = contract_address(self.deployer, nonce);
            db_insert_contract(&tx, address, self.deployer, nonce, &args, self.max_supply)?;
            tx.commit()?;
            Ok(address)
        })?;
        log::debug!(
            "{} deployed by {} at {}",
            args.kind(),
            format_address(self.deployer),
            format_address(address)
        );
        Ok(Box::new(LocalContract {
            registry: self.registry.clone(),
            address,
        }))
    }
}

pub struct LocalContract {
    registry: Registry,
    address: H160,
}

impl DeployedContract for LocalContract {
    fn address(&self) -> H160 {
        self.address
    }

    fn base_uri(&self) -> Result<String> {
        Ok(self.registry.load(self.address)?.args.base_uri().to_string())
    }

    fn mint(&self) -> Result<u64> {
        let address = self.address;
        self.registry.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let contract = db_load_contract(&tx, address)?
                .with_context(|| format!("no contract deployed at {}", format_address(address)))?;
            if contract.minted >= contract.max_supply {
                anyhow::bail!("Maximum number of tokens have been minted");
            }
            tx.execute(
                "UPDATE contracts SET minted = minted + 1 WHERE address = ?1",
                params![format_address(address)],
            )?;
            tx.commit()?;
            Ok(contract.minted)
        })
    }

    fn token_uri(&self, token_id: u64) -> Result<String> {
        let contract = self.registry.load(self.address)?;
        if token_id >= contract.minted {
            anyhow::bail!("URI query for nonexistent token {token_id}");
        }
        Ok(contract.args.token_uri(token_id))
    }
}
