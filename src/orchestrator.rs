//! Runs one deployment from start to end:
//! create tables, confirm them, write every row, then deploy the contract.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ethereum_types::H160;
use thiserror::Error;

use crate::contract::{ContractArgs, ContractDeployer};
use crate::metadata::{gateway_url, Assembler, ImageUri};
use crate::sql::{build_single_table, build_two_tables, InterpolatingBuilder, SqlStatement};
use crate::storage::ContentStore;
use crate::tableland::TableService;
use crate::types::{MetadataRecord, TableHandle};
use crate::waiter::{Sleeper, ThreadSleeper, Waiter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DeployMode {
    /// Metadata directory on the content store, no tables.
    Ipfs,
    /// One denormalized table.
    OneTable,
    /// Main table plus an attributes table keyed by `main_id`.
    TwoTables,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployState {
    Idle,
    TablesCreating,
    TablesConfirming,
    WritingRows,
    Deploying,
    Done,
    Failed,
}

#[derive(Clone, Copy, Debug)]
pub struct TableSpec {
    pub prefix: &'static str,
    pub schema: &'static str,
}

pub const BASIC_TABLE: TableSpec = TableSpec {
    prefix: "table_nft_basic",
    schema: "id int, name text, description text, image text, attributes text, primary key (id)",
};

pub const MAIN_TABLE: TableSpec = TableSpec {
    prefix: "table_nft_main",
    schema: "id int, name text, description text, image text, primary key (id)",
};

pub const ATTRIBUTES_TABLE: TableSpec = TableSpec {
    prefix: "table_nft_attributes",
    schema: "main_id int, trait_type text, value text",
};

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("could not confirm table `{name}`: no receipt for transaction {tx_hash}")]
    UnconfirmedTable { name: String, tx_hash: String },
}

/// Where the metadata lives and how it is referenced.
#[derive(Clone, Debug)]
pub struct Layout {
    pub metadata_dir: PathBuf,
    pub images_dir: PathBuf,
    pub image_uri: ImageUri,
    /// Base URI handed to table-backed contracts.
    pub tableland_base_uri: String,
}

#[derive(Clone, Debug)]
pub struct Deployment {
    pub kind: &'static str,
    pub address: H160,
    pub base_uri: String,
    pub tables: Vec<TableHandle>,
    pub statements_written: usize,
}

pub struct Orchestrator<'a, W: Sleeper = ThreadSleeper> {
    tables: &'a dyn TableService,
    store: &'a dyn ContentStore,
    deployer: &'a dyn ContractDeployer,
    waiter: Waiter<W>,
    layout: Layout,
    history: Vec<DeployState>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        tables: &'a dyn TableService,
        store: &'a dyn ContentStore,
        deployer: &'a dyn ContractDeployer,
        layout: Layout,
    ) -> Self {
        Self {
            tables,
            store,
            deployer,
            waiter: Waiter::new(),
            layout,
            history: vec![DeployState::Idle],
        }
    }
}

impl<'a, W: Sleeper> Orchestrator<'a, W> {
    #[cfg(test)]
    pub fn with_waiter<V: Sleeper>(self, waiter: Waiter<V>) -> Orchestrator<'a, V> {
        Orchestrator {
            tables: self.tables,
            store: self.store,
            deployer: self.deployer,
            waiter,
            layout: self.layout,
            history: self.history,
        }
    }

    pub fn state(&self) -> DeployState {
        self.history.last().copied().unwrap_or(DeployState::Idle)
    }

    pub fn history(&self) -> &[DeployState] {
        &self.history
    }

    fn transition(&mut self, next: DeployState) {
        log::debug!("deploy state {:?} -> {:?}", self.state(), next);
        self.history.push(next);
    }

    pub fn run(&mut self, mode: DeployMode) -> Result<Deployment> {
        let span = ::tracing::info_span!("deploy", ?mode);
        let _entered = span.enter();

        let result = match mode {
            DeployMode::Ipfs => self.run_ipfs(),
            DeployMode::OneTable => self.run_one_table(),
            DeployMode::TwoTables => self.run_two_tables(),
        };
        match result {
            Ok(deployment) => {
                self.transition(DeployState::Done);
                Ok(deployment)
            }
            Err(e) => {
                self.transition(DeployState::Failed);
                Err(e)
            }
        }
    }

    fn run_ipfs(&mut self) -> Result<Deployment> {
        let assembler = Assembler::new(self.store, self.layout.image_uri);
        let records = assembler.assemble(&self.layout.metadata_dir, &self.layout.images_dir)?;
        log::info!("📝 Prepared {} metadata files", records.len());

        let directory = assembler.upload_directory(&self.layout.metadata_dir)?;
        let base_uri = gateway_url(&directory);
        log::info!("📦 Uploaded metadata to: {}", base_uri);

        self.deploy(ContractArgs::TableNft { base_uri }, Vec::new(), 0)
    }

    fn run_one_table(&mut self) -> Result<Deployment> {
        let handles = self.create_tables(&[BASIC_TABLE])?;
        self.confirm_tables(&handles)?;

        self.transition(DeployState::WritingRows);
        let table = handles[0].name.clone();
        let records = self.assemble()?;
        let statements = build_single_table(&InterpolatingBuilder, &table, &records)?;
        let written = self.write_all(&statements)?;

        let args = ContractArgs::OneTableNft {
            base_uri: self.layout.tableland_base_uri.clone(),
            table,
        };
        self.deploy(args, handles, written)
    }

    fn run_two_tables(&mut self) -> Result<Deployment> {
        let handles = self.create_tables(&[MAIN_TABLE, ATTRIBUTES_TABLE])?;
        self.confirm_tables(&handles)?;

        self.transition(DeployState::WritingRows);
        let main_table = handles[0].name.clone();
        let attributes_table = handles[1].name.clone();
        let records = self.assemble()?;
        let statements: Vec<SqlStatement> =
            build_two_tables(&InterpolatingBuilder, &main_table, &attributes_table, &records)?
                .into_iter()
                .flat_map(|s| std::iter::once(s.main).chain(s.attributes))
                .collect();
        let written = self.write_all(&statements)?;

        let args = ContractArgs::TwoTablesNft {
            base_uri: self.layout.tableland_base_uri.clone(),
            main_table,
            attributes_table,
        };
        self.deploy(args, handles, written)
    }

    fn create_tables(&mut self, specs: &[TableSpec]) -> Result<Vec<TableHandle>> {
        self.transition(DeployState::TablesCreating);
        let mut handles = Vec::with_capacity(specs.len());
        for spec in specs {
            let handle = self
                .tables
                .create(spec.schema, spec.prefix)
                .with_context(|| format!("creating table with prefix `{}`", spec.prefix))?;
            log::info!(
                "🧱 Table '{}' created at tx '{}'",
                handle.name,
                handle.creation_tx_hash
            );
            handles.push(handle);
        }
        Ok(handles)
    }

    fn confirm_tables(&mut self, handles: &[TableHandle]) -> Result<()> {
        self.transition(DeployState::TablesConfirming);
        for handle in handles {
            if !self.waiter.confirm(self.tables, &handle.creation_tx_hash) {
                return Err(DeployError::UnconfirmedTable {
                    name: handle.name.clone(),
                    tx_hash: handle.creation_tx_hash.clone(),
                }
                .into());
            }
            log::info!("✅ Table '{}' confirmed", handle.name);
        }
        Ok(())
    }

    fn assemble(&self) -> Result<Vec<MetadataRecord>> {
        let records = Assembler::new(self.store, self.layout.image_uri)
            .assemble(&self.layout.metadata_dir, &self.layout.images_dir)?;
        log::info!("📝 Prepared {} metadata records", records.len());
        Ok(records)
    }

    fn write_all(&mut self, statements: &[SqlStatement]) -> Result<usize> {
        log::info!("✍️ Writing {} SQL statements", statements.len());
        for statement in statements {
            let result = self
                .tables
                .write(statement)
                .with_context(|| format!("writing `{statement}`"))?;
            log::info!(
                "{} [{} row(s), tx {}]",
                statement,
                result.rows_affected,
                result.tx_hash
            );
        }
        Ok(statements.len())
    }

    fn deploy(
        &mut self,
        args: ContractArgs,
        tables: Vec<TableHandle>,
        statements_written: usize,
    ) -> Result<Deployment> {
        self.transition(DeployState::Deploying);
        let kind = args.kind();
        let contract = self
            .deployer
            .deploy(args)
            .with_context(|| format!("deploying {kind}"))?;
        log::info!("🚀 {} contract deployed at: {:#x}", kind, contract.address());

        let base_uri = contract.base_uri().context("reading baseURI")?;
        log::info!("🔗 {} is using baseURI: {}", kind, base_uri);

        Ok(Deployment {
            kind,
            address: contract.address(),
            base_uri,
            tables,
            statements_written,
        })
    }
}
