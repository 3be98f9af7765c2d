use crate::{
    cli::{self, Command},
    context,
    contract::{signer_address, LocalDeployer},
    storage::LocalContentStore,
    tableland::SqliteTableService,
};
use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;

/// The local services every command runs against.
pub struct Services {
    pub tables: SqliteTableService,
    pub store: LocalContentStore,
    pub deployer: LocalDeployer,
}

/// The main application state.
/// decoupled from CLI parsing to allow for easier testing.
pub struct App {
    ctx: context::Context,
    services: Services,
    cmd: Command,
}

impl App {
    /// Handles the side-effects of startup: log file, data dir and databases.
    pub fn from_cli() -> Result<Self> {
        let cli = cli::parse();

        crate::tracing::set_log_file(cli.log_file.as_deref().map(Path::new))
            .context("opening log file")?;

        let ctx = context::Context::from_cli(&cli)?;
        log_startup_info(&ctx);

        let services = init_services(&ctx)?;

        Ok(Self {
            ctx,
            services,
            cmd: cli.cmd,
        })
    }

    pub async fn run(&self) -> Result<()> {
        self.cmd.run(&self.ctx, &self.services).await
    }
}

fn log_startup_info(ctx: &context::Context) {
    log::info!("🚀 Starting table-nft");
    log::info!("🌐 Network: {} (chain {})", ctx.network, ctx.network.chain_id());
    log::info!("📂 Data dir: {}", ctx.data_dir.to_string_lossy());
    if let Some(path) = ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.to_string_lossy());
    }
}

fn init_services(ctx: &context::Context) -> Result<Services> {
    std::fs::create_dir_all(&ctx.data_dir)
        .with_context(|| format!("creating {}", ctx.data_dir.display()))?;

    let tables = SqliteTableService::new(ctx.tables_db_path(), ctx.network.chain_id());
    let store = LocalContentStore::new(ctx.blobs_dir());
    let deployer = LocalDeployer::new(
        ctx.contracts_db_path(),
        signer_address(&ctx.private_key),
        ctx.max_supply,
    );

    if ctx.reset {
        tables.reset_all().context("resetting tables")?;
        store.reset_all().context("resetting content store")?;
        deployer.reset_all().context("resetting contracts")?;
        log::info!("🧹 Local state reset");
    }
    tables.init().context("initializing tables")?;
    store.init().context("initializing content store")?;
    deployer.init().context("initializing contracts")?;
    log::info!("👤 Deployer: {:#x}", deployer.deployer());

    Ok(Services {
        tables,
        store,
        deployer,
    })
}

pub async fn run() -> Result<()> {
    App::from_cli()?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContractArgs, ContractDeployer};
    use crate::tableland::TableService;
    use crate::waiter::ReceiptSource;
    use clap::Parser;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir, reset: bool) -> context::Context {
        let data_dir = dir.path().join("state");
        let mut args = vec![
            "table-nft".to_string(),
            "--network".to_string(),
            "local".to_string(),
            "--data-dir".to_string(),
            data_dir.to_string_lossy().into_owned(),
        ];
        if reset {
            args.push("--reset".to_string());
        }
        args.push("upload-metadata".to_string());
        context::Context::from_cli(&cli::Cli::try_parse_from(args).unwrap()).unwrap()
    }

    #[test]
    fn services_are_created_under_the_data_dir() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx(&dir, false);
        init_services(&ctx).unwrap();

        assert!(ctx.tables_db_path().exists());
        assert!(ctx.contracts_db_path().exists());
        assert!(ctx.blobs_dir().is_dir());
    }

    #[test]
    fn state_survives_restart_and_reset_clears_it() {
        let dir = TempDir::new().unwrap();

        let first = init_services(&ctx(&dir, false)).unwrap();
        let handle = first.tables.create("id int", "kept").unwrap();
        first
            .deployer
            .deploy(ContractArgs::TableNft {
                base_uri: "ipfs://dir/".into(),
            })
            .unwrap();

        let again = init_services(&ctx(&dir, false)).unwrap();
        assert!(again.tables.receipt(&handle.creation_tx_hash).unwrap().is_some());

        let reset = init_services(&ctx(&dir, true)).unwrap();
        assert!(reset.tables.receipt(&handle.creation_tx_hash).unwrap().is_none());
    }
}
