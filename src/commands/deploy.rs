use anyhow::{Context as AnyhowContext, Result};

use crate::app::Services;
use crate::context::Context;
use crate::orchestrator::{DeployMode, Orchestrator};

pub fn run(ctx: &Context, services: &Services, mode: DeployMode) -> Result<()> {
    let mut orchestrator = Orchestrator::new(
        &services.tables,
        &services.store,
        &services.deployer,
        ctx.layout.clone(),
    );
    let deployment = orchestrator
        .run(mode)
        .with_context(|| format!("{mode:?} deployment failed"))?;
    log::debug!("deploy states: {:?}", orchestrator.history());

    for table in &deployment.tables {
        log::info!("🗂️ Table: {}", table.name);
    }
    log::info!(
        "✅ {} deployed with {} statements written",
        deployment.kind,
        deployment.statements_written
    );

    println!("{:#x}", deployment.address);
    println!("{}", deployment.base_uri);
    Ok(())
}
