use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::app::Services;
use crate::context::Context;
use crate::gateway;

pub async fn run(ctx: &Context, services: &Services) -> Result<()> {
    let shutdown = CancellationToken::new();

    let token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("🧨 Ctrl-C received, shutting down...");
                token.cancel();
            }
            Err(e) => log::error!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    gateway::serve(
        ctx.api_listen,
        services.tables.clone(),
        services.tables.chain_id(),
        shutdown,
    )
    .await?;
    log::info!("✅ Shutdown complete");
    Ok(())
}
