mod app;
mod cli;
mod commands;
mod context;
mod contract;
mod db;
mod gateway;
mod metadata;
mod network;
mod orchestrator;
mod sql;
mod storage;
mod tableland;
mod tracing;
mod types;
mod waiter;

#[tokio::main]
async fn main() {
    tracing::init();

    if let Err(e) = app::run().await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
