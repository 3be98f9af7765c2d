use crate::app::Services;
use crate::cli::Command;
use crate::context;

mod deploy;
mod metadata;
mod mint;
mod serve;

impl Command {
    pub async fn run(&self, ctx: &context::Context, services: &Services) -> anyhow::Result<()> {
        match self {
            Command::Deploy { mode } => deploy::run(ctx, services, *mode),
            Command::UploadMetadata => metadata::upload(ctx, services),
            Command::PrepareSql { main, attributes } => {
                metadata::prepare_sql(ctx, services, main, attributes.as_deref())
            }
            Command::Mint { contract } => mint::run(services, contract),
            Command::Serve => serve::run(ctx, services).await,
        }
    }
}
