use clap::Subcommand;

use crate::orchestrator::DeployMode;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Deploy an NFT contract and the metadata it serves",
        long_about = "Create and confirm the metadata tables, write one row per token and deploy the contract whose base URI resolves to them. In ipfs mode no tables are created and the contract points at the uploaded metadata directory."
    )]
    Deploy {
        #[arg(long, value_enum, default_value_t = DeployMode::TwoTables)]
        mode: DeployMode,
    },
    #[command(
        about = "Upload images and the metadata directory",
        long_about = "Upload every token image, rewrite the descriptors with the image addresses and store the metadata directory. Prints the directory address and its gateway URL."
    )]
    UploadMetadata,
    #[command(
        about = "Print the INSERT statements for the metadata",
        long_about = "Upload images, rewrite the descriptors and print the statements that would fill the given table (or main and attributes tables) without writing them."
    )]
    PrepareSql {
        #[arg(long, value_name = "TABLE", help = "Main (or only) table name")]
        main: String,
        #[arg(
            long,
            value_name = "TABLE",
            help = "Attributes table name; selects the two-table layout"
        )]
        attributes: Option<String>,
    },
    #[command(
        about = "Mint the next token of a deployed contract",
        long_about = "Mint the next token of the contract at ADDR to the deployer and print its id and token URI."
    )]
    Mint {
        #[arg(long, value_name = "ADDR")]
        contract: String,
    },
    #[command(
        about = "Serve the local tables over HTTP",
        long_about = "Run the read-only table gateway: /health and /query?s=<SELECT>, so token URIs of locally deployed contracts resolve to metadata."
    )]
    Serve,
}
