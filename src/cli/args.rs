use clap::Parser;
use std::env;
use std::path::PathBuf;

use crate::cli::command::Command;
use crate::metadata::ImageUri;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Prepare NFT metadata and deploy contracts that serve it from tables or a content store",
    long_about = "Uploads token images to a content-addressed store, rewrites the metadata descriptors, writes them as rows of one or two tables and deploys an NFT contract whose base URI resolves to those rows."
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (tables, contracts and stored blobs) before running"
    )]
    pub reset: bool,

    #[arg(
        long,
        default_value = ".table-nft/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long,
        env = "TABLE_NFT_NETWORK",
        default_value = "polygon-mumbai",
        value_name = "NAME",
        help = "Target network: local, ethereum-goerli or polygon-mumbai"
    )]
    pub network: String,

    #[arg(
        long,
        env = "PRIVATE_KEY",
        default_value = "dev",
        hide_env_values = true,
        value_name = "KEY",
        help = "Key of the account that deploys contracts and mints tokens"
    )]
    pub private_key: String,

    #[arg(
        long = "log-file",
        env = "TABLE_NFT_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long,
        default_value = "metadata",
        value_name = "DIR",
        help = "Directory of descriptor files, one per token, named by token id"
    )]
    pub metadata_dir: PathBuf,

    #[arg(
        long,
        default_value = "images",
        value_name = "DIR",
        help = "Directory of token images named {id}.jpeg"
    )]
    pub images_dir: PathBuf,

    #[arg(
        long,
        value_enum,
        default_value_t = ImageUri::Ipfs,
        help = "How rewritten descriptors reference their image"
    )]
    pub image_uri: ImageUri,

    #[arg(
        long,
        env = "TABLELAND_BASE_URI",
        default_value = "https://testnet.tableland.network/query?s=",
        value_name = "URL",
        help = "Base URI of the table gateway used by table-backed contracts"
    )]
    pub tableland_base_uri: String,

    #[arg(
        long,
        default_value_t = 2u64,
        value_name = "N",
        help = "Maximum number of tokens a deployed contract can mint"
    )]
    pub max_supply: u64,

    #[arg(
        long = "api-listen",
        env = "TABLE_NFT_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8084",
        help = "Table gateway listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[command(subcommand)]
    pub cmd: Command,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    let loaded = dotenvy::from_filename(&dotenv_path).is_ok();

    let cli = Cli::parse();
    if loaded {
        log::debug!("Loaded env from {}", dotenv_path);
    }
    cli
}
