use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context as AnyhowContext, Result};
use url::Url;

use crate::network::{self, Network};
use crate::orchestrator::Layout;

/// Run configuration resolved from the command line.
pub struct Context {
    pub network: Network,
    pub data_dir: PathBuf,
    pub private_key: String,
    pub log_file: Option<PathBuf>,
    pub reset: bool,
    pub layout: Layout,
    pub max_supply: u64,
    pub api_listen: SocketAddr,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        Url::parse(&cli.tableland_base_uri)
            .with_context(|| format!("invalid tableland base URI `{}`", cli.tableland_base_uri))?;

        Ok(Self {
            network: network::parse_network(Some(&cli.network)),
            data_dir: PathBuf::from(&cli.data_dir),
            private_key: cli.private_key.clone(),
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            reset: cli.reset,
            layout: Layout {
                metadata_dir: cli.metadata_dir.clone(),
                images_dir: cli.images_dir.clone(),
                image_uri: cli.image_uri,
                tableland_base_uri: cli.tableland_base_uri.clone(),
            },
            max_supply: cli.max_supply,
            api_listen: cli.api_listen,
        })
    }

    pub fn tables_db_path(&self) -> PathBuf {
        self.data_dir.join(format!("tables-{}.sqlite", self.network))
    }

    pub fn contracts_db_path(&self) -> PathBuf {
        self.data_dir.join(format!("contracts-{}.sqlite", self.network))
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("ipfs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["table-nft"];
        full.extend_from_slice(args);
        full.push("upload-metadata");
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn state_paths_are_kept_per_network() {
        let ctx =
            Context::from_cli(&cli(&["--data-dir", "/tmp/nft", "--network", "ethereum-goerli"]))
                .unwrap();
        assert_eq!(
            ctx.tables_db_path(),
            PathBuf::from("/tmp/nft/tables-ethereum-goerli.sqlite")
        );
        assert_eq!(
            ctx.contracts_db_path(),
            PathBuf::from("/tmp/nft/contracts-ethereum-goerli.sqlite")
        );
        assert_eq!(ctx.blobs_dir(), PathBuf::from("/tmp/nft/ipfs"));
        assert_eq!(ctx.network.chain_id(), 5);
    }

    #[test]
    fn malformed_base_uri_is_rejected() {
        let err = Context::from_cli(&cli(&["--tableland-base-uri", "not a url"]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("invalid tableland base URI"));
    }
}
