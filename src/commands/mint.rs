use anyhow::{Context, Result};

use crate::app::Services;
use crate::contract::DeployedContract;

pub fn run(services: &Services, address: &str) -> Result<()> {
    let contract = services.deployer.contract_at(address)?;
    let token_id = contract.mint().context("minting")?;
    let token_uri = contract.token_uri(token_id)?;
    log::info!("🪙 Minted token {} of {}", token_id, address);

    println!("{token_id}");
    println!("{token_uri}");
    Ok(())
}
