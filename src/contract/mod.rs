pub mod local;
pub mod traits;

pub use local::{signer_address, LocalDeployer};
pub use traits::{ContractArgs, ContractDeployer, DeployedContract};
