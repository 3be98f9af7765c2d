use std::fmt;

/// Chains a deployment can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Local,
    EthereumGoerli,
    PolygonMumbai,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Local => 31337,
            Network::EthereumGoerli => 5,
            Network::PolygonMumbai => 80001,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Local => "local",
            Network::EthereumGoerli => "ethereum-goerli",
            Network::PolygonMumbai => "polygon-mumbai",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn parse_network<S: AsRef<str>>(s: Option<S>) -> Network {
    match s.as_ref().map(|x| x.as_ref().to_lowercase()) {
        Some(n) if n == "goerli" || n == "ethereum-goerli" => Network::EthereumGoerli,
        Some(n) if n == "mumbai" || n == "polygon-mumbai" => Network::PolygonMumbai,
        Some(n) if n == "local" || n == "localhost" || n == "hardhat" => Network::Local,
        _ => Network::Local,
    }
}
