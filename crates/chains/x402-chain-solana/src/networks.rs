use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A public Solana cluster the payer knows how to reach without extra configuration.
///
/// # Examples
///
/// ```
/// use x402_chain_solana::SolanaCluster;
///
/// let devnet: SolanaCluster = "solana-devnet".parse().unwrap();
/// assert_eq!(devnet.rpc_url(), "https://api.devnet.solana.com");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolanaCluster {
    MainnetBeta,
    Devnet,
}

impl SolanaCluster {
    /// Public JSON-RPC endpoint of the cluster.
    pub fn rpc_url(&self) -> &'static str {
        match self {
            SolanaCluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            SolanaCluster::Devnet => "https://api.devnet.solana.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolanaCluster::MainnetBeta => "mainnet-beta",
            SolanaCluster::Devnet => "devnet",
        }
    }

    /// Resolves a network tag as it appears in payment challenges.
    ///
    /// An optional `solana-` prefix is ignored and `mainnet` is accepted for `mainnet-beta`.
    pub fn from_network(network: &str) -> Option<Self> {
        let network = network.trim();
        match network.strip_prefix("solana-").unwrap_or(network) {
            "devnet" => Some(SolanaCluster::Devnet),
            "mainnet" | "mainnet-beta" | "solana" => Some(SolanaCluster::MainnetBeta),
            _ => None,
        }
    }
}

impl Display for SolanaCluster {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown Solana cluster: {0}")]
pub struct UnknownClusterError(pub String);

impl FromStr for SolanaCluster {
    type Err = UnknownClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_network(s).ok_or_else(|| UnknownClusterError(s.to_string()))
    }
}
