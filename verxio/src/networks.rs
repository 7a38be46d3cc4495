//! Well-known Solana cluster definitions and USDC deployments.
//!
//! Wallet contexts connect to one of the clusters defined here and price
//! checkout flows against the cluster's USDC deployment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_pubkey::{Pubkey, pubkey};

/// Solana cluster a wallet context connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolanaCluster {
    /// Production cluster.
    MainnetBeta,
    /// Public development cluster with test-token faucets.
    Devnet,
}

impl SolanaCluster {
    /// Canonical cluster name, as used in configuration and session info.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MainnetBeta => "mainnet-beta",
            Self::Devnet => "devnet",
        }
    }

    /// Public RPC endpoint for the cluster.
    #[must_use]
    pub const fn default_rpc_url(self) -> &'static str {
        match self {
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Devnet => "https://api.devnet.solana.com",
        }
    }
}

impl fmt::Display for SolanaCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error parsing a [`SolanaCluster`] from its configured name.
#[derive(Debug, thiserror::Error)]
#[error("unknown Solana cluster: {0}")]
pub struct UnknownClusterError(String);

impl FromStr for SolanaCluster {
    type Err = UnknownClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet-beta" | "mainnet" => Ok(Self::MainnetBeta),
            "devnet" => Ok(Self::Devnet),
            other => Err(UnknownClusterError(other.to_owned())),
        }
    }
}

/// A USDC token deployment on a specific cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsdcDeployment {
    /// Cluster the mint lives on.
    pub cluster: SolanaCluster,
    /// SPL token mint address.
    pub mint: Pubkey,
    /// Token decimals.
    pub decimals: u8,
}

impl UsdcDeployment {
    const fn new(cluster: SolanaCluster, mint: Pubkey, decimals: u8) -> Self {
        Self {
            cluster,
            mint,
            decimals,
        }
    }
}

/// Well-known USDC deployments, one per supported cluster.
static USDC_DEPLOYMENTS: &[UsdcDeployment] = &[
    // Mainnet-beta — native Circle USDC (SPL Token)
    // Verify: https://solscan.io/token/EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v
    UsdcDeployment::new(
        SolanaCluster::MainnetBeta,
        pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
        6,
    ),
    // Devnet — native Circle USDC testnet (SPL Token)
    // Verify: https://explorer.solana.com/address/4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU?cluster=devnet
    UsdcDeployment::new(
        SolanaCluster::Devnet,
        pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"),
        6,
    ),
];

/// Ergonomic accessors for USDC deployments on supported clusters.
#[derive(Debug, Clone, Copy)]
pub struct USDC;

#[allow(clippy::doc_markdown, clippy::missing_panics_doc)]
impl USDC {
    /// Looks up the USDC deployment for a cluster.
    #[must_use]
    pub fn on(cluster: SolanaCluster) -> &'static UsdcDeployment {
        USDC_DEPLOYMENTS
            .iter()
            .find(|d| d.cluster == cluster)
            .expect("built-in USDC deployment missing for supported cluster")
    }

    /// Returns all known USDC deployments.
    #[must_use]
    pub fn all() -> &'static [UsdcDeployment] {
        USDC_DEPLOYMENTS
    }

    /// USDC on mainnet-beta.
    #[must_use]
    pub fn mainnet() -> &'static UsdcDeployment {
        Self::on(SolanaCluster::MainnetBeta)
    }

    /// USDC on devnet.
    #[must_use]
    pub fn devnet() -> &'static UsdcDeployment {
        Self::on(SolanaCluster::Devnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_names_parse_back() {
        for cluster in [SolanaCluster::MainnetBeta, SolanaCluster::Devnet] {
            assert_eq!(cluster.name().parse::<SolanaCluster>().unwrap(), cluster);
        }
        assert_eq!(
            "mainnet".parse::<SolanaCluster>().unwrap(),
            SolanaCluster::MainnetBeta
        );
        assert!("testnet".parse::<SolanaCluster>().is_err());
    }

    #[test]
    fn test_usdc_deployments_cover_supported_clusters() {
        assert_eq!(USDC::all().len(), 2);
        assert_eq!(
            USDC::mainnet().mint.to_string(),
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        );
        assert_eq!(USDC::devnet().decimals, 6);
        assert_eq!(USDC::on(SolanaCluster::Devnet).cluster, SolanaCluster::Devnet);
    }

    #[test]
    fn test_cluster_serializes_kebab_case() {
        let json = serde_json::to_string(&SolanaCluster::MainnetBeta).unwrap();
        assert_eq!(json, "\"mainnet-beta\"");
        let back: SolanaCluster = serde_json::from_str("\"devnet\"").unwrap();
        assert_eq!(back, SolanaCluster::Devnet);
    }
}
