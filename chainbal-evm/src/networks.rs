//! Well-known EVM networks and their USDC deployments.
//!
//! Applications register these into an
//! [`InMemoryRegistry`](chainbal::registry::InMemoryRegistry) at startup.

use alloy_primitives::{Address, address};
use chainbal::asset::{AssetDescriptor, AssetKind};
use chainbal::chain::ChainDescriptor;

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: u64 = 1;

/// Base Mainnet chain ID.
pub const BASE_MAINNET: u64 = 8453;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: u64 = 137;

/// Avalanche C-Chain chain ID.
pub const AVALANCHE_MAINNET: u64 = 43114;

/// Celo Mainnet chain ID.
pub const CELO_MAINNET: u64 = 42220;

/// USDC contract address on Ethereum Mainnet.
pub const USDC_ETHEREUM: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// USDC contract address on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Polygon Mainnet.
pub const USDC_POLYGON: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// USDC contract address on Avalanche C-Chain.
pub const USDC_AVALANCHE: Address = address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E");

/// USDC contract address on Celo.
pub const USDC_CELO: Address = address!("cebA9300f2b948710d2653dD7B07f33A8B32118C");

const USDC_DECIMALS: u8 = 6;

/// One known network: slug, display name, chain id, native symbol and the
/// USDC deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownNetwork {
    /// Registry slug.
    pub slug: &'static str,
    /// Display name.
    pub name: &'static str,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Ticker of the native currency.
    pub native_symbol: &'static str,
    /// USDC contract address.
    pub usdc: Address,
}

/// Every network known to this crate.
pub const KNOWN_NETWORKS: &[KnownNetwork] = &[
    KnownNetwork {
        slug: "ethereum",
        name: "Ethereum",
        chain_id: ETHEREUM_MAINNET,
        native_symbol: "ETH",
        usdc: USDC_ETHEREUM,
    },
    KnownNetwork {
        slug: "base_mainnet",
        name: "Base",
        chain_id: BASE_MAINNET,
        native_symbol: "ETH",
        usdc: USDC_BASE,
    },
    KnownNetwork {
        slug: "polygon",
        name: "Polygon",
        chain_id: POLYGON_MAINNET,
        native_symbol: "POL",
        usdc: USDC_POLYGON,
    },
    KnownNetwork {
        slug: "avalanche_c",
        name: "Avalanche C-Chain",
        chain_id: AVALANCHE_MAINNET,
        native_symbol: "AVAX",
        usdc: USDC_AVALANCHE,
    },
    KnownNetwork {
        slug: "celo",
        name: "Celo",
        chain_id: CELO_MAINNET,
        native_symbol: "CELO",
        usdc: USDC_CELO,
    },
];

impl KnownNetwork {
    /// Looks a network up by its chain id.
    #[must_use]
    pub fn by_chain_id(chain_id: u64) -> Option<&'static Self> {
        KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
    }

    /// The EVM-only chain descriptor.
    #[must_use]
    pub fn chain(&self) -> ChainDescriptor {
        ChainDescriptor {
            name: self.name.to_owned(),
            ..ChainDescriptor::evm(self.slug, self.chain_id)
        }
    }

    /// The native asset and the USDC token.
    #[must_use]
    pub fn assets(&self) -> Vec<AssetDescriptor> {
        let mut native = AssetDescriptor::new(
            format!("{}-NATIVE-{}", self.slug, self.native_symbol),
            self.slug,
            AssetKind::Native,
        );
        native.symbol = self.native_symbol.to_owned();
        native.decimals = 18;

        let mut usdc = AssetDescriptor::new(
            format!("{}-ERC20-USDC-{}", self.slug, self.usdc),
            self.slug,
            AssetKind::Erc20,
        )
        .with_contract(self.usdc.to_string());
        usdc.symbol = "USDC".to_owned();
        usdc.decimals = USDC_DECIMALS;

        vec![native, usdc]
    }
}

#[cfg(test)]
mod tests {
    use chainbal::registry::{AssetRegistry, InMemoryRegistry};

    use super::*;

    #[test]
    fn test_known_networks_register_cleanly() {
        let mut registry = InMemoryRegistry::new();
        for network in KNOWN_NETWORKS {
            registry.register_chain(network.chain()).unwrap();
            for asset in network.assets() {
                registry.register_asset(asset).unwrap();
            }
        }
        assert_eq!(registry.asset_count(), KNOWN_NETWORKS.len() * 2);
        let base = registry.chain("base_mainnet").unwrap();
        assert!(base.is_evm_only());
        assert_eq!(
            registry.native_asset("polygon").map(|a| a.symbol),
            Some("POL".to_owned())
        );
    }

    #[test]
    fn test_lookup_by_chain_id() {
        assert_eq!(KnownNetwork::by_chain_id(8453).map(|n| n.slug), Some("base_mainnet"));
        assert!(KnownNetwork::by_chain_id(999_999).is_none());
    }
}
