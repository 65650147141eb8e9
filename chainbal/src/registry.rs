//! Read-only chain and asset lookup.
//!
//! The engine only consumes the [`AssetRegistry`] trait; how registries are
//! loaded is up to the application. [`InMemoryRegistry`] is a validating
//! in-memory implementation assembled at startup.

use std::collections::{BTreeMap, HashMap};

use crate::asset::{AssetDescriptor, AssetKind};
use crate::chain::{BalanceModule, ChainDescriptor};
use crate::error::RegistryError;

/// Lookup of chain and asset descriptors.
pub trait AssetRegistry: Send + Sync {
    /// Returns the chain registered under `slug`.
    fn chain(&self, slug: &str) -> Option<ChainDescriptor>;

    /// Returns the assets of `chain` whose kind is one of `kinds`, ordered by slug.
    fn assets(&self, chain: &str, kinds: &[AssetKind]) -> Vec<AssetDescriptor>;

    /// Returns the native asset of `chain`.
    fn native_asset(&self, chain: &str) -> Option<AssetDescriptor> {
        self.assets(chain, &[AssetKind::Native]).into_iter().next()
    }
}

/// Validating in-memory registry.
///
/// # Example
///
/// ```rust
/// use chainbal::asset::{AssetDescriptor, AssetKind};
/// use chainbal::chain::ChainDescriptor;
/// use chainbal::registry::{AssetRegistry, InMemoryRegistry};
///
/// let registry = InMemoryRegistry::new()
///     .with_chain(ChainDescriptor::evm("ethereum", 1))
///     .unwrap()
///     .with_asset(AssetDescriptor::new("ethereum-NATIVE-ETH", "ethereum", AssetKind::Native))
///     .unwrap();
///
/// assert!(registry.native_asset("ethereum").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    chains: HashMap<String, ChainDescriptor>,
    assets: BTreeMap<String, AssetDescriptor>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a chain, replacing any previous chain with the same slug.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoStack`] if the descriptor fails validation.
    pub fn register_chain(&mut self, chain: ChainDescriptor) -> Result<(), RegistryError> {
        chain.validate()?;
        self.chains.insert(chain.slug.clone(), chain);
        Ok(())
    }

    /// Registers an asset. Its chain must already be registered.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate slug, an unknown origin chain, or missing metadata.
    /// Native and local assets of a custom-ledger chain need a numeric
    /// `asset_id`.
    pub fn register_asset(&mut self, asset: AssetDescriptor) -> Result<(), RegistryError> {
        if self.assets.contains_key(&asset.slug) {
            return Err(RegistryError::DuplicateAsset(asset.slug));
        }
        if !self.chains.contains_key(&asset.origin_chain) {
            return Err(RegistryError::UnknownChain {
                asset: asset.slug,
                chain: asset.origin_chain,
            });
        }
        asset.validate()?;
        if self.requires_ledger_id(&asset) && asset.ledger_id().is_err() {
            return Err(RegistryError::MissingMetadata {
                slug: asset.slug,
                kind: asset.kind,
                field: "asset_id",
            });
        }
        self.assets.insert(asset.slug.clone(), asset);
        Ok(())
    }

    /// Custom-ledger chains key every fungible balance, the native one
    /// included, by a numeric asset id.
    fn requires_ledger_id(&self, asset: &AssetDescriptor) -> bool {
        matches!(asset.kind, AssetKind::Native | AssetKind::Local)
            && self
                .chains
                .get(&asset.origin_chain)
                .and_then(ChainDescriptor::balance_module)
                == Some(BalanceModule::CustomLedger)
    }

        /// Builder-style [`register_chain`](Self::register_chain).
    ///
    /// # Errors
    ///
    /// See [`register_chain`](Self::register_chain).
    pub fn with_chain(mut self, chain: ChainDescriptor) -> Result<Self, RegistryError> {
        self.register_chain(chain)?;
        Ok(self)
    }

    /// Builder-style [`register_asset`](Self::register_asset).
    ///
    /// # Errors
    ///
    /// See [`register_asset`](Self::register_asset).
    pub fn with_asset(mut self, asset: AssetDescriptor) -> Result<Self, RegistryError> {
        self.register_asset(asset)?;
        Ok(self)
    }

    /// Returns the slugs of every registered chain.
    pub fn chain_slugs(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Returns the number of registered assets.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }
}

impl AssetRegistry for InMemoryRegistry {
    fn chain(&self, slug: &str) -> Option<ChainDescriptor> {
        self.chains.get(slug).cloned()
    }

    fn assets(&self, chain: &str, kinds: &[AssetKind]) -> Vec<AssetDescriptor> {
        self.assets
            .values()
            .filter(|a| a.origin_chain == chain && kinds.contains(&a.kind))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::new()
            .with_chain(ChainDescriptor::evm("ethereum", 1))
            .unwrap()
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let mut registry = registry();
        let asset = AssetDescriptor::new("ethereum-NATIVE-ETH", "ethereum", AssetKind::Native);
        registry.register_asset(asset.clone()).unwrap();
        assert_eq!(
            registry.register_asset(asset),
            Err(RegistryError::DuplicateAsset("ethereum-NATIVE-ETH".into()))
        );
    }

    #[test]
    fn test_unknown_chain_rejected() {
        let mut registry = registry();
        let err = registry
            .register_asset(AssetDescriptor::new("x", "polygon", AssetKind::Native))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownChain { .. }));
    }

    #[test]
    fn test_assets_filtered_by_kind() {
        let registry = registry()
            .with_asset(AssetDescriptor::new("ethereum-NATIVE-ETH", "ethereum", AssetKind::Native))
            .unwrap()
            .with_asset(
                AssetDescriptor::new("ethereum-ERC20-USDC", "ethereum", AssetKind::Erc20)
                    .with_contract("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            )
            .unwrap();
        let tokens = registry.assets("ethereum", &[AssetKind::Erc20]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].slug, "ethereum-ERC20-USDC");
        assert_eq!(
            registry.native_asset("ethereum").map(|a| a.slug),
            Some("ethereum-NATIVE-ETH".to_owned())
        );
        assert!(registry.assets("polygon", &AssetKind::FUNGIBLE).is_empty());
    }

    #[test]
    fn test_custom_ledger_assets_need_numeric_id() {
        let chain = ChainDescriptor::substrate(
            "genshiro",
            crate::chain::SubstrateInfo {
                balance_module: BalanceModule::CustomLedger,
                ..Default::default()
            },
        );
        let mut registry = InMemoryRegistry::new().with_chain(chain).unwrap();
        let err = registry
            .register_asset(AssetDescriptor::new("genshiro-NATIVE-GENS", "genshiro", AssetKind::Native))
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingMetadata { field: "asset_id", .. }));
        registry
            .register_asset(
                AssetDescriptor::new("genshiro-NATIVE-GENS", "genshiro", AssetKind::Native)
                    .with_asset_id("1,000"),
            )
            .unwrap();

        let mut slugs: Vec<_> = registry
            .with_chain(ChainDescriptor::evm("ethereum", 1))
            .unwrap()
            .chain_slugs()
            .map(str::to_owned)
            .collect();
        slugs.sort();
        assert_eq!(slugs, vec!["ethereum", "genshiro"]);
    }
}
