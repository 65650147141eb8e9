//! Asset descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::TokenKey;
use crate::error::{AdapterError, RegistryError};

/// Kind of an asset, deciding where its balance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// The chain's native currency.
    Native,
    /// A runtime-level fungible asset (token pallet, asset pallet or custom ledger).
    Local,
    /// An ERC-20 contract token.
    Erc20,
    /// A PSP-22 (WASM) contract token.
    Psp22,
    /// A non-fungible token; never aggregated.
    NonFungible,
}

impl AssetKind {
    /// Every kind that carries a fungible balance.
    pub const FUNGIBLE: [Self; 4] = [Self::Native, Self::Local, Self::Erc20, Self::Psp22];

    /// Returns `true` for kinds with a fungible balance.
    #[must_use]
    pub const fn is_fungible(self) -> bool {
        !matches!(self, Self::NonFungible)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Native => "native",
            Self::Local => "local",
            Self::Erc20 => "erc20",
            Self::Psp22 => "psp22",
            Self::NonFungible => "non_fungible",
        };
        f.write_str(s)
    }
}

/// Kind-specific metadata of an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Contract address, required for contract kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// On-chain asset id, decimal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// On-chain currency type descriptor (e.g. `{"Token": "KSM"}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_chain_info: Option<Value>,
    /// Marks zk-bridged assets, which the asset-index pallet cannot report.
    #[serde(default)]
    pub zk_bridged: bool,
}

/// One fungible (or non-fungible) unit on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Globally unique key.
    pub slug: String,
    /// Slug of the chain the asset lives on.
    pub origin_chain: String,
    /// Ticker symbol.
    #[serde(default)]
    pub symbol: String,
    /// Decimal places of the smallest unit.
    #[serde(default)]
    pub decimals: u8,
    /// Asset kind.
    pub kind: AssetKind,
    /// Kind-specific metadata.
    #[serde(default)]
    pub metadata: AssetMetadata,
}

impl AssetDescriptor {
    /// Creates an asset with empty metadata.
    #[must_use]
    pub fn new(slug: impl Into<String>, origin_chain: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            slug: slug.into(),
            origin_chain: origin_chain.into(),
            symbol: String::new(),
            decimals: 0,
            kind,
            metadata: AssetMetadata::default(),
        }
    }

    /// Sets the on-chain asset id.
    #[must_use]
    pub fn with_asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.metadata.asset_id = Some(asset_id.into());
        self
    }

    /// Sets the contract address.
    #[must_use]
    pub fn with_contract(mut self, address: impl Into<String>) -> Self {
        self.metadata.contract_address = Some(address.into());
        self
    }

    /// Sets the on-chain currency descriptor.
    #[must_use]
    pub fn with_on_chain_info(mut self, info: Value) -> Self {
        self.metadata.on_chain_info = Some(info);
        self
    }

    /// Marks the asset as zk-bridged.
    #[must_use]
    pub const fn zk_bridged(mut self) -> Self {
        self.metadata.zk_bridged = true;
        self
    }

    /// Checks that the metadata required by the asset's kind is present.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingMetadata`] naming the missing field.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let missing = |field| RegistryError::MissingMetadata {
            slug: self.slug.clone(),
            kind: self.kind,
            field,
        };
        match self.kind {
            AssetKind::Erc20 | AssetKind::Psp22 => {
                if is_blank(self.metadata.contract_address.as_deref()) {
                    return Err(missing("contract_address"));
                }
            }
            AssetKind::Local => {
                if is_blank(self.metadata.asset_id.as_deref())
                    && self.metadata.on_chain_info.is_none()
                {
                    return Err(missing("asset_id"));
                }
            }
            AssetKind::Native | AssetKind::NonFungible => {}
        }
        Ok(())
    }

    /// Key used by the generic token pallet: the on-chain descriptor when
    /// present, otherwise the asset id.
    pub(crate) fn token_key(&self) -> Result<TokenKey, AdapterError> {
        if let Some(info) = &self.metadata.on_chain_info {
            return Ok(TokenKey::OnChain(info.clone()));
        }
        self.metadata
            .asset_id
            .clone()
            .map(TokenKey::AssetId)
            .ok_or_else(|| AdapterError::invalid_asset(&self.slug, "no token pallet key"))
    }

    /// Numeric index used by the asset-index pallet.
    pub(crate) fn asset_index(&self) -> Result<u128, AdapterError> {
        self.parsed_asset_id()
    }

    /// Numeric id used inside custom-ledger records.
    pub(crate) fn ledger_id(&self) -> Result<u64, AdapterError> {
        self.parsed_asset_id()
    }

    fn parsed_asset_id<T: std::str::FromStr>(&self) -> Result<T, AdapterError> {
        let raw = self
            .metadata
            .asset_id
            .as_deref()
            .ok_or_else(|| AdapterError::invalid_asset(&self.slug, "no on-chain asset id"))?;
        raw.trim().replace(',', "").parse().map_err(|_| {
            AdapterError::invalid_asset(&self.slug, format!("asset id `{raw}` is not numeric"))
        })
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
