//! Chain descriptors and address-family handling.
//!
//! A [`ChainDescriptor`] describes one network by its capabilities rather than
//! by membership in hand-maintained chain-group lists:
//!
//! - [`SubstrateInfo`] - present on account-style chains; carries the address
//!   prefix, relay/para role, the [`BalanceModule`] holding non-native assets,
//!   pooled-staking support and the WASM contract standards the chain runs
//! - [`EvmInfo`] - present on EVM-compatible chains; carries the EIP-155 chain id
//!
//! A chain may carry both (dual-stack) but never neither.

use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::asset::AssetKind;
use crate::error::RegistryError;

/// Role of an account-style chain within its network topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainRole {
    /// A relay chain.
    Relay,
    /// A parachain attached to a relay chain.
    Para,
    /// An independent chain.
    #[default]
    Solo,
}

/// Runtime module that stores the balances of non-native assets.
///
/// Exactly one module is selected per chain, which keeps the token-pallet,
/// asset-index and custom-ledger strategies mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceModule {
    /// Only the system account pallet; no local assets.
    #[default]
    System,
    /// A generic fungible-token pallet keyed by `(account, currency)`.
    Tokens,
    /// A generic fungible-token pallet that also carries the native currency,
    /// replacing the system account pallet for native balances.
    TokensWithNative,
    /// An asset-index pallet keyed by `(asset index, account)`.
    Assets,
    /// A bespoke system account encoding holding every asset in one record.
    CustomLedger,
}

/// Account-style (Substrate) capabilities of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstrateInfo {
    /// SS58 address prefix.
    #[serde(default = "default_address_prefix")]
    pub address_prefix: u16,
    /// Relay, para or solo chain.
    #[serde(default)]
    pub role: ChainRole,
    /// Module holding non-native asset balances.
    #[serde(default)]
    pub balance_module: BalanceModule,
    /// Whether the runtime ships the nomination-pools pallet.
    #[serde(default)]
    pub pooled_staking: bool,
    /// Contract token standards the chain can execute (e.g. `psp22`).
    #[serde(default)]
    pub contract_standards: Vec<AssetKind>,
}

const fn default_address_prefix() -> u16 {
    42
}

impl Default for SubstrateInfo {
    fn default() -> Self {
        Self {
            address_prefix: default_address_prefix(),
            role: ChainRole::default(),
            balance_module: BalanceModule::default(),
            pooled_staking: false,
            contract_standards: Vec::new(),
        }
    }
}

/// EVM capabilities of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvmInfo {
    /// EIP-155 chain id.
    pub chain_id: u64,
}

/// One network known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// Unique key of the chain.
    pub slug: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Account-style descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substrate: Option<SubstrateInfo>,
    /// EVM descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm: Option<EvmInfo>,
}

impl ChainDescriptor {
    /// Creates an account-style chain.
    #[must_use]
    pub fn substrate(slug: impl Into<String>, info: SubstrateInfo) -> Self {
        let slug = slug.into();
        Self {
            name: slug.clone(),
            slug,
            substrate: Some(info),
            evm: None,
        }
    }

    /// Creates an EVM-only chain.
    #[must_use]
    pub fn evm(slug: impl Into<String>, chain_id: u64) -> Self {
        let slug = slug.into();
        Self {
            name: slug.clone(),
            slug,
            substrate: None,
            evm: Some(EvmInfo { chain_id }),
        }
    }

    /// Adds an EVM descriptor, turning the chain into a dual-stack chain.
    #[must_use]
    pub const fn with_evm(mut self, chain_id: u64) -> Self {
        self.evm = Some(EvmInfo { chain_id });
        self
    }

    /// Checks that at least one stack descriptor is present.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoStack`] if both descriptors are missing.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.substrate.is_none() && self.evm.is_none() {
            return Err(RegistryError::NoStack(self.slug.clone()));
        }
        Ok(())
    }

    /// Returns `true` for chains that only speak EVM.
    #[must_use]
    pub const fn is_evm_only(&self) -> bool {
        self.substrate.is_none() && self.evm.is_some()
    }

    /// Returns `true` for chains that expose an EVM.
    #[must_use]
    pub const fn is_evm_compatible(&self) -> bool {
        self.evm.is_some()
    }

    /// Returns `true` for relay chains.
    #[must_use]
    pub fn is_relay_chain(&self) -> bool {
        self.substrate
            .as_ref()
            .is_some_and(|s| s.role == ChainRole::Relay)
    }

    /// Returns `true` when native balances must include pooled stake.
    #[must_use]
    pub fn tracks_pooled_staking(&self) -> bool {
        self.is_relay_chain() && self.substrate.as_ref().is_some_and(|s| s.pooled_staking)
    }

    /// Returns `true` if the chain executes contracts of the given standard.
    #[must_use]
    pub fn supports_contract(&self, kind: AssetKind) -> bool {
        self.substrate
            .as_ref()
            .is_some_and(|s| s.contract_standards.contains(&kind))
    }

    /// Returns the module holding non-native balances, if account-style.
    #[must_use]
    pub fn balance_module(&self) -> Option<BalanceModule> {
        self.substrate.as_ref().map(|s| s.balance_module)
    }

    /// Returns the address family this chain is queried with.
    ///
    /// Dual-stack chains key their accounts by EVM addresses.
    #[must_use]
    pub const fn address_family(&self) -> AddressFamily {
        if self.evm.is_some() {
            AddressFamily::Evm
        } else {
            AddressFamily::Substrate
        }
    }
}

/// Format family of an account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// Public-key derived (SS58) addresses.
    Substrate,
    /// `0x`-prefixed 20-byte addresses.
    Evm,
}

impl AddressFamily {
    /// Classifies an address by inspecting its format.
    #[must_use]
    pub fn of(address: &str) -> Self {
        if is_evm_address(address) {
            Self::Evm
        } else {
            Self::Substrate
        }
    }
}

/// Returns `true` for `0x`-prefixed, 40-hex-digit addresses.
#[must_use]
pub fn is_evm_address(address: &str) -> bool {
    address.len() == 42 && address.starts_with("0x") && Address::from_str(address).is_ok()
}

/// Addresses split by [`AddressFamily`], preserving input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedAddresses {
    /// Account-style addresses.
    pub substrate: Vec<String>,
    /// EVM-style addresses.
    pub evm: Vec<String>,
}

impl PartitionedAddresses {
    /// Splits the given addresses by format.
    #[must_use]
    pub fn partition(addresses: &[String]) -> Self {
        let (evm, substrate) = addresses
            .iter()
            .cloned()
            .partition(|a| AddressFamily::of(a) == AddressFamily::Evm);
        Self { substrate, evm }
    }

    /// Returns the addresses usable on a chain of the given family.
    #[must_use]
    pub fn for_family(&self, family: AddressFamily) -> &[String] {
        match family {
            AddressFamily::Substrate => &self.substrate,
            AddressFamily::Evm => &self.evm,
        }
    }
}
