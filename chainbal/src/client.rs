//! Interfaces of the live chain clients consumed by the adapters.
//!
//! Connection management is out of scope: a [`ChainClient`] wraps handles
//! that are already connected. Push subscriptions are modelled as
//! [`Feed`] streams; dropping a feed unsubscribes it.
//!
//! Raw record types mirror what the runtime storage items return. Missing
//! fields deserialize as zero.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Weight;

/// A push subscription. Each item is one update carrying one record per
/// queried key, in query order.
pub type Feed<T> = BoxStream<'static, Result<T, ClientError>>;

/// Errors reported by chain clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The transport failed or the node rejected the request.
    #[error("transport error: {0}")]
    Transport(String),
    /// A response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The runtime does not expose the requested query.
    #[error("unsupported query: {0}")]
    Unsupported(&'static str),
}

/// `system.account` balance data of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    /// Free balance.
    #[serde(default)]
    pub free: Option<u128>,
    /// Reserved balance.
    #[serde(default)]
    pub reserved: Option<u128>,
    /// Legacy misc-frozen balance.
    #[serde(default)]
    pub misc_frozen: Option<u128>,
    /// Legacy fee-frozen balance.
    #[serde(default)]
    pub fee_frozen: Option<u128>,
    /// Frozen balance of runtimes that merged misc/fee frozen.
    #[serde(default)]
    pub frozen: Option<u128>,
}

/// Nomination-pools membership of one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMember {
    /// Pool points held (1:1 with bonded balance).
    pub points: u128,
    /// Amounts being unbonded, keyed by era.
    #[serde(default)]
    pub unbonding_eras: BTreeMap<u32, u128>,
}

/// Record of the generic token pallet. `free` is the account's total balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    /// Total balance (named `free` on chain).
    #[serde(default)]
    pub free: u128,
    /// Reserved balance.
    #[serde(default)]
    pub reserved: u128,
    /// Frozen balance.
    #[serde(default)]
    pub frozen: u128,
}

/// Record of the asset-index pallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAccount {
    /// Balance held.
    pub balance: u128,
    /// Whether the whole balance is frozen.
    #[serde(default)]
    pub is_frozen: bool,
}

/// Currency key of the generic token pallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKey {
    /// An on-chain currency descriptor such as `{"Token": "KSM"}`.
    OnChain(Value),
    /// A plain asset id.
    AssetId(String),
}

/// Account-style chain client.
///
/// Only [`ready`](Self::ready) and [`subscribe_accounts`](Self::subscribe_accounts)
/// are required; the other queries default to [`ClientError::Unsupported`].
#[async_trait]
pub trait SubstrateApi: Send + Sync {
    /// Resolves once the connection is usable.
    async fn ready(&self) -> Result<(), ClientError>;

    /// Subscribes to `system.account` of every address.
    async fn subscribe_accounts(
        &self,
        addresses: &[String],
    ) -> Result<Feed<Vec<AccountBalance>>, ClientError>;

    /// Fetches `nominationPools.poolMembers` of every address.
    async fn pool_members(
        &self,
        _addresses: &[String],
    ) -> Result<Vec<Option<PoolMember>>, ClientError> {
        Err(ClientError::Unsupported("nominationPools.poolMembers"))
    }

    /// Subscribes to `tokens.accounts` of `(address, key)` for every address.
    async fn subscribe_token_accounts(
        &self,
        _addresses: &[String],
        _key: &TokenKey,
    ) -> Result<Feed<Vec<TokenAccount>>, ClientError> {
        Err(ClientError::Unsupported("tokens.accounts"))
    }

    /// Subscribes to `assets.account` of `(asset_index, address)` for every
    /// address. Accounts that do not hold the asset yield `None`.
    async fn subscribe_asset_accounts(
        &self,
        _asset_index: u128,
        _addresses: &[String],
    ) -> Result<Feed<Vec<Option<AssetAccount>>>, ClientError> {
        Err(ClientError::Unsupported("assets.account"))
    }

    /// Subscribes to the custom ledger's account records, one JSON document
    /// per address.
    async fn subscribe_ledger_accounts(
        &self,
        _addresses: &[String],
    ) -> Result<Feed<Vec<String>>, ClientError> {
        Err(ClientError::Unsupported("system.account (custom ledger)"))
    }

    /// Dry-runs `psp22::balanceOf(owner)` on a WASM contract. `None` means the
    /// call produced no output.
    async fn wasm_balance_of(
        &self,
        _contract: &str,
        _owner: &str,
        _gas_limit: Weight,
    ) -> Result<Option<Value>, ClientError> {
        Err(ClientError::Unsupported("contracts.call"))
    }
}

/// EVM chain client.
#[async_trait]
pub trait EvmApi: Send + Sync {
    /// Native balance of an address at the latest block.
    async fn native_balance(&self, address: Address) -> Result<U256, ClientError>;

    /// ERC-20 `balanceOf(owner)` on a token contract.
    async fn erc20_balance_of(&self, token: Address, owner: Address) -> Result<U256, ClientError>;
}

/// The live client handles of one chain.
#[derive(Clone, Default)]
pub struct ChainClient {
    /// Account-style client.
    pub substrate: Option<Arc<dyn SubstrateApi>>,
    /// EVM client.
    pub evm: Option<Arc<dyn EvmApi>>,
}

impl fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainClient")
            .field("substrate", &self.substrate.is_some())
            .field("evm", &self.evm.is_some())
            .finish()
    }
}

impl ChainClient {
    /// Wraps an account-style client.
    #[must_use]
    pub fn substrate(api: Arc<dyn SubstrateApi>) -> Self {
        Self {
            substrate: Some(api),
            evm: None,
        }
    }

    /// Wraps an EVM client.
    #[must_use]
    pub fn evm(api: Arc<dyn EvmApi>) -> Self {
        Self {
            substrate: None,
            evm: Some(api),
        }
    }

    /// Adds an EVM client to a dual-stack chain.
    #[must_use]
    pub fn with_evm(mut self, api: Arc<dyn EvmApi>) -> Self {
        self.evm = Some(api);
        self
    }
}
