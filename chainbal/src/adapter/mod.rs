//! Per-strategy feed adapters.
//!
//! Each adapter spawns its feed onto the chain's [`FeedContext`] and returns
//! immediately. Setup failures are logged here and never reach the caller.

mod assets_pallet;
mod custom_ledger;
mod evm_contract;
mod evm_native;
mod native_pallet;
mod tokens_pallet;
mod wasm_contract;

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;

use crate::asset::AssetDescriptor;
use crate::chain::ChainDescriptor;
use crate::client::{ChainClient, EvmApi, SubstrateApi};
use crate::error::AdapterError;
use crate::lifecycle::FeedContext;
use crate::normalize::Holdings;
use crate::registry::AssetRegistry;
use crate::strategy::{self, Strategy};

/// Everything an adapter needs to run the feeds of one chain.
#[derive(Clone)]
pub(crate) struct ChainFeed {
    pub(crate) chain: Arc<ChainDescriptor>,
    pub(crate) addresses: Arc<[String]>,
    pub(crate) registry: Arc<dyn AssetRegistry>,
    pub(crate) client: ChainClient,
    pub(crate) ctx: FeedContext,
}

impl ChainFeed {
    /// The same chain under another cancellation scope.
    pub(crate) fn scoped(&self, ctx: FeedContext) -> Self {
        Self {
            ctx,
            ..self.clone()
        }
    }

    pub(crate) fn substrate(&self) -> Result<Arc<dyn SubstrateApi>, AdapterError> {
        self.client
            .substrate
            .clone()
            .ok_or(AdapterError::MissingClient("account-style"))
    }

    pub(crate) fn evm(&self) -> Result<Arc<dyn EvmApi>, AdapterError> {
        self.client
            .evm
            .clone()
            .ok_or(AdapterError::MissingClient("evm"))
    }

    /// Assets of this chain retrieved by `strategy`.
    fn assets(&self, strategy: Strategy) -> Vec<AssetDescriptor> {
        self.registry
            .assets(&self.chain.slug, strategy.asset_kinds())
            .into_iter()
            .filter(|asset| strategy::classify(&self.chain, asset) == Some(strategy))
            .collect()
    }

    /// Account addresses parsed as EVM addresses. Unparsable ones are skipped.
    fn evm_addresses(&self) -> Vec<Address> {
        self.addresses
            .iter()
            .filter_map(|a| Address::from_str(a).ok())
            .collect()
    }

    /// Emits a `ready` item, logging when `free` had to be clamped.
    fn emit_ready(&self, asset: &str, holdings: Holdings) {
        if holdings.clamped {
            tracing::warn!(
                chain = %self.chain.slug,
                asset,
                locked = %holdings.locked,
                "locked balance exceeds total, free clamped to zero"
            );
        }
        self.ctx.emit(holdings.into_item(asset));
    }

    /// Spawns one setup task whose failure is logged under `asset`.
    fn spawn_logged<F>(&self, strategy: Strategy, asset: Option<String>, setup: F)
    where
        F: Future<Output = Result<(), AdapterError>> + Send + 'static,
    {
        let chain = self.chain.slug.clone();
        self.ctx.spawn(async move {
            if let Err(error) = setup.await {
                tracing::warn!(
                    %chain,
                    %strategy,
                    asset = asset.as_deref().unwrap_or("*"),
                    %error,
                    "balance feed setup failed"
                );
            }
        });
    }
}

/// Starts the feeds of `strategy` for one chain.
pub(crate) fn start(strategy: Strategy, feed: ChainFeed) {
    tracing::debug!(
        chain = %feed.chain.slug,
        %strategy,
        polled = strategy.is_polled(),
        "starting balance feed"
    );
    match strategy {
        Strategy::NativePallet => native_pallet::start(feed),
        Strategy::TokensPallet { .. } => tokens_pallet::start(feed, strategy),
        Strategy::AssetsPallet => assets_pallet::start(feed),
        Strategy::CustomLedger => custom_ledger::start(feed),
        Strategy::EvmNative => evm_native::start(feed),
        Strategy::EvmContract => evm_contract::start(feed),
        Strategy::WasmContract => wasm_contract::start(feed),
    }
}
