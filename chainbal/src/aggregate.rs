//! The public entry point of the engine.
//!
//! [`BalanceAggregator::subscribe`] partitions the addresses by family, plans
//! the strategies of every chain, spawns their feeds and returns a single
//! [`BalanceSubscription`] covering all of them.
//! [`BalanceAggregator::token_free_balance`] is the one-shot form used by
//! transfer and fee estimation.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::U256;
use tokio::sync::mpsc;

use crate::adapter::{self, ChainFeed};
use crate::asset::AssetKind;
use crate::balance::{BalanceItem, BalanceSink, ItemState};
use crate::chain::{ChainDescriptor, PartitionedAddresses};
use crate::client::ChainClient;
use crate::config::AggregatorConfig;
use crate::error::QueryError;
use crate::lifecycle::{BalanceSubscription, FeedContext};
use crate::registry::AssetRegistry;
use crate::strategy;

/// Aggregates balances of many addresses across many chains.
///
/// # Example
///
/// ```ignore
/// let aggregator = BalanceAggregator::new(registry).with_config(config);
/// let subscription = aggregator.subscribe(&addresses, &chains, &clients, |item| {
///     tracing::info!(asset = %item.token_slug, free = %item.free, "balance");
/// });
/// subscription.shutdown().await;
/// ```
#[derive(Clone)]
pub struct BalanceAggregator {
    registry: Arc<dyn AssetRegistry>,
    config: AggregatorConfig,
}

impl std::fmt::Debug for BalanceAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceAggregator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BalanceAggregator {
    /// Creates an aggregator over `registry` with the default configuration.
    #[must_use]
    pub fn new<R: AssetRegistry + 'static>(registry: R) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    /// Creates an aggregator over an already shared registry.
    #[must_use]
    pub fn from_shared(registry: Arc<dyn AssetRegistry>) -> Self {
        Self {
            registry,
            config: AggregatorConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub const fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts feeds for every chain in `chains` and returns immediately.
    ///
    /// A chain uses the EVM-style addresses when it has an EVM descriptor and
    /// the account-style ones otherwise. A chain left without addresses emits
    /// one zero `ready` item per asset and starts no feed. A chain without an
    /// entry in `clients` is skipped with a warning.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn subscribe<S: BalanceSink>(
        &self,
        addresses: &[String],
        chains: &[ChainDescriptor],
        clients: &HashMap<String, ChainClient>,
        sink: S,
    ) -> BalanceSubscription {
        let ctx = FeedContext::new(Arc::new(sink), self.config);
        let partitioned = PartitionedAddresses::partition(addresses);

        for chain in chains {
            let usable = partitioned.for_family(chain.address_family());
            if usable.is_empty() {
                self.emit_zero(chain, &ctx);
                continue;
            }
            let Some(client) = clients.get(&chain.slug) else {
                tracing::warn!(chain = %chain.slug, "no client for chain, skipping");
                continue;
            };
            let feed = ChainFeed {
                chain: Arc::new(chain.clone()),
                addresses: usable.into(),
                registry: Arc::clone(&self.registry),
                client: client.clone(),
                ctx: ctx.child(),
            };
            ctx.spawn(start_chain(feed));
        }

        ctx.close();
        ctx.handle()
    }

    /// Reads the current balance of one token for one address.
    ///
    /// `token` defaults to the chain's native asset. The query subscribes,
    /// resolves with the first `ready` item of the token and cancels the
    /// subscription.
    ///
    /// # Errors
    ///
    /// - [`QueryError::UnknownToken`] if the chain cannot report `token`
    /// - [`QueryError::Timeout`] if nothing arrives within
    ///   [`AggregatorConfig::query_timeout`]
    /// - [`QueryError::Closed`] if every feed stopped first, e.g. because
    ///   setup failed
    pub async fn token_free_balance(
        &self,
        address: &str,
        chain: &ChainDescriptor,
        client: &ChainClient,
        token: Option<&str>,
    ) -> Result<BalanceItem, QueryError> {
        let asset = match token {
            Some(slug) => self
                .registry
                .assets(&chain.slug, &AssetKind::FUNGIBLE)
                .into_iter()
                .find(|a| a.slug == slug),
            None => self.registry.native_asset(&chain.slug),
        }
        .filter(|asset| strategy::classify(chain, asset).is_some())
        .ok_or_else(|| QueryError::UnknownToken {
            token: token.unwrap_or("native").to_owned(),
            chain: chain.slug.clone(),
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let wanted = asset.slug.clone();
        let sink = move |item: BalanceItem| {
            if item.token_slug == wanted && item.state == ItemState::Ready {
                let _ = tx.send(item);
            }
        };
        let clients = HashMap::from([(chain.slug.clone(), client.clone())]);
        let subscription =
            self.subscribe(&[address.to_owned()], std::slice::from_ref(chain), &clients, sink);

        let limit = self.config.query_timeout();
        let received = tokio::time::timeout(limit, rx.recv()).await;
        subscription.cancel();
        match received {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(QueryError::Closed(asset.slug)),
            Err(_) => Err(QueryError::Timeout {
                token: asset.slug,
                secs: limit.as_secs(),
            }),
        }
    }

    fn emit_zero(&self, chain: &ChainDescriptor, ctx: &FeedContext) {
        tracing::debug!(chain = %chain.slug, "no usable addresses, reporting zero balances");
        self.registry
            .assets(&chain.slug, &AssetKind::FUNGIBLE)
            .into_iter()
            .filter(|asset| strategy::classify(chain, asset).is_some())
            .for_each(|asset| ctx.emit(BalanceItem::ready(asset.slug, U256::ZERO, U256::ZERO)));
    }
}

/// Waits for the account-style client, then starts the chain's plan.
///
/// On EVM-only chains the contract feeds run in a child scope of the native
/// feed, so cancelling the native feed cancels them too.
async fn start_chain(feed: ChainFeed) {
    if let Some(api) = feed.client.substrate.clone() {
        match feed.ctx.or_cancelled(api.ready()).await {
            None => return,
            Some(Err(error)) => {
                tracing::warn!(chain = %feed.chain.slug, %error, "client not ready, chain skipped");
                return;
            }
            Some(Ok(())) => {}
        }
    }
    if feed.ctx.is_cancelled() {
        return;
    }

    let plan = strategy::plan(&feed.chain);
    let primary = feed.scoped(feed.ctx.child());
    let secondary_parent = if feed.chain.is_evm_only() {
        primary.ctx.clone()
    } else {
        feed.ctx.clone()
    };

    adapter::start(plan.primary, primary);
    for strategy in plan.secondary {
        adapter::start(strategy, feed.scoped(secondary_parent.child()));
    }
}
