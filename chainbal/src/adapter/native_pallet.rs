use alloy_primitives::U256;

use super::ChainFeed;
use crate::client::{ClientError, SubstrateApi};
use crate::error::AdapterError;
use crate::normalize;
use crate::strategy::Strategy;

pub(super) fn start(feed: ChainFeed) {
    feed.spawn_logged(Strategy::NativePallet, None, run(feed.clone()));
}

async fn run(feed: ChainFeed) -> Result<(), AdapterError> {
    let api = feed.substrate()?;
    let Some(native) = feed.registry.native_asset(&feed.chain.slug) else {
        tracing::debug!(chain = %feed.chain.slug, "chain has no native asset");
        return Ok(());
    };

    let accounts = api.subscribe_accounts(&feed.addresses).await?;
    let Some(mut updates) = feed.ctx.attach(accounts) else {
        return Ok(());
    };

    while let Some(update) = updates.next().await {
        let records = match update {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(chain = %feed.chain.slug, asset = %native.slug, %error, "account update failed");
                continue;
            }
        };
        let pooled = if feed.chain.tracks_pooled_staking() {
            let Some(pooled) = feed.ctx.or_cancelled(pooled_stake(&feed, api.as_ref())).await
            else {
                break;
            };
            pooled
        } else {
            U256::ZERO
        };
        feed.emit_ready(&native.slug, normalize::system_accounts(&records, pooled));
    }
    Ok(())
}

/// Best-effort pooled-staking lookup; any failure counts as zero.
async fn pooled_stake(feed: &ChainFeed, api: &dyn SubstrateApi) -> U256 {
    match api.pool_members(&feed.addresses).await {
        Ok(members) => normalize::pooled_stake(&members),
        Err(ClientError::Unsupported(query)) => {
            tracing::debug!(chain = %feed.chain.slug, query, "pooled staking not available");
            U256::ZERO
        }
        Err(error) => {
            tracing::warn!(chain = %feed.chain.slug, %error, "pooled staking lookup failed");
            U256::ZERO
        }
    }
}
