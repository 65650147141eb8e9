use futures_util::future::try_join_all;

use super::ChainFeed;
use crate::balance::BalanceItem;
use crate::error::AdapterError;
use crate::normalize::{self, Holdings};
use crate::strategy::Strategy;

pub(super) fn start(feed: ChainFeed) {
    feed.spawn_logged(Strategy::EvmNative, None, run(feed.clone()));
}

async fn run(feed: ChainFeed) -> Result<(), AdapterError> {
    let api = feed.evm()?;
    let Some(native) = feed.registry.native_asset(&feed.chain.slug) else {
        tracing::debug!(chain = %feed.chain.slug, "chain has no native asset");
        return Ok(());
    };
    let addresses = feed.evm_addresses();

    feed.ctx.emit(BalanceItem::pending(&native.slug));

    let mut ticker = feed.ctx.ticker(feed.ctx.config().evm_native_interval());
    while ticker.tick().await {
        let queries = addresses.iter().map(|a| api.native_balance(*a));
        let Some(result) = feed.ctx.or_cancelled(try_join_all(queries)).await else {
            break;
        };
        match result {
            Ok(balances) => {
                feed.emit_ready(&native.slug, Holdings::unlocked(normalize::summed(balances)));
            }
            Err(error) => {
                tracing::warn!(chain = %feed.chain.slug, asset = %native.slug, %error, "native balance poll failed");
            }
        }
    }
    Ok(())
}
