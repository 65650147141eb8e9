use std::str::FromStr;

use alloy_primitives::{Address, U256};
use futures_util::future::try_join_all;

use super::ChainFeed;
use crate::asset::AssetDescriptor;
use crate::client::{ClientError, EvmApi};
use crate::error::AdapterError;
use crate::normalize::{self, Holdings};
use crate::strategy::Strategy;

/// One poll loop per token, so a stalled contract only stalls itself.
pub(super) fn start(feed: ChainFeed) {
    for asset in feed.assets(Strategy::EvmContract) {
        let slug = asset.slug.clone();
        feed.spawn_logged(Strategy::EvmContract, Some(slug), run(feed.clone(), asset));
    }
}

async fn run(feed: ChainFeed, asset: AssetDescriptor) -> Result<(), AdapterError> {
    let api = feed.evm()?;
    let contract = asset
        .metadata
        .contract_address
        .as_deref()
        .and_then(|a| Address::from_str(a.trim()).ok())
        .ok_or_else(|| AdapterError::invalid_asset(&asset.slug, "invalid contract address"))?;
    let owners = feed.evm_addresses();

    let mut ticker = feed.ctx.ticker(feed.ctx.config().token_interval());
    while ticker.tick().await {
        let poll = balance_of(api.as_ref(), contract, &owners);
        let Some(result) = feed.ctx.or_cancelled(poll).await else {
            break;
        };
        match result {
            Ok(free) => feed.emit_ready(&asset.slug, Holdings::unlocked(free)),
            Err(error) => {
                tracing::warn!(chain = %feed.chain.slug, asset = %asset.slug, %error, "token balance poll failed");
            }
        }
    }
    Ok(())
}

async fn balance_of(api: &dyn EvmApi, token: Address, owners: &[Address]) -> Result<U256, ClientError> {
    let balances = try_join_all(owners.iter().map(|owner| api.erc20_balance_of(token, *owner))).await?;
    Ok(normalize::summed(balances))
}
