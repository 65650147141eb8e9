use alloy_primitives::U256;
use futures_util::future::try_join_all;

use super::ChainFeed;
use crate::asset::AssetDescriptor;
use crate::client::{ClientError, SubstrateApi};
use crate::config::Weight;
use crate::error::AdapterError;
use crate::normalize::{self, Holdings};
use crate::strategy::Strategy;

/// One dry-run poll loop per contract token.
pub(super) fn start(feed: ChainFeed) {
    for asset in feed.assets(Strategy::WasmContract) {
        let slug = asset.slug.clone();
        feed.spawn_logged(Strategy::WasmContract, Some(slug), run(feed.clone(), asset));
    }
}

async fn run(feed: ChainFeed, asset: AssetDescriptor) -> Result<(), AdapterError> {
    let api = feed.substrate()?;
    let contract = asset
        .metadata
        .contract_address
        .clone()
        .ok_or_else(|| AdapterError::invalid_asset(&asset.slug, "no contract address"))?;
    let gas_limit = feed.ctx.config().wasm_gas_limit;

    let mut ticker = feed.ctx.ticker(feed.ctx.config().token_interval());
    while ticker.tick().await {
        let poll = balance_of(api.as_ref(), &contract, &feed.addresses, gas_limit);
        let Some(result) = feed.ctx.or_cancelled(poll).await else {
            break;
        };
        match result {
            Ok(free) => feed.emit_ready(&asset.slug, Holdings::unlocked(free)),
            Err(error) => {
                tracing::warn!(chain = %feed.chain.slug, asset = %asset.slug, %error, "contract balance poll failed");
            }
        }
    }
    Ok(())
}

async fn balance_of(
    api: &dyn SubstrateApi,
    contract: &str,
    owners: &[String],
    gas_limit: Weight,
) -> Result<U256, ClientError> {
    let outputs = try_join_all(
        owners
            .iter()
            .map(|owner| api.wasm_balance_of(contract, owner, gas_limit)),
    )
    .await?;
    let amounts = outputs
        .iter()
        .map(|output| normalize::contract_output(output.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize::summed(amounts))
}
