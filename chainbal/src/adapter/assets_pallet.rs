use super::ChainFeed;
use crate::asset::AssetDescriptor;
use crate::error::AdapterError;
use crate::normalize;
use crate::strategy::Strategy;

/// Zk-bridged assets never reach this adapter; `classify` filters them out.
pub(super) fn start(feed: ChainFeed) {
    for asset in feed.assets(Strategy::AssetsPallet) {
        let slug = asset.slug.clone();
        feed.spawn_logged(Strategy::AssetsPallet, Some(slug), run(feed.clone(), asset));
    }
}

async fn run(feed: ChainFeed, asset: AssetDescriptor) -> Result<(), AdapterError> {
    let api = feed.substrate()?;
    let index = asset.asset_index()?;

    let accounts = api.subscribe_asset_accounts(index, &feed.addresses).await?;
    let Some(mut updates) = feed.ctx.attach(accounts) else {
        return Ok(());
    };

    while let Some(update) = updates.next().await {
        match update {
            Ok(records) => feed.emit_ready(&asset.slug, normalize::asset_accounts(&records)),
            Err(error) => {
                tracing::warn!(chain = %feed.chain.slug, asset = %asset.slug, %error, "asset update failed");
            }
        }
    }
    Ok(())
}
