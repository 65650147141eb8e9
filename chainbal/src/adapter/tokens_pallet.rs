use super::ChainFeed;
use crate::asset::AssetDescriptor;
use crate::error::AdapterError;
use crate::normalize;
use crate::strategy::Strategy;

/// One subscription per asset, each set up independently.
pub(super) fn start(feed: ChainFeed, strategy: Strategy) {
    for asset in feed.assets(strategy) {
        let slug = asset.slug.clone();
        feed.spawn_logged(strategy, Some(slug), run(feed.clone(), asset));
    }
}

async fn run(feed: ChainFeed, asset: AssetDescriptor) -> Result<(), AdapterError> {
    let api = feed.substrate()?;
    let key = asset.token_key()?;

    let accounts = api.subscribe_token_accounts(&feed.addresses, &key).await?;
    let Some(mut updates) = feed.ctx.attach(accounts) else {
        return Ok(());
    };

    while let Some(update) = updates.next().await {
        match update {
            Ok(records) => feed.emit_ready(&asset.slug, normalize::token_accounts(&records)),
            Err(error) => {
                tracing::warn!(chain = %feed.chain.slug, asset = %asset.slug, %error, "token update failed");
            }
        }
    }
    Ok(())
}
