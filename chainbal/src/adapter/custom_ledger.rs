use super::ChainFeed;
use crate::client::ClientError;
use crate::error::AdapterError;
use crate::normalize::{self, LedgerRecord};
use crate::strategy::Strategy;

pub(super) fn start(feed: ChainFeed) {
    feed.spawn_logged(Strategy::CustomLedger, None, run(feed.clone()));
}

async fn run(feed: ChainFeed) -> Result<(), AdapterError> {
    let api = feed.substrate()?;

    let mut assets = Vec::new();
    for asset in feed.assets(Strategy::CustomLedger) {
        match asset.ledger_id() {
            Ok(id) => assets.push((asset.slug, id)),
            Err(error) => tracing::warn!(chain = %feed.chain.slug, %error, "skipping ledger asset"),
        }
    }
    if assets.is_empty() {
        return Ok(());
    }

    let accounts = api.subscribe_ledger_accounts(&feed.addresses).await?;
    let Some(mut updates) = feed.ctx.attach(accounts) else {
        return Ok(());
    };

    while let Some(update) = updates.next().await {
        let records = update.and_then(|raw| {
            raw.iter()
                .map(|r| LedgerRecord::parse(r))
                .collect::<Result<Vec<_>, ClientError>>()
        });
        match records {
            Ok(records) => {
                for (slug, id) in &assets {
                    feed.emit_ready(slug, normalize::ledger_balance(&records, *id));
                }
            }
            Err(error) => {
                tracing::warn!(chain = %feed.chain.slug, %error, "ledger update skipped");
            }
        }
    }
    Ok(())
}
