//! The normalized balance model every adapter emits.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::timestamp::Timestamp;

/// Lifecycle state of a [`BalanceItem`].
///
/// For one asset within one session the state goes `pending -> ready` or
/// `ready -> ready`, never back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// A placeholder emitted before the first query completes.
    Pending,
    /// A fetched, authoritative balance.
    Ready,
}

/// Account-style breakdown of the locked amount.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstrateBreakdown {
    /// Reserved balance.
    #[serde_as(as = "DisplayFromStr")]
    pub reserved: U256,
    /// Misc-frozen balance.
    #[serde_as(as = "DisplayFromStr")]
    pub misc_frozen: U256,
    /// Fee-frozen balance.
    #[serde_as(as = "DisplayFromStr")]
    pub fee_frozen: U256,
}

/// One normalized balance update, summed over every queried address.
///
/// Amounts are in the asset's smallest unit and serialize as decimal strings.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceItem {
    /// Slug of the asset.
    pub token_slug: String,
    /// Lifecycle state.
    pub state: ItemState,
    /// Transferable balance.
    #[serde_as(as = "DisplayFromStr")]
    pub free: U256,
    /// Balance that cannot be transferred.
    #[serde_as(as = "DisplayFromStr")]
    pub locked: U256,
    /// Breakdown of `locked`, on account-style chains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substrate_info: Option<SubstrateBreakdown>,
    /// Emission time.
    pub timestamp: Timestamp,
}

impl BalanceItem {
    /// Creates a `ready` item stamped with the current time.
    #[must_use]
    pub fn ready(token_slug: impl Into<String>, free: U256, locked: U256) -> Self {
        Self {
            token_slug: token_slug.into(),
            state: ItemState::Ready,
            free,
            locked,
            substrate_info: None,
            timestamp: Timestamp::now(),
        }
    }

    /// Creates a zeroed `pending` placeholder.
    #[must_use]
    pub fn pending(token_slug: impl Into<String>) -> Self {
        Self {
            state: ItemState::Pending,
            ..Self::ready(token_slug, U256::ZERO, U256::ZERO)
        }
    }

    /// Attaches an account-style breakdown.
    #[must_use]
    pub const fn with_breakdown(mut self, breakdown: SubstrateBreakdown) -> Self {
        self.substrate_info = Some(breakdown);
        self
    }

    /// Total balance (`free + locked`), saturating.
    #[must_use]
    pub fn total(&self) -> U256 {
        self.free.saturating_add(self.locked)
    }
}

/// Receiver of balance items.
///
/// Invoked concurrently from every feed, in no particular order across
/// assets. Implemented for any `Fn(BalanceItem) + Send + Sync` closure.
pub trait BalanceSink: Send + Sync + 'static {
    /// Delivers one item.
    fn emit(&self, item: BalanceItem);
}

impl<F> BalanceSink for F
where
    F: Fn(BalanceItem) + Send + Sync + 'static,
{
    fn emit(&self, item: BalanceItem) {
        self(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_amounts_serialize_as_decimal_strings() {
        let item = BalanceItem {
            timestamp: Timestamp::from_millis(1),
            ..BalanceItem::ready("polkadot-NATIVE-DOT", U256::from(135u64), U256::from(15u64))
        }
        .with_breakdown(SubstrateBreakdown {
            reserved: U256::from(10u64),
            misc_frozen: U256::from(5u64),
            fee_frozen: U256::ZERO,
        });
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "tokenSlug": "polkadot-NATIVE-DOT",
                "state": "ready",
                "free": "135",
                "locked": "15",
                "substrateInfo": {"reserved": "10", "miscFrozen": "5", "feeFrozen": "0"},
                "timestamp": 1
            })
        );
    }

    #[test]
    fn test_pending_placeholder_is_zero() {
        let item = BalanceItem::pending("ethereum-NATIVE-ETH");
        assert_eq!(item.state, ItemState::Pending);
        assert_eq!(item.total(), U256::ZERO);
        assert!(item.substrate_info.is_none());
    }

    #[test]
    fn test_closure_is_a_sink() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink = move |item: BalanceItem| captured.lock().unwrap().push(item.token_slug);
        sink.emit(BalanceItem::pending("a"));
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_owned()]);
    }
}
