//! Pure conversions from raw chain records into normalized balances.
//!
//! Every function sums over all queried addresses and returns [`Holdings`].
//! `free` is clamped at zero whenever the locked amount exceeds the total;
//! [`Holdings::clamped`] reports when that happened so callers can log it.

use alloy_primitives::U256;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::balance::{BalanceItem, SubstrateBreakdown};
use crate::client::{AccountBalance, AssetAccount, ClientError, PoolMember, TokenAccount};

/// A normalized balance not yet bound to an asset slug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Holdings {
    /// Transferable amount.
    pub free: U256,
    /// Non-transferable amount.
    pub locked: U256,
    /// Account-style breakdown of `locked`.
    pub breakdown: Option<SubstrateBreakdown>,
    /// Set when `free` was clamped because `locked` exceeded the total.
    pub clamped: bool,
}

impl Holdings {
    /// Holdings with nothing locked.
    #[must_use]
    pub const fn unlocked(free: U256) -> Self {
        Self {
            free,
            locked: U256::ZERO,
            breakdown: None,
            clamped: false,
        }
    }

    /// Derives `free = max(total - locked, 0)`.
    #[must_use]
    pub fn from_total(total: U256, locked: U256) -> Self {
        let (free, clamped) = match total.checked_sub(locked) {
            Some(free) => (free, false),
            None => (U256::ZERO, true),
        };
        Self {
            free,
            locked,
            breakdown: None,
            clamped,
        }
    }

    /// Total before clamping would have applied, i.e. `free + locked`.
    #[must_use]
    pub fn total(&self) -> U256 {
        self.free.saturating_add(self.locked)
    }

    #[must_use]
    const fn with_breakdown(mut self, breakdown: SubstrateBreakdown) -> Self {
        self.breakdown = Some(breakdown);
        self
    }

    /// Binds the holdings to an asset as a `ready` item.
    #[must_use]
    pub fn into_item(self, token_slug: impl Into<String>) -> BalanceItem {
        let item = BalanceItem::ready(token_slug, self.free, self.locked);
        match self.breakdown {
            Some(breakdown) => item.with_breakdown(breakdown),
            None => item,
        }
    }
}

fn sum(values: impl IntoIterator<Item = u128>) -> U256 {
    values
        .into_iter()
        .fold(U256::ZERO, |acc, v| acc.saturating_add(U256::from(v)))
}

/// Native-pallet accounts plus pooled stake.
///
/// `locked = reserved + misc_frozen + pooled`, `total = free + reserved + pooled`.
/// `misc_frozen` falls back to `frozen` on runtimes that merged the two.
#[must_use]
pub fn system_accounts(records: &[AccountBalance], pooled: U256) -> Holdings {
    let free = sum(records.iter().map(|r| r.free.unwrap_or_default()));
    let reserved = sum(records.iter().map(|r| r.reserved.unwrap_or_default()));
    let misc_frozen = sum(
        records
            .iter()
            .map(|r| r.misc_frozen.or(r.frozen).unwrap_or_default()),
    );
    let fee_frozen = sum(records.iter().map(|r| r.fee_frozen.unwrap_or_default()));

    let locked = reserved.saturating_add(misc_frozen).saturating_add(pooled);
    let total = free.saturating_add(reserved).saturating_add(pooled);

    Holdings::from_total(total, locked).with_breakdown(SubstrateBreakdown {
        reserved,
        misc_frozen,
        fee_frozen,
    })
}

/// Pool points plus every unbonding amount, over all members.
#[must_use]
pub fn pooled_stake(members: &[Option<PoolMember>]) -> U256 {
    sum(members.iter().flatten().flat_map(|m| {
        std::iter::once(m.points).chain(m.unbonding_eras.values().copied())
    }))
}

/// Generic token-pallet accounts, whose `free` field is the total balance.
#[must_use]
pub fn token_accounts(records: &[TokenAccount]) -> Holdings {
    let total = sum(records.iter().map(|r| r.free));
    let reserved = sum(records.iter().map(|r| r.reserved));
    let frozen = sum(records.iter().map(|r| r.frozen));

    let mut holdings = Holdings::from_total(total, frozen).with_breakdown(SubstrateBreakdown {
        reserved,
        misc_frozen: frozen,
        fee_frozen: U256::ZERO,
    });
    holdings.locked = frozen.saturating_add(reserved);
    holdings
}

/// Asset-index pallet accounts. Absent accounts contribute nothing.
#[must_use]
pub fn asset_accounts(records: &[Option<AssetAccount>]) -> Holdings {
    let (frozen, liquid): (Vec<&AssetAccount>, Vec<&AssetAccount>) = records.iter().flatten().partition(|a| a.is_frozen);
    let frozen = sum(frozen.into_iter().map(|a| a.balance));
    let total = sum(liquid.into_iter().map(|a| a.balance));

    Holdings {
        free: total,
        locked: frozen,
        breakdown: Some(SubstrateBreakdown {
            reserved: U256::ZERO,
            misc_frozen: frozen,
            fee_frozen: U256::ZERO,
        }),
        clamped: false,
    }
}

/// A signed amount inside a custom-ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignedAmount {
    /// A credit.
    Positive(Amount),
    /// A debt; never counted as balance.
    Negative(Amount),
}

/// An unsigned integer that tolerates the encodings nodes actually emit:
/// JSON integers, floats, and decimal or `0x` strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Amount(pub U256);

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a non-negative integer or integer string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount(U256::from(v)))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(Amount(U256::from(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u64::try_from(v)
                    .map(|v| Amount(U256::from(v)))
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                if !v.is_finite() || v < 0.0 {
                    return Err(E::invalid_value(de::Unexpected::Float(v), &self));
                }
                // Large ledger values arrive as floats; the integer part is kept.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let truncated = v.trunc() as u128;
                Ok(Amount(U256::from(truncated)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                let cleaned = v.trim().replace(',', "");
                cleaned
                    .parse::<U256>()
                    .map(Amount)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Decoded custom-ledger account record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum LedgerRecord {
    /// Version 0 layout.
    #[serde(rename = "v0")]
    V0 {
        /// Locked amount; not reported.
        #[serde(default)]
        lock: Amount,
        /// `(asset id, signed amount)` pairs.
        #[serde(default)]
        balance: Vec<(Amount, SignedAmount)>,
    },
}

impl LedgerRecord {
    /// Decodes one record payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the payload is not a ledger record.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        serde_json::from_str(raw).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Positive balance of `asset_id`; a miss or a negative entry is zero.
    #[must_use]
    pub fn positive_balance(&self, asset_id: u64) -> U256 {
        let Self::V0 { balance, .. } = self;
        let wanted = U256::from(asset_id);
        balance
            .iter()
            .find(|(id, _)| id.0 == wanted)
            .map_or(U256::ZERO, |(_, amount)| match amount {
                SignedAmount::Positive(a) => a.0,
                SignedAmount::Negative(_) => U256::ZERO,
            })
    }
}

/// Sum of the positive balances of `asset_id` across records. `locked` is
/// always zero.
#[must_use]
pub fn ledger_balance(records: &[LedgerRecord], asset_id: u64) -> Holdings {
    let free = records
        .iter()
        .map(|r| r.positive_balance(asset_id))
        .fold(U256::ZERO, U256::saturating_add);
    Holdings::unlocked(free)
}

/// Unwraps a WASM `balanceOf` output from its `ok`/`Ok` envelope.
///
/// Missing output or a missing envelope counts as zero.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if the unwrapped value is not an amount.
pub fn contract_output(output: Option<&Value>) -> Result<U256, ClientError> {
    let Some(inner) = output.and_then(|o| o.get("ok").or_else(|| o.get("Ok"))) else {
        return Ok(U256::ZERO);
    };
    if inner.is_null() {
        return Ok(U256::ZERO);
    }
    Amount::deserialize(inner)
        .map(|a| a.0)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Sums amounts from several addresses.
#[must_use]
pub fn summed(amounts: impl IntoIterator<Item = U256>) -> U256 {
    amounts.into_iter().fold(U256::ZERO, U256::saturating_add)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use serde_json::json;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn test_system_accounts_two_addresses() {
        let records = [
            AccountBalance {
                free: Some(100),
                reserved: Some(10),
                misc_frozen: Some(5),
                ..AccountBalance::default()
            },
            AccountBalance {
                free: Some(50),
                ..AccountBalance::default()
            },
        ];
        let holdings = system_accounts(&records, U256::ZERO);
        assert_eq!(holdings.locked, u(15));
        // total = free + reserved = 160
        assert_eq!(holdings.free, u(145));
        assert!(!holdings.clamped);
        let breakdown = holdings.breakdown.unwrap();
        assert_eq!(breakdown.reserved, u(10));
        assert_eq!(breakdown.misc_frozen, u(5));
    }

    #[test]
    fn test_system_accounts_frozen_fallback_and_pooled() {
        let records = [AccountBalance {
            free: Some(40),
            frozen: Some(30),
            ..AccountBalance::default()
        }];
        let holdings = system_accounts(&records, u(20));
        assert_eq!(holdings.locked, u(50));
        assert_eq!(holdings.free, u(10));
    }

    #[test]
    fn test_free_never_negative() {
        let records = [AccountBalance {
            free: Some(1),
            reserved: Some(2),
            misc_frozen: Some(500),
            ..AccountBalance::default()
        }];
        let holdings = system_accounts(&records, U256::ZERO);
        assert_eq!(holdings.free, U256::ZERO);
        assert!(holdings.clamped);

        let tokens = token_accounts(&[TokenAccount {
            free: 10,
            reserved: 3,
            frozen: 20,
        }]);
        assert_eq!(tokens.free, U256::ZERO);
        assert_eq!(tokens.locked, u(23));
        assert!(tokens.clamped);
    }

    #[test]
    fn test_pooled_stake_includes_unbonding() {
        let members = [
            Some(PoolMember {
                points: 100,
                unbonding_eras: BTreeMap::from([(1, 5), (2, 7)]),
            }),
            None,
        ];
        assert_eq!(pooled_stake(&members), u(112));
    }

    #[test]
    fn test_token_accounts_free_is_total_minus_frozen() {
        let holdings = token_accounts(&[
            TokenAccount {
                free: 100,
                reserved: 10,
                frozen: 30,
            },
            TokenAccount {
                free: 20,
                reserved: 0,
                frozen: 0,
            },
        ]);
        assert_eq!(holdings.free, u(90));
        assert_eq!(holdings.locked, u(40));
        assert_eq!(holdings.breakdown.unwrap().misc_frozen, u(30));
    }

    #[test]
    fn test_asset_accounts_split_frozen() {
        let holdings = asset_accounts(&[
            Some(AssetAccount {
                balance: 70,
                is_frozen: false,
            }),
            None,
            Some(AssetAccount {
                balance: 30,
                is_frozen: true,
            }),
        ]);
        assert_eq!(holdings.free, u(70));
        assert_eq!(holdings.locked, u(30));
    }

    #[test]
    fn test_ledger_lookup() {
        let raw = json!({"v0": {"lock": 0, "balance": [[7, {"positive": 100}], [9, {"positive": 5}]]}})
            .to_string();
        let record = LedgerRecord::parse(&raw).unwrap();
        let records = [record];

        let nine = ledger_balance(&records, 9);
        assert_eq!(nine.free, u(5));
        assert_eq!(nine.locked, U256::ZERO);
        assert_eq!(ledger_balance(&records, 42).free, U256::ZERO);
    }

    #[test]
    fn test_ledger_negative_and_string_amounts() {
        let raw = r#"{"v0":{"lock":"12","balance":[[1,{"negative":50}],[2,{"positive":"1000000000000000000000"}]]}}"#;
        let record = LedgerRecord::parse(raw).unwrap();
        assert_eq!(record.positive_balance(1), U256::ZERO);
        assert_eq!(
            record.positive_balance(2),
            "1000000000000000000000".parse::<U256>().unwrap()
        );
    }

    #[test]
    fn test_ledger_undecodable() {
        assert!(matches!(
            LedgerRecord::parse(r#"{"v1":{}}"#),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn test_contract_output_envelopes() {
        assert_eq!(contract_output(Some(&json!({"ok": 42}))).unwrap(), u(42));
        assert_eq!(contract_output(Some(&json!({"Ok": "7"}))).unwrap(), u(7));
        assert_eq!(contract_output(Some(&json!({"err": "x"}))).unwrap(), U256::ZERO);
        assert_eq!(contract_output(None).unwrap(), U256::ZERO);
        assert!(contract_output(Some(&json!({"ok": "abc"}))).is_err());
    }
}
