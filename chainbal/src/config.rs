//! Configuration for the aggregation engine.
//!
//! Every field has a default, so an empty document deserializes into
//! [`AggregatorConfig::default`].
//!
//! # Example
//!
//! ```rust
//! use chainbal::config::AggregatorConfig;
//!
//! let config: AggregatorConfig =
//!     serde_json::from_str(r#"{"evm_native_interval_secs": 10}"#).unwrap();
//! assert_eq!(config.evm_native_interval().as_secs(), 10);
//! assert_eq!(config.token_interval().as_secs(), 60);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gas limit of a WASM contract dry-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weight {
    /// Computation time component.
    pub ref_time: u64,
    /// Proof size component.
    pub proof_size: u64,
}

impl Default for Weight {
    fn default() -> Self {
        Self {
            ref_time: 4_999_999_999_999,
            proof_size: 1_000_000,
        }
    }
}

/// Poll cadence and contract-call limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Period of the EVM native-balance poll, in seconds.
    #[serde(default = "default_evm_native_interval")]
    pub evm_native_interval_secs: u64,

    /// Period of the EVM and WASM contract-token polls, in seconds.
    #[serde(default = "default_token_interval")]
    pub token_interval_secs: u64,

    /// Gas limit passed to WASM `balanceOf` dry-runs.
    #[serde(default)]
    pub wasm_gas_limit: Weight,

    /// How long a one-shot balance query waits for its first item, in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

const fn default_evm_native_interval() -> u64 {
    30
}

const fn default_token_interval() -> u64 {
    60
}

const fn default_query_timeout() -> u64 {
    10
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            evm_native_interval_secs: default_evm_native_interval(),
            token_interval_secs: default_token_interval(),
            wasm_gas_limit: Weight::default(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl AggregatorConfig {
    /// EVM native-balance poll period.
    #[must_use]
    pub const fn evm_native_interval(&self) -> Duration {
        Duration::from_secs(self.evm_native_interval_secs)
    }

    /// Contract-token poll period.
    #[must_use]
    pub const fn token_interval(&self) -> Duration {
        Duration::from_secs(self.token_interval_secs)
    }

    /// Deadline of [`token_free_balance`](crate::aggregate::BalanceAggregator::token_free_balance).
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AggregatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AggregatorConfig::default());
        assert_eq!(config.evm_native_interval(), Duration::from_secs(30));
        assert_eq!(config.wasm_gas_limit.proof_size, 1_000_000);
        assert_eq!(config.query_timeout(), Duration::from_secs(10));
    }
}
