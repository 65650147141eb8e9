//! Error types for registry validation and feed setup.
//!
//! Client-side failures live next to the client interfaces in
//! [`client::ClientError`](crate::client::ClientError); transfer routing has
//! its own [`TransferError`](crate::transfer::TransferError). [`QueryError`]
//! covers the one-shot balance query.

use crate::asset::AssetKind;
use crate::client::ClientError;

/// Errors raised while building or querying a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The chain carries neither an account-style nor an EVM descriptor.
    #[error("chain `{0}` has neither an account-style nor an EVM descriptor")]
    NoStack(String),

    /// An asset of a given kind lacks metadata that kind requires.
    #[error("asset `{slug}` of kind {kind} is missing `{field}`")]
    MissingMetadata {
        /// Slug of the offending asset.
        slug: String,
        /// Kind the asset was registered with.
        kind: AssetKind,
        /// Name of the missing metadata field.
        field: &'static str,
    },

    /// Two assets were registered under the same slug.
    #[error("duplicate asset slug `{0}`")]
    DuplicateAsset(String),

    /// An asset references a chain the registry does not know.
    #[error("asset `{asset}` references unknown chain `{chain}`")]
    UnknownChain {
        /// Slug of the offending asset.
        asset: String,
        /// Chain slug it points at.
        chain: String,
    },
}

/// Errors returned by a one-shot balance query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The token is not a fungible asset the chain can report.
    #[error("unknown token `{token}` on chain `{chain}`")]
    UnknownToken {
        /// Requested token slug, or `native`.
        token: String,
        /// Chain slug.
        chain: String,
    },

    /// No `ready` item arrived before the deadline.
    #[error("no balance for `{token}` within {secs}s")]
    Timeout {
        /// Token slug.
        token: String,
        /// Deadline in seconds.
        secs: u64,
    },

    /// Every feed of the chain stopped before reporting the token.
    #[error("balance feed for `{0}` ended without reporting")]
    Closed(String),
}

/// Errors that prevent a feed from being established.
///
/// These never reach the caller of the aggregator: they are logged at the
/// adapter boundary and the affected asset simply produces no items.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// No client of the required family was supplied for the chain.
    #[error("no {0} client registered for chain")]
    MissingClient(&'static str),

    /// The asset's metadata cannot be turned into an on-chain query key.
    #[error("asset `{asset}`: {reason}")]
    InvalidAsset {
        /// Slug of the offending asset.
        asset: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The remote client refused or failed the request.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AdapterError {
    pub(crate) fn invalid_asset(asset: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAsset {
            asset: asset.to_owned(),
            reason: reason.into(),
        }
    }
}
