//! Transfer route classification and submitted-transaction tracking.
//!
//! Shares the dispatch pattern of the balance feeds: the transfer method is
//! derived from the same strategy classifier, so an asset is always moved by
//! the module that reports its balance. Balance effects of a transfer are
//! observed through the next balance emission.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asset::AssetDescriptor;
use crate::chain::ChainDescriptor;
use crate::strategy::{self, Strategy};

/// Errors raised while routing a transfer or tracking its status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The asset does not live on the origin chain.
    #[error("asset `{asset}` does not live on chain `{chain}`")]
    AssetNotOnChain {
        /// Asset slug.
        asset: String,
        /// Origin chain slug.
        chain: String,
    },
    /// The asset cannot be transferred on its chain.
    #[error("asset `{0}` is not transferable")]
    NotTransferable(String),
    /// No cross-chain channel exists between the two chains.
    #[error("no cross-chain route from `{origin}` to `{destination}`")]
    NoCrossChainRoute {
        /// Origin chain slug.
        origin: String,
        /// Destination chain slug.
        destination: String,
    },
    /// A status update that the transaction lifecycle does not allow.
    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition {
        /// Current status.
        from: TxStatus,
        /// Rejected next status.
        to: TxStatus,
    },
}

/// Chain-specific way of moving an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMethod {
    /// `balances.transfer` on the system pallet.
    NativePallet,
    /// `tokens.transfer` / `currencies.transfer`.
    TokensPallet,
    /// `assets.transfer`.
    AssetsPallet,
    /// Custom ledger transfer call.
    CustomLedger,
    /// Plain EVM value transfer.
    EvmNative,
    /// ERC-20 `transfer`.
    EvmContract,
    /// PSP-22 `transfer`.
    WasmContract,
}

impl From<Strategy> for TransferMethod {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::NativePallet => Self::NativePallet,
            Strategy::TokensPallet { .. } => Self::TokensPallet,
            Strategy::AssetsPallet => Self::AssetsPallet,
            Strategy::CustomLedger => Self::CustomLedger,
            Strategy::EvmNative => Self::EvmNative,
            Strategy::EvmContract => Self::EvmContract,
            Strategy::WasmContract => Self::WasmContract,
        }
    }
}

/// Same-chain or cross-chain delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TransferRoute {
    /// Sender and recipient are on the origin chain.
    SameChain,
    /// Delivered to another chain through cross-chain messaging.
    CrossChain {
        /// Destination chain slug.
        destination: String,
    },
}

/// How a transfer will be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPlan {
    /// Call used on the origin chain.
    pub method: TransferMethod,
    /// Delivery route.
    pub route: TransferRoute,
}

/// Which transfer calls an asset supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSupport {
    /// A partial amount can be sent.
    pub transfer: bool,
    /// The whole balance can be swept.
    pub transfer_all: bool,
}

impl TransferSupport {
    const ALL: Self = Self {
        transfer: true,
        transfer_all: true,
    };
    const NONE: Self = Self {
        transfer: false,
        transfer_all: false,
    };
}

/// Reports whether `asset` can be transferred on `chain`.
///
/// EVM-compatible chains support every asset they report. Zk-bridged assets
/// and custom-ledger assets cannot be transferred.
#[must_use]
pub fn transfer_support(chain: &ChainDescriptor, asset: &AssetDescriptor) -> TransferSupport {
    let Some(strategy) = strategy::classify(chain, asset) else {
        return TransferSupport::NONE;
    };
    if chain.is_evm_compatible() {
        return TransferSupport::ALL;
    }
    if asset.metadata.zk_bridged || strategy == Strategy::CustomLedger {
        return TransferSupport::NONE;
    }
    TransferSupport::ALL
}

/// Picks the method and route of a transfer of `asset` from `origin`.
///
/// `destination` is `None` (or the origin itself) for same-chain transfers.
/// Cross-chain routes require both chains to be account-style.
///
/// # Errors
///
/// Fails if the asset is not on `origin`, is not transferable there, or no
/// cross-chain route exists.
pub fn classify_transfer(
    origin: &ChainDescriptor,
    destination: Option<&ChainDescriptor>,
    asset: &AssetDescriptor,
) -> Result<TransferPlan, TransferError> {
    if asset.origin_chain != origin.slug {
        return Err(TransferError::AssetNotOnChain {
            asset: asset.slug.clone(),
            chain: origin.slug.clone(),
        });
    }
    let strategy = strategy::classify(origin, asset)
        .filter(|_| transfer_support(origin, asset).transfer)
        .ok_or_else(|| TransferError::NotTransferable(asset.slug.clone()))?;

    let route = match destination {
        None => TransferRoute::SameChain,
        Some(dest) if dest.slug == origin.slug => TransferRoute::SameChain,
        Some(dest) if origin.substrate.is_some() && dest.substrate.is_some() => {
            TransferRoute::CrossChain {
                destination: dest.slug.clone(),
            }
        }
        Some(dest) => {
            return Err(TransferError::NoCrossChainRoute {
                origin: origin.slug.clone(),
                destination: dest.slug.clone(),
            });
        }
    };

    Ok(TransferPlan {
        method: strategy.into(),
        route,
    })
}

/// Status of a submitted transaction.
///
/// `ready -> broadcast -> in_block -> (success | failed) -> finalized`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Signed, not yet sent.
    Ready,
    /// Sent to the network.
    Broadcast,
    /// Included in a block.
    InBlock,
    /// Executed successfully.
    Success,
    /// Executed with an error.
    Failed,
    /// The including block is final.
    Finalized,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ready => "ready",
            Self::Broadcast => "broadcast",
            Self::InBlock => "in_block",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

impl TxStatus {
    /// Returns `true` if `next` may follow `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Ready, Self::Broadcast)
                | (Self::Broadcast, Self::InBlock)
                | (Self::InBlock, Self::Success | Self::Failed)
                | (Self::Success | Self::Failed, Self::Finalized)
        )
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::IllegalTransition`] if `next` may not follow
    /// the current status.
    pub fn advance(self, next: Self) -> Result<Self, TransferError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(TransferError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns `true` once no further status can follow.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized)
    }
}
