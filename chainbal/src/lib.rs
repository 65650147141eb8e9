#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types and subscription engine for multi-chain balance aggregation.
//!
//! Given a set of account addresses and a registry of heterogeneous networks,
//! this crate decides per network and per asset which balance-retrieval
//! strategy applies, starts a live feed (push subscription or interval poll)
//! for each strategy, normalizes every chain-specific balance encoding into a
//! single [`BalanceItem`](balance::BalanceItem) shape, and streams the items to
//! a caller-supplied sink.
//!
//! # Overview
//!
//! ```ignore
//! use chainbal::aggregate::BalanceAggregator;
//!
//! let aggregator = BalanceAggregator::new(registry);
//! let subscription = aggregator.subscribe(&addresses, &chains, &clients, |item| {
//!     println!("{} free={} locked={}", item.token_slug, item.free, item.locked);
//! });
//!
//! // Later, from anywhere:
//! subscription.cancel();
//! subscription.closed().await;
//! ```
//!
//! # Modules
//!
//! - [`aggregate`] - The public entry point that fans out feeds per chain
//! - [`asset`] - Asset descriptors and kinds
//! - [`balance`] - The normalized output model and sink trait
//! - [`chain`] - Chain descriptors and address-family partitioning
//! - [`client`] - Interfaces of the live chain clients consumed by the adapters
//! - [`config`] - Poll cadence and contract-call limits
//! - [`lifecycle`] - Cancellation handle shared by every feed
//! - [`normalize`] - Pure conversions from raw chain records into balances
//! - [`registry`] - Read-only chain/asset lookup
//! - [`strategy`] - Retrieval strategy classifier
//! - [`transfer`] - Transfer route classifier and transaction status machine

pub mod aggregate;
pub mod asset;
pub mod balance;
pub mod chain;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod normalize;
pub mod registry;
pub mod strategy;
pub mod timestamp;
pub mod transfer;

mod adapter;

#[cfg(test)]
mod testing;
