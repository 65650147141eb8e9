#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM balance reads for the `chainbal` aggregation engine.
//!
//! Provides an alloy-backed implementation of [`chainbal::client::EvmApi`]
//! plus descriptors of well-known EVM networks.
//!
//! # Modules
//!
//! - [`contract`] - `sol!` bindings for the ERC-20 balance surface
//! - [`provider`] - [`AlloyEvmClient`] and the throttled fallback RPC client
//! - [`networks`] - Known EVM chains and their USDC deployments
//!
//! # Example
//!
//! ```ignore
//! use chainbal::client::ChainClient;
//! use chainbal_evm::AlloyEvmClient;
//!
//! let evm = AlloyEvmClient::http(1, &[(url, Some(25))])?;
//! let client = ChainClient::evm(std::sync::Arc::new(evm));
//! ```

pub mod contract;
pub mod networks;
pub mod provider;

pub use networks::{KNOWN_NETWORKS, KnownNetwork};
pub use provider::{AlloyEvmClient, EvmClientError};
