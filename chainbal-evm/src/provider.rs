//! Alloy-backed [`EvmApi`] implementation.
//!
//! [`AlloyEvmClient`] wraps any [`Provider`]. [`AlloyEvmClient::http`] builds
//! one over HTTP endpoints, each behind a [`ThrottleLayer`], all behind a
//! [`FallbackLayer`] so a failing endpoint is routed around.

use std::num::NonZeroUsize;

use alloy_primitives::{Address, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_transport::layers::{FallbackLayer, ThrottleLayer};
use alloy_transport_http::Http;
use async_trait::async_trait;
use chainbal::client::{ClientError, EvmApi};
use tower::ServiceBuilder;
use url::Url;

use crate::contract::IERC20;

/// Errors raised while building an [`AlloyEvmClient`].
#[derive(Debug, thiserror::Error)]
pub enum EvmClientError {
    /// None of the configured endpoints is an HTTP(S) URL.
    #[error("no HTTP(S) RPC endpoint configured for chain {0}")]
    NoHttpEndpoints(u64),
}

/// EVM balance reader over an alloy provider.
#[derive(Debug, Clone)]
pub struct AlloyEvmClient<P> {
    chain_id: u64,
    provider: P,
}

impl<P: Provider> AlloyEvmClient<P> {
    /// Wraps an existing provider.
    pub const fn new(chain_id: u64, provider: P) -> Self {
        Self { chain_id, provider }
    }

    /// EIP-155 chain id this client reads from.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl AlloyEvmClient<RootProvider> {
    /// Builds a client over HTTP endpoints given as `(url, optional_rate_limit)`
    /// pairs. Non-HTTP(S) URLs are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EvmClientError::NoHttpEndpoints`] if no HTTP(S) endpoint remains.
    pub fn http(chain_id: u64, endpoints: &[(Url, Option<u32>)]) -> Result<Self, EvmClientError> {
        let client = rpc_client(chain_id, endpoints)?;
        Ok(Self::new(chain_id, RootProvider::new(client)))
    }
}

/// Creates a throttled, fallback RPC client from HTTP endpoints.
///
/// # Errors
///
/// Returns [`EvmClientError::NoHttpEndpoints`] if no HTTP(S) endpoint remains.
pub fn rpc_client(
    chain_id: u64,
    endpoints: &[(Url, Option<u32>)],
) -> Result<RpcClient, EvmClientError> {
    let transports = endpoints
        .iter()
        .filter_map(|(url, rate_limit)| {
            if !matches!(url.scheme(), "http" | "https") {
                tracing::warn!(chain_id, rpc_url = %url, "skipping non-HTTP RPC endpoint");
                return None;
            }
            tracing::info!(chain_id, rpc_url = %url, rate_limit = ?rate_limit, "using HTTP transport");
            let limit = rate_limit.unwrap_or(u32::MAX);
            Some(
                ServiceBuilder::new()
                    .layer(ThrottleLayer::new(limit))
                    .service(Http::new(url.clone())),
            )
        })
        .collect::<Vec<_>>();
    let count =
        NonZeroUsize::new(transports.len()).ok_or(EvmClientError::NoHttpEndpoints(chain_id))?;
    let fallback = ServiceBuilder::new()
        .layer(FallbackLayer::default().with_active_transport_count(count))
        .service(transports);
    Ok(RpcClient::new(fallback, false))
}

#[async_trait]
impl<P> EvmApi for AlloyEvmClient<P>
where
    P: Provider + Send + Sync,
{
    async fn native_balance(&self, address: Address) -> Result<U256, ClientError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn erc20_balance_of(&self, token: Address, owner: Address) -> Result<U256, ClientError> {
        IERC20::new(token, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
