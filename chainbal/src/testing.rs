//! Hand-written client mocks shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::{Notify, mpsc};

use crate::balance::BalanceItem;
use crate::client::{
    AccountBalance, AssetAccount, ClientError, EvmApi, Feed, PoolMember, SubstrateApi,
    TokenAccount, TokenKey,
};
use crate::config::Weight;

pub(crate) const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
pub(crate) const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
pub(crate) const EVM_A: &str = "0x5ba1e12693dc8f9c48aad8770482f4739beed696";
pub(crate) const EVM_B: &str = "0x9c3bf8e2b0c7a5f1de4b8e1a3c6f0d2e7b5a4c11";

/// A sink forwarding every item into an unbounded channel.
pub(crate) fn collector() -> (
    impl Fn(BalanceItem) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<BalanceItem>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = move |item: BalanceItem| {
        let _ = tx.send(item);
    };
    (sink, rx)
}

/// Emits `first` once, then stays open. Counts itself released on drop.
struct TrackedFeed<T> {
    inner: Feed<T>,
    released: Arc<AtomicUsize>,
}

impl<T> Stream for TrackedFeed<T> {
    type Item = Result<T, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<T> Drop for TrackedFeed<T> {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Account-style client serving fixed records.
#[derive(Default)]
pub(crate) struct MockSubstrate {
    accounts: Vec<AccountBalance>,
    pool_points: Option<u128>,
    token_accounts: Vec<TokenAccount>,
    failing_tokens: HashSet<String>,
    asset_accounts: Vec<Option<AssetAccount>>,
    ledger: Vec<String>,
    failing_pool_members: bool,
    contract_output: Option<Value>,
    pub(crate) gas_limits: Mutex<Vec<Weight>>,
    gate: Option<Arc<Notify>>,
    subscribe_called: Arc<Notify>,
    pub(crate) opened: Arc<AtomicUsize>,
    pub(crate) released: Arc<AtomicUsize>,
}

impl MockSubstrate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_accounts(mut self, accounts: Vec<AccountBalance>) -> Self {
        self.accounts = accounts;
        self
    }

    pub(crate) fn with_pool_points(mut self, points: u128) -> Self {
        self.pool_points = Some(points);
        self
    }

    pub(crate) fn with_token_accounts(mut self, records: Vec<TokenAccount>) -> Self {
        self.token_accounts = records;
        self
    }

    /// Makes the token subscription of asset id `id` fail.
    pub(crate) fn failing_token(mut self, id: &str) -> Self {
        self.failing_tokens.insert(id.to_owned());
        self
    }

    pub(crate) fn with_asset_accounts(mut self, records: Vec<Option<AssetAccount>>) -> Self {
        self.asset_accounts = records;
        self
    }

    pub(crate) fn with_ledger(mut self, records: Vec<String>) -> Self {
        self.ledger = records;
        self
    }

    /// Makes every pooled-staking lookup fail.
    pub(crate) fn failing_pool_members(mut self) -> Self {
        self.failing_pool_members = true;
        self
    }

    /// Raw output of every WASM `balanceOf` dry-run.
    pub(crate) fn with_contract_output(mut self, output: Value) -> Self {
        self.contract_output = Some(output);
        self
    }

    /// Holds `subscribe_accounts` until [`open_gate`](Self::open_gate).
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub(crate) fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub(crate) async fn wait_for_subscribe_call(&self) {
        self.subscribe_called.notified().await;
    }

    fn feed<T: Send + 'static>(&self, update: T) -> Feed<T> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        TrackedFeed {
            inner: stream::iter([Ok(update)]).chain(stream::pending()).boxed(),
            released: Arc::clone(&self.released),
        }
        .boxed()
    }
}

#[async_trait]
impl SubstrateApi for MockSubstrate {
    async fn ready(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn subscribe_accounts(
        &self,
        _addresses: &[String],
    ) -> Result<Feed<Vec<AccountBalance>>, ClientError> {
        self.subscribe_called.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.feed(self.accounts.clone()))
    }

    async fn pool_members(
        &self,
        addresses: &[String],
    ) -> Result<Vec<Option<PoolMember>>, ClientError> {
        if self.failing_pool_members {
            return Err(ClientError::Transport("pool members unavailable".to_owned()));
        }
        let member = self.pool_points.map(|points| PoolMember {
            points,
            unbonding_eras: Default::default(),
        });
        Ok(vec![member; addresses.len()])
    }

    async fn subscribe_token_accounts(
        &self,
        _addresses: &[String],
        key: &TokenKey,
    ) -> Result<Feed<Vec<TokenAccount>>, ClientError> {
        if let TokenKey::AssetId(id) = key {
            if self.failing_tokens.contains(id) {
                return Err(ClientError::Transport(format!("no such currency {id}")));
            }
        }
        Ok(self.feed(self.token_accounts.clone()))
    }

    async fn subscribe_asset_accounts(
        &self,
        _asset_index: u128,
        _addresses: &[String],
    ) -> Result<Feed<Vec<Option<AssetAccount>>>, ClientError> {
        Ok(self.feed(self.asset_accounts.clone()))
    }

    async fn subscribe_ledger_accounts(
        &self,
        _addresses: &[String],
    ) -> Result<Feed<Vec<String>>, ClientError> {
        Ok(self.feed(self.ledger.clone()))
    }

    async fn wasm_balance_of(
        &self,
        _contract: &str,
        _owner: &str,
        gas_limit: Weight,
    ) -> Result<Option<Value>, ClientError> {
        self.gas_limits.lock().unwrap().push(gas_limit);
        Ok(Some(
            self.contract_output
                .clone()
                .unwrap_or_else(|| serde_json::json!({"ok": 1})),
        ))
    }
}

/// EVM client backed by a balance map.
#[derive(Default)]
pub(crate) struct MockEvm {
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    failing_tokens: HashSet<Address>,
    hanging_tokens: HashSet<Address>,
    hanging_native: bool,
    pub(crate) native_calls: AtomicUsize,
    pub(crate) token_calls: AtomicUsize,
}

impl MockEvm {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_native_balance(mut self, owner: &str, amount: u64) -> Self {
        self.native.insert(parse(owner), U256::from(amount));
        self
    }

    pub(crate) fn with_token_balance(mut self, token: &str, owner: &str, amount: u64) -> Self {
        self.tokens
            .insert((parse(token), parse(owner)), U256::from(amount));
        self
    }
}

impl MockEvm {
    /// Makes every `balanceOf` call on `token` fail.
    pub(crate) fn failing_token(mut self, token: &str) -> Self {
        self.failing_tokens.insert(parse(token));
        self
    }

    /// Makes every `balanceOf` call on `token` never return.
    pub(crate) fn hanging_token(mut self, token: &str) -> Self {
        self.hanging_tokens.insert(parse(token));
        self
    }

    /// Makes every native-balance call never return.
    pub(crate) fn hanging_native(mut self) -> Self {
        self.hanging_native = true;
        self
    }
}

fn parse(address: &str) -> Address {
    Address::from_str(address).unwrap()
}

#[async_trait]
impl EvmApi for MockEvm {
    async fn native_balance(&self, address: Address) -> Result<U256, ClientError> {
        self.native_calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging_native {
            std::future::pending::<()>().await;
        }
        Ok(self.native.get(&address).copied().unwrap_or_default())
    }

    async fn erc20_balance_of(&self, token: Address, owner: Address) -> Result<U256, ClientError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging_tokens.contains(&token) {
            std::future::pending::<()>().await;
        }
        if self.failing_tokens.contains(&token) {
            return Err(ClientError::Transport(format!("execution reverted on {token}")));
        }
        Ok(self.tokens.get(&(token, owner)).copied().unwrap_or_default())
    }
}
