//! Cancellation handle shared by every feed of one aggregation.
//!
//! All feeds hang off one root [`CancellationToken`] and are spawned onto one
//! [`TaskTracker`]. Cancelling the root stops poll loops and drops push
//! subscriptions; a setup that resolves after cancellation drops the feed it
//! just opened instead of attaching it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::balance::{BalanceItem, BalanceSink};
use crate::client::{ClientError, Feed};
use crate::config::AggregatorConfig;

/// Handle to a running aggregation.
///
/// [`cancel`](Self::cancel) is idempotent and may be called from any thread,
/// including before any feed finished its setup. Dropping the handle does not
/// cancel the feeds.
#[derive(Clone)]
pub struct BalanceSubscription {
    token: CancellationToken,
    tasks: TaskTracker,
}

impl std::fmt::Debug for BalanceSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceSubscription")
            .field("cancelled", &self.token.is_cancelled())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl BalanceSubscription {
    /// Stops every feed. Further calls are no-ops.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(tasks = self.tasks.len(), "cancelling balance subscription");
        }
        self.token.cancel();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once every feed task has exited and released its resources.
    ///
    /// Without a prior [`cancel`](Self::cancel) this only resolves when all
    /// feeds end on their own.
    pub async fn closed(&self) {
        self.tasks.wait().await;
    }

    /// Cancels and waits for [`closed`](Self::closed).
    pub async fn shutdown(&self) {
        self.cancel();
        self.closed().await;
    }
}

/// Per-feed view of the aggregation: its sink, its cancellation scope, and
/// the shared tracker and config.
#[derive(Clone)]
pub(crate) struct FeedContext {
    sink: Arc<dyn BalanceSink>,
    token: CancellationToken,
    tasks: TaskTracker,
    config: Arc<AggregatorConfig>,
}

impl FeedContext {
    pub(crate) fn new(sink: Arc<dyn BalanceSink>, config: AggregatorConfig) -> Self {
        Self {
            sink,
            token: CancellationToken::new(),
            tasks: TaskTracker::new(),
            config: Arc::new(config),
        }
    }

    /// The external handle of this context's scope.
    pub(crate) fn handle(&self) -> BalanceSubscription {
        BalanceSubscription {
            token: self.token.clone(),
            tasks: self.tasks.clone(),
        }
    }

    /// A nested scope, cancelled together with this one.
    pub(crate) fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            ..self.clone()
        }
    }

    pub(crate) fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawns a task onto the shared tracker.
    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Marks the end of top-level spawning; tasks may still spawn children.
    pub(crate) fn close(&self) {
        self.tasks.close();
    }

    /// Delivers an item unless the scope is already cancelled.
    pub(crate) fn emit(&self, item: BalanceItem) {
        if !self.token.is_cancelled() {
            self.sink.emit(item);
        }
    }

    /// Runs `fut` until it completes or the scope is cancelled.
    pub(crate) async fn or_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            output = fut => Some(output),
        }
    }

    /// Attaches a freshly opened feed, or drops it if the scope was cancelled
    /// while it was being opened.
    pub(crate) fn attach<T>(&self, feed: Feed<T>) -> Option<Updates<T>> {
        if self.token.is_cancelled() {
            drop(feed);
            return None;
        }
        Some(Updates {
            feed,
            token: self.token.clone(),
        })
    }

    /// A poll schedule bound to this scope. The first tick fires immediately.
    pub(crate) fn ticker(&self, period: Duration) -> Ticker {
        let mut interval = tokio::time::interval(period.max(MIN_POLL_PERIOD));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ticker {
            interval,
            token: self.token.clone(),
        }
    }
}

const MIN_POLL_PERIOD: Duration = Duration::from_secs(1);

/// An attached push feed. The feed is dropped with this value.
pub(crate) struct Updates<T> {
    feed: Feed<T>,
    token: CancellationToken,
}

impl<T> Updates<T> {
    /// Next update, or `None` once cancelled or the feed ended.
    pub(crate) async fn next(&mut self) -> Option<Result<T, ClientError>> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            update = self.feed.next() => update,
        }
    }
}

/// Fixed-period schedule that stops on cancellation.
pub(crate) struct Ticker {
    interval: Interval,
    token: CancellationToken,
}

impl Ticker {
    /// Waits for the next tick. Returns `false` once cancelled.
    pub(crate) async fn tick(&mut self) -> bool {
        tokio::select! {
            biased;
            () = self.token.cancelled() => false,
            _ = self.interval.tick() => !self.token.is_cancelled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn context() -> FeedContext {
        FeedContext::new(Arc::new(|_item: BalanceItem| {}), AggregatorConfig::default())
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let ctx = context();
        let handle = ctx.handle();
        for _ in 0..10 {
            handle.cancel();
        }
        assert!(handle.is_cancelled());
        assert!(ctx.child().is_cancelled());
    }

    #[tokio::test]
    async fn test_attach_after_cancel_drops_feed() {
        let ctx = context();
        ctx.handle().cancel();
        let feed: Feed<u32> = stream::iter([Ok(1)]).boxed();
        assert!(ctx.attach(feed).is_none());
    }

    #[tokio::test]
    async fn test_updates_stop_on_cancel() {
        let ctx = context();
        let feed: Feed<u32> = stream::iter([Ok(1)]).chain(stream::pending()).boxed();
        let mut updates = ctx.attach(feed).unwrap();
        assert_eq!(updates.next().await, Some(Ok(1)));
        ctx.handle().cancel();
        assert_eq!(updates.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_fires_immediately_then_stops() {
        let ctx = context();
        let mut ticker = ctx.ticker(Duration::from_secs(30));
        assert!(ticker.tick().await);
        assert!(ticker.tick().await);
        ctx.handle().cancel();
        assert!(!ticker.tick().await);
    }

    #[tokio::test]
    async fn test_closed_waits_for_tasks() {
        let ctx = context();
        let child = ctx.child();
        ctx.spawn(async move { child.token.cancelled().await });
        ctx.close();
        let handle = ctx.handle();
        handle.shutdown().await;
        assert!(handle.is_cancelled());
    }
}
