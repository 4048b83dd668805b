//! # Rate Limiter
//!
//! Per-store dual-quota admission control for remote operations.
//!
//! ## Quota Dimensions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rate Limiter (one per store)                       │
//! │                                                                         │
//! │  submit(op) ──► FIFO queue ──► processor task                           │
//! │                 (VecDeque)         │                                    │
//! │                     ▲              ▼                                    │
//! │      retry re-enters│      ┌──────────────────────────────┐            │
//! │      at the FRONT   │      │ admission                    │            │
//! │      after backoff  │      │                              │            │
//! │                     │      │ REST: ≤ N call starts in any │            │
//! │                     │      │   trailing 1000ms window     │            │
//! │                     │      │   (+100ms safety buffer)     │            │
//! │                     │      │                              │            │
//! │                     │      │ GraphQL: ≤ P points per      │            │
//! │                     │      │   rolling 60s window; block  │            │
//! │                     │      │   until rollover, then zero  │            │
//! │                     │      │   the counter (+1s buffer)   │            │
//! │                     │      └──────────────┬───────────────┘            │
//! │                     │                     ▼                            │
//! │                     │              execute action                       │
//! │                     │                     │                             │
//! │                     │        ┌────────────┼────────────┐               │
//! │                     │        ▼            ▼            ▼                │
//! │                     │     success    retryable     terminal             │
//! │                     │     resolve    backoff =     reject               │
//! │                     └───── future    base·2^n      future               │
//! │                                                                         │
//! │  RETRY POLICY: 429 / 5xx / timeout / reset, at most max_retries + 1    │
//! │  total attempts. Everything else rejects immediately.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quota consumption is recorded when an execution *begins*, never
//! back-dated; a window reset zeroes the counter and restamps the window
//! start under the same lock readers take.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{oneshot, Mutex, Notify, RwLock};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Constants
// =============================================================================

/// Trailing window the REST call quota is measured over.
const REST_WINDOW: Duration = Duration::from_millis(1000);

/// Safety buffer added when waiting out a full REST window.
const REST_SAFETY_BUFFER: Duration = Duration::from_millis(100);

/// Rolling window the GraphQL point budget is measured over.
const GRAPHQL_WINDOW: Duration = Duration::from_secs(60);

/// Safety buffer added when waiting for a GraphQL window rollover.
const GRAPHQL_RESET_BUFFER: Duration = Duration::from_secs(1);

/// Pacing delay after each successful operation.
const PACING_DELAY: Duration = Duration::from_millis(100);

// =============================================================================
// Operations
// =============================================================================

/// Quota classification of a remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Counted against the calls-per-second window.
    Rest,
    /// Counted against the points-per-minute budget.
    Graphql,
}

type OperationAction =
    Box<dyn Fn() -> BoxFuture<'static, SyncResult<Value>> + Send + Sync + 'static>;

/// A unit of remote work: quota class, declared cost, and a re-executable
/// async action.
///
/// The action must be re-executable because a retried operation runs again
/// from scratch.
pub struct Operation {
    /// Quota dimension this operation consumes.
    pub kind: OperationKind,

    /// Declared cost in points (GraphQL only; REST operations cost 1 call).
    pub points: u32,

    action: OperationAction,
}

impl Operation {
    /// Creates a REST-classified operation.
    pub fn rest<F, Fut>(action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = SyncResult<Value>> + Send + 'static,
    {
        Operation {
            kind: OperationKind::Rest,
            points: 1,
            action: Box::new(move || Box::pin(action())),
        }
    }

    /// Creates a GraphQL-classified operation with a declared point cost.
    pub fn graphql<F, Fut>(points: u32, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = SyncResult<Value>> + Send + 'static,
    {
        Operation {
            kind: OperationKind::Graphql,
            points,
            action: Box::new(move || Box::pin(action())),
        }
    }

    fn execute(&self) -> BoxFuture<'static, SyncResult<Value>> {
        (self.action)()
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind)
            .field("points", &self.points)
            .finish()
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Rate limiter tuning.
///
/// Defaults are the multi-store values: conservative enough that several
/// stores syncing concurrently stay inside the account-level quotas.
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Maximum REST call starts in any trailing 1-second window.
    pub rest_calls_per_second: u32,

    /// Maximum GraphQL points per rolling 60-second window.
    pub graphql_points_per_minute: u32,

    /// Maximum retries after the first attempt.
    pub max_retries: u32,

    /// Base backoff delay; attempt n waits `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        LimiterConfig {
            rest_calls_per_second: 1,
            graphql_points_per_minute: 600,
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

// =============================================================================
// Status Snapshot
// =============================================================================

/// Read-only snapshot of a limiter's quota and queue state.
///
/// Diagnostic only: computing it never mutates quota state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimiterStatus {
    /// REST calls started within the last second.
    pub rest_calls_in_last_second: u32,

    /// Configured REST calls-per-second limit.
    pub rest_limit: u32,

    /// GraphQL points consumed in the current window.
    pub graphql_points_used: u32,

    /// Configured GraphQL points-per-minute limit.
    pub graphql_limit: u32,

    /// Operations waiting in the queue.
    pub queue_depth: usize,

    /// Milliseconds since the GraphQL window last reset.
    pub ms_since_graphql_reset: u64,
}

// =============================================================================
// Internal State
// =============================================================================

struct QueuedOperation {
    operation: Operation,
    retries: u32,
    result_tx: oneshot::Sender<SyncResult<Value>>,
}

struct QuotaState {
    /// Start instants of REST executions within the trailing window.
    rest_window: VecDeque<Instant>,

    /// Points consumed in the current GraphQL window.
    graphql_points_used: u32,

    /// When the current GraphQL window started.
    last_graphql_reset: Instant,
}

impl QuotaState {
    fn new(now: Instant) -> Self {
        QuotaState {
            rest_window: VecDeque::new(),
            graphql_points_used: 0,
            last_graphql_reset: now,
        }
    }

    /// Drops REST entries older than the trailing window.
    fn prune_rest_window(&mut self, now: Instant) {
        while let Some(front) = self.rest_window.front() {
            if now.duration_since(*front) >= REST_WINDOW {
                self.rest_window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Zeroes the point counter and restamps the window start together.
    fn reset_graphql(&mut self, now: Instant) {
        self.graphql_points_used = 0;
        self.last_graphql_reset = now;
    }
}

struct LimiterInner {
    config: LimiterConfig,
    queue: Mutex<VecDeque<QueuedOperation>>,
    quota: Mutex<QuotaState>,
    wakeup: Notify,
}

// =============================================================================
// Rate Limiter
// =============================================================================

/// Admission control for one store's remote operations.
///
/// Cloning is cheap; all clones share the same queue and quota state. The
/// processor task runs for the life of the process — stores are created on
/// first sync and never torn down.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<LimiterInner>,
}

impl RateLimiter {
    /// Creates a limiter and spawns its processor task.
    pub fn new(config: LimiterConfig) -> Self {
        let inner = Arc::new(LimiterInner {
            config,
            queue: Mutex::new(VecDeque::new()),
            quota: Mutex::new(QuotaState::new(Instant::now())),
            wakeup: Notify::new(),
        });

        tokio::spawn(Self::process_loop(inner.clone()));

        RateLimiter { inner }
    }

    /// Queues an operation and resolves with its result, or with the final
    /// error once retries are exhausted.
    ///
    /// The operation executes at most `max_retries + 1` times.
    pub async fn submit(&self, operation: Operation) -> SyncResult<Value> {
        let (result_tx, result_rx) = oneshot::channel();

        {
            let mut queue = self.inner.queue.lock().await;
            queue.push_back(QueuedOperation {
                operation,
                retries: 0,
                result_tx,
            });
        }
        self.inner.wakeup.notify_one();

        result_rx
            .await
            .map_err(|_| SyncError::Channel("operation result channel closed".into()))?
    }

    /// Read-only status snapshot.
    pub async fn status(&self) -> LimiterStatus {
        let queue_depth = self.inner.queue.lock().await.len();
        let quota = self.inner.quota.lock().await;
        let now = Instant::now();

        LimiterStatus {
            rest_calls_in_last_second: quota
                .rest_window
                .iter()
                .filter(|start| now.duration_since(**start) < REST_WINDOW)
                .count() as u32,
            rest_limit: self.inner.config.rest_calls_per_second,
            graphql_points_used: quota.graphql_points_used,
            graphql_limit: self.inner.config.graphql_points_per_minute,
            queue_depth,
            ms_since_graphql_reset: now.duration_since(quota.last_graphql_reset).as_millis()
                as u64,
        }
    }

    /// Processor loop: strict FIFO, except a retried operation re-enters at
    /// the front once its backoff elapses.
    async fn process_loop(inner: Arc<LimiterInner>) {
        loop {
            let next = inner.queue.lock().await.pop_front();

            let Some(mut entry) = next else {
                inner.wakeup.notified().await;
                continue;
            };

            Self::wait_for_quota(&inner, entry.operation.kind, entry.operation.points).await;
            Self::record_usage(&inner, entry.operation.kind, entry.operation.points).await;

            match entry.operation.execute().await {
                Ok(value) => {
                    let _ = entry.result_tx.send(Ok(value));
                    sleep(PACING_DELAY).await;
                }
                Err(err) if err.is_retryable() && entry.retries < inner.config.max_retries => {
                    let delay = inner.config.base_delay * 2u32.pow(entry.retries);
                    warn!(
                        attempt = entry.retries + 1,
                        max_retries = inner.config.max_retries,
                        ?delay,
                        error = %err,
                        "Operation failed, retrying after backoff"
                    );

                    // The backoff runs here, ahead of the re-queue: the
                    // retried operation takes priority over newer work the
                    // moment it becomes eligible.
                    sleep(delay).await;

                    entry.retries += 1;
                    inner.queue.lock().await.push_front(entry);
                }
                Err(err) => {
                    error!(retries = entry.retries, error = %err, "Operation rejected");
                    let _ = entry.result_tx.send(Err(err));
                }
            }
        }
    }

    /// Blocks until the operation's quota dimension has room.
    async fn wait_for_quota(inner: &LimiterInner, kind: OperationKind, points: u32) {
        match kind {
            OperationKind::Rest => loop {
                let wait = {
                    let mut quota = inner.quota.lock().await;
                    let now = Instant::now();
                    quota.prune_rest_window(now);

                    if (quota.rest_window.len() as u32) < inner.config.rest_calls_per_second {
                        break;
                    }

                    match quota.rest_window.front() {
                        Some(oldest) => {
                            REST_WINDOW.saturating_sub(now.duration_since(*oldest))
                                + REST_SAFETY_BUFFER
                        }
                        None => break,
                    }
                };

                debug!(?wait, "REST window full, waiting");
                sleep(wait).await;
            },
            OperationKind::Graphql => {
                let wait = {
                    let mut quota = inner.quota.lock().await;
                    let now = Instant::now();

                    // A stale window rolls over on its own.
                    if now.duration_since(quota.last_graphql_reset) > GRAPHQL_WINDOW {
                        quota.reset_graphql(now);
                    }

                    if quota.graphql_points_used + points
                        <= inner.config.graphql_points_per_minute
                    {
                        None
                    } else {
                        Some(
                            GRAPHQL_WINDOW
                                .saturating_sub(now.duration_since(quota.last_graphql_reset))
                                + GRAPHQL_RESET_BUFFER,
                        )
                    }
                };

                if let Some(wait) = wait {
                    debug!(?wait, points, "GraphQL budget exhausted, waiting for rollover");
                    sleep(wait).await;

                    let mut quota = inner.quota.lock().await;
                    quota.reset_graphql(Instant::now());
                }
            }
        }
    }

    /// Records consumption at execution start.
    async fn record_usage(inner: &LimiterInner, kind: OperationKind, points: u32) {
        let mut quota = inner.quota.lock().await;
        match kind {
            OperationKind::Rest => quota.rest_window.push_back(Instant::now()),
            OperationKind::Graphql => quota.graphql_points_used += points,
        }
    }
}

// =============================================================================
// Limiter Registry
// =============================================================================

/// Aggregated status across every store's limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStatus {
    /// Stores with a limiter instance (created on first sync).
    pub active_stores: usize,

    /// Queued operations across all stores.
    pub total_queue_depth: usize,

    /// Per-store snapshots.
    pub stores: HashMap<String, LimiterStatus>,
}

/// Create-on-first-use registry of per-store limiters.
///
/// Each store gets exactly one limiter for the life of the process, so its
/// quota accounting survives across sync jobs.
#[derive(Clone)]
pub struct LimiterRegistry {
    config: LimiterConfig,
    limiters: Arc<RwLock<HashMap<String, RateLimiter>>>,
}

impl LimiterRegistry {
    /// Creates an empty registry; limiters spawn lazily.
    pub fn new(config: LimiterConfig) -> Self {
        LimiterRegistry {
            config,
            limiters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the store's limiter, creating it on first use.
    pub async fn get_or_create(&self, store_code: &str) -> RateLimiter {
        {
            let limiters = self.limiters.read().await;
            if let Some(limiter) = limiters.get(store_code) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().await;
        limiters
            .entry(store_code.to_string())
            .or_insert_with(|| {
                debug!(store = %store_code, "Creating rate limiter");
                RateLimiter::new(self.config.clone())
            })
            .clone()
    }

    /// Aggregated snapshot across all known stores.
    pub async fn aggregate_status(&self) -> RegistryStatus {
        let limiters = self.limiters.read().await;

        let mut stores = HashMap::with_capacity(limiters.len());
        let mut total_queue_depth = 0;

        for (store_code, limiter) in limiters.iter() {
            let status = limiter.status().await;
            total_queue_depth += status.queue_depth;
            stores.insert(store_code.clone(), status);
        }

        RegistryStatus {
            active_stores: stores.len(),
            total_queue_depth,
            stores,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
