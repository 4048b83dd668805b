//! # Sync Coordinator
//!
//! Serializes sync jobs across stores and owns the per-store limiter
//! registry.
//!
//! ## Coordination Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Coordinator                                 │
//! │                                                                         │
//! │  request_sync("A", ...) ──► already active for A? ──► reject NOW       │
//! │        │                                              (never queued)    │
//! │        ▼                                                                │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Global FIFO job queue                          │   │
//! │  │   [ A ] [ B ] [ C ]   ← one queue shared by ALL stores          │   │
//! │  └────────────┬────────────────────────────────────────────────────┘   │
//! │               ▼                                                         │
//! │  Drain loop: one job at a time, settle before next,                    │
//! │  fixed stagger delay between jobs when more are queued                 │
//! │  (each store's rate limiter stays independent — only job              │
//! │  STARTS are serialized, not their internal async work)                 │
//! │                                                                         │
//! │  cancel_sync("A") ──► trips A's CancellationToken (advisory;          │
//! │  in-flight remote calls are never aborted)                             │
//! │                                                                         │
//! │  On completion (success, failure, or cancellation) the store           │
//! │  leaves the active set and may be synced again.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use shopsync_core::validation::{validate_location_id, validate_store_code};
use shopsync_core::PosRecord;

use crate::client::{ShopifyClient, ShopifyConfig};
use crate::error::{SyncError, SyncResult};
use crate::events::{SyncEventEmitter, SyncReport};
use crate::limiter::{LimiterConfig, LimiterRegistry, RegistryStatus};
use crate::logger::{StoreLogger, SyncLog};
use crate::orchestrator::BatchOrchestrator;

/// How often the aggregated limiter status is broadcast while syncs run.
const STATUS_BROADCAST_INTERVAL: Duration = Duration::from_secs(5);

// =============================================================================
// Configuration
// =============================================================================

/// Coordinator settings shared by every store.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Shopify account settings.
    pub shopify: ShopifyConfig,

    /// Per-store limiter tuning.
    pub limiter: LimiterConfig,

    /// Delay between consecutive jobs when more are queued, so stores do
    /// not all ramp up against the platform at once.
    pub stagger_delay: Duration,
}

impl CoordinatorConfig {
    /// Creates a config with default limiter tuning and a 5-second stagger.
    pub fn new(shopify: ShopifyConfig) -> Self {
        CoordinatorConfig {
            shopify,
            limiter: LimiterConfig::default(),
            stagger_delay: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Internal State
// =============================================================================

type JobFuture = BoxFuture<'static, SyncResult<u32>>;

struct QueuedJob {
    job_id: Uuid,
    store_code: String,
    total: usize,
    job: JobFuture,
    result_tx: oneshot::Sender<SyncResult<SyncReport>>,
}

struct ActiveSync {
    cancel: CancellationToken,
    job_id: Uuid,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    registry: LimiterRegistry,
    emitter: Arc<dyn SyncEventEmitter>,
    store_logger: Option<StoreLogger>,
    active: Mutex<HashMap<String, ActiveSync>>,
    queue: Mutex<VecDeque<QueuedJob>>,
    wakeup: Notify,
}

// =============================================================================
// Sync Coordinator
// =============================================================================

/// Control surface of the engine: requests, cancellation, status.
///
/// Cloning is cheap; all clones share the queue, the active set, and the
/// limiter registry. Both background tasks (drain loop and status
/// broadcaster) run for the life of the process.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl SyncCoordinator {
    /// Creates a coordinator and spawns its background tasks.
    pub fn new(
        config: CoordinatorConfig,
        emitter: Arc<dyn SyncEventEmitter>,
        store_logger: Option<StoreLogger>,
    ) -> Self {
        let inner = Arc::new(CoordinatorInner {
            registry: LimiterRegistry::new(config.limiter.clone()),
            config,
            emitter,
            store_logger,
            active: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            wakeup: Notify::new(),
        });

        tokio::spawn(Self::drain_loop(inner.clone()));
        tokio::spawn(Self::status_broadcast_loop(inner.clone()));

        SyncCoordinator { inner }
    }

    // =========================================================================
    // Control Surface
    // =========================================================================

    /// Queues a full batch sync for one store and resolves with its report.
    ///
    /// Rejects immediately — without queuing — when a sync is already
    /// active for the store.
    pub async fn request_sync(
        &self,
        store_code: &str,
        location_id: &str,
        records: Vec<PosRecord>,
    ) -> SyncResult<SyncReport> {
        validate_store_code(store_code)?;
        validate_location_id(location_id)?;

        let cancel = CancellationToken::new();
        let limiter = self.inner.registry.get_or_create(store_code).await;
        let log = SyncLog::new(
            store_code,
            self.inner.store_logger.clone(),
            self.inner.emitter.clone(),
        );
        let client = ShopifyClient::new(
            self.inner.config.shopify.clone(),
            limiter.clone(),
            log.clone(),
        )?;

        let orchestrator = BatchOrchestrator::new(
            store_code,
            location_id,
            client,
            limiter,
            log.clone(),
            self.inner.emitter.clone(),
            cancel.clone(),
        );

        let total = records.len();
        let job: JobFuture = Box::pin(async move { orchestrator.run(&records).await });

        self.enqueue(store_code, cancel, total, job).await
    }

    /// Requests cooperative cancellation of a store's active sync.
    ///
    /// Returns true if a sync was active. In-flight remote calls are not
    /// aborted; the batch stops at its next checkpoint.
    pub async fn cancel_sync(&self, store_code: &str) -> bool {
        let active = self.inner.active.lock().await;

        match active.get(store_code) {
            Some(sync) => {
                sync.cancel.cancel();
                info!(store = %store_code, job = %sync.job_id, "Sync cancellation requested");
                SyncLog::new(
                    store_code,
                    self.inner.store_logger.clone(),
                    self.inner.emitter.clone(),
                )
                .line("Sync cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Aggregated rate-limiter status across every known store.
    pub async fn status(&self) -> RegistryStatus {
        self.inner.registry.aggregate_status().await
    }

    // =========================================================================
    // Queueing
    // =========================================================================

    /// Registers the store as active and enqueues its job.
    ///
    /// This is the single entry into the global queue; `request_sync`
    /// composes the real orchestrator job, tests drive it with synthetic
    /// ones.
    async fn enqueue(
        &self,
        store_code: &str,
        cancel: CancellationToken,
        total: usize,
        job: JobFuture,
    ) -> SyncResult<SyncReport> {
        let job_id = Uuid::new_v4();

        {
            let mut active = self.inner.active.lock().await;
            if active.contains_key(store_code) {
                warn!(store = %store_code, "Sync already in progress, rejecting request");
                return Err(SyncError::AlreadyRunning(store_code.to_string()));
            }
            active.insert(
                store_code.to_string(),
                ActiveSync {
                    cancel,
                    job_id,
                },
            );
        }

        let (result_tx, result_rx) = oneshot::channel();

        {
            let mut queue = self.inner.queue.lock().await;
            queue.push_back(QueuedJob {
                job_id,
                store_code: store_code.to_string(),
                total,
                job,
                result_tx,
            });
            info!(store = %store_code, job = %job_id, depth = queue.len(), "Sync job queued");
        }
        self.inner.wakeup.notify_one();

        result_rx
            .await
            .map_err(|_| SyncError::Channel("sync job result channel closed".into()))?
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Drains the global queue one job at a time, staggering consecutive
    /// jobs.
    async fn drain_loop(inner: Arc<CoordinatorInner>) {
        loop {
            let next = inner.queue.lock().await.pop_front();

            let Some(job) = next else {
                inner.wakeup.notified().await;
                continue;
            };

            info!(store = %job.store_code, job = %job.job_id, "Sync job starting");
            let log = SyncLog::new(
                job.store_code.as_str(),
                inner.store_logger.clone(),
                inner.emitter.clone(),
            );

            let started = Instant::now();
            let result = job.job.await;
            let duration = started.elapsed();

            let report = match &result {
                Ok(processed) => {
                    let report = SyncReport::completed(*processed, job.total, duration);
                    log.line(format!(
                        "Sync completed: {}/{} records in {:.1}s ({:.2} records/sec)",
                        report.processed, report.total, report.duration_secs, report.rate
                    ));
                    report
                }
                Err(err) => {
                    let report = SyncReport::failed(job.total, duration, err.to_string());
                    log.line(format!(
                        "Sync failed after {:.1}s: {}",
                        report.duration_secs, err
                    ));
                    report
                }
            };

            inner.emitter.emit_complete(&job.store_code, &report);
            inner.active.lock().await.remove(&job.store_code);

            let _ = job.result_tx.send(result.map(|_| report));

            // Stagger the next store's ramp-up only when one is waiting.
            let more_queued = !inner.queue.lock().await.is_empty();
            if more_queued {
                sleep(inner.config.stagger_delay).await;
            }
        }
    }

    /// Broadcasts the aggregated limiter status while syncs are active.
    async fn status_broadcast_loop(inner: Arc<CoordinatorInner>) {
        let mut interval = tokio::time::interval(STATUS_BROADCAST_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if inner.active.lock().await.is_empty() {
                continue;
            }

            let status = inner.registry.aggregate_status().await;
            inner.emitter.emit_limiter_status(&status);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex as StdMutex;

    use crate::events::NoOpEmitter;

    fn coordinator() -> SyncCoordinator {
        let mut config = CoordinatorConfig::new(ShopifyConfig::new("test-shop", "token"));
        config.stagger_delay = Duration::from_secs(5);
        SyncCoordinator::new(config, Arc::new(NoOpEmitter), None)
    }

    fn quick_job(processed: u32) -> JobFuture {
        Box::pin(async move { Ok(processed) })
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_store_rejected_immediately() {
        let coordinator = coordinator();

        let slow: JobFuture = Box::pin(async {
            sleep(Duration::from_secs(60)).await;
            Ok(1)
        });

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .enqueue("STORE-B", CancellationToken::new(), 1, slow)
                    .await
            })
        };

        // Let the first job register and start.
        tokio::task::yield_now().await;

        let second = coordinator
            .enqueue("STORE-B", CancellationToken::new(), 1, quick_job(1))
            .await;
        assert!(matches!(second, Err(SyncError::AlreadyRunning(_))));

        // The rejected request never entered the queue: only the first job
        // completes.
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.processed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_drain_fifo_with_stagger() {
        let coordinator = coordinator();
        let starts: Arc<StdMutex<Vec<(String, Instant)>>> = Arc::new(StdMutex::new(Vec::new()));

        let make_job = |label: &str| -> JobFuture {
            let starts = starts.clone();
            let label = label.to_string();
            Box::pin(async move {
                starts.lock().unwrap().push((label, Instant::now()));
                sleep(Duration::from_secs(1)).await;
                Ok(1)
            })
        };

        let job_a = make_job("A");
        let job_c = make_job("C");

        let (a, c) = tokio::join!(
            coordinator.enqueue("STORE-A", CancellationToken::new(), 1, job_a),
            coordinator.enqueue("STORE-C", CancellationToken::new(), 1, job_c),
        );
        a.unwrap();
        c.unwrap();

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0].0, "A");
        assert_eq!(starts[1].0, "C");
        // C waits for A to settle (1s) plus the 5s stagger.
        assert!(starts[1].1.duration_since(starts[0].1) >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_frees_store_for_new_sync() {
        let coordinator = coordinator();

        let cancel = CancellationToken::new();
        let job: JobFuture = {
            let cancel = cancel.clone();
            Box::pin(async move {
                loop {
                    if cancel.is_cancelled() {
                        return Err(SyncError::Cancelled);
                    }
                    sleep(Duration::from_millis(100)).await;
                }
            })
        };

        let handle = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .enqueue("STORE-A", cancel, 3, job)
                    .await
            })
        };

        tokio::task::yield_now().await;
        sleep(Duration::from_millis(300)).await;

        assert!(coordinator.cancel_sync("STORE-A").await);
        assert!(matches!(
            handle.await.unwrap(),
            Err(SyncError::Cancelled)
        ));

        // The store left the active set; a new sync is accepted.
        assert!(!coordinator.cancel_sync("STORE-A").await);
        let report = coordinator
            .enqueue("STORE-A", CancellationToken::new(), 0, quick_job(0))
            .await
            .unwrap();
        assert!(report.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_report_counts() {
        let coordinator = coordinator();

        let report = coordinator
            .enqueue("STORE-A", CancellationToken::new(), 10, quick_job(7))
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.processed, 7);
        assert_eq!(report.total, 10);
        assert!(report.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_frees_store() {
        let coordinator = coordinator();

        let failing: JobFuture = Box::pin(async { Err(SyncError::Setup("no SKUs".into())) });
        let result = coordinator
            .enqueue("STORE-A", CancellationToken::new(), 4, failing)
            .await;
        assert!(matches!(result, Err(SyncError::Setup(_))));

        let report = coordinator
            .enqueue("STORE-A", CancellationToken::new(), 0, quick_job(0))
            .await
            .unwrap();
        assert!(report.success);
    }

    #[tokio::test]
    async fn test_request_sync_validates_identifiers() {
        let coordinator = coordinator();

        assert!(matches!(
            coordinator.request_sync("", "123", vec![]).await,
            Err(SyncError::Setup(_))
        ));
        assert!(matches!(
            coordinator
                .request_sync("STORE-1", "not-numeric", vec![])
                .await,
            Err(SyncError::Setup(_))
        ));
    }

    #[tokio::test]
    async fn test_request_sync_empty_batch_completes() {
        let coordinator = coordinator();

        // An empty batch never touches the network, so the full
        // request_sync path can run end to end.
        let report = coordinator
            .request_sync("STORE-1", "88049083702", vec![])
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.processed, 0);
        assert_eq!(report.total, 0);
    }
}
