//! # Event Surface
//!
//! Events the engine streams to whatever shell embeds it (desktop app, CLI,
//! service). The engine never talks to a UI directly; it talks to a
//! [`SyncEventEmitter`].
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Event Surface                                   │
//! │                                                                         │
//! │  Orchestrator ──progress──►┐                                            │
//! │  SyncLog ──log lines──────►│  SyncEventEmitter  ──► embedding shell     │
//! │  Coordinator ─completion──►│  (trait object)        (UI, logs, tests)   │
//! │  Coordinator ─limiter stat►┘                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::limiter::RegistryStatus;

// =============================================================================
// Sync Phase
// =============================================================================

/// Which stage of the batch a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Resolving SKUs to remote inventory-item ids.
    SkuLookup,
    /// Pushing inventory levels and evaluating products.
    InventoryUpdate,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::SkuLookup => write!(f, "sku_lookup"),
            SyncPhase::InventoryUpdate => write!(f, "inventory_update"),
        }
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Progress snapshot emitted after every processed entry.
///
/// Derived state: recomputed on each step, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// 1-based index of the entry being processed.
    pub current: usize,

    /// Total entries in this batch.
    pub total: usize,

    /// SKU of the entry being processed.
    pub current_sku: String,

    /// Current phase.
    pub phase: SyncPhase,

    /// Whole-number percentage (0-100).
    pub percentage: u8,

    /// Estimated seconds remaining, once at least one entry has completed.
    pub eta_secs: Option<u64>,
}

impl ProgressUpdate {
    /// Builds a progress snapshot, deriving percentage and ETA from the
    /// elapsed batch time.
    pub fn new(
        current: usize,
        total: usize,
        current_sku: impl Into<String>,
        phase: SyncPhase,
        elapsed: Duration,
    ) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((current as f64 / total as f64) * 100.0).round() as u8
        };

        // Rate so far extrapolated over the remaining entries. The first
        // entry has no history to extrapolate from.
        let eta_secs = if current == 0 || elapsed.is_zero() {
            None
        } else {
            let rate = current as f64 / elapsed.as_secs_f64();
            let remaining = total.saturating_sub(current) as f64;
            Some((remaining / rate).round() as u64)
        };

        ProgressUpdate {
            current,
            total,
            current_sku: current_sku.into(),
            phase,
            percentage,
            eta_secs,
        }
    }
}

// =============================================================================
// Completion Report
// =============================================================================

/// Aggregate outcome of one sync job.
///
/// Per-record detail is only available in the log stream; the caller sees
/// counts and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Whether the job as a whole succeeded.
    pub success: bool,

    /// Records successfully updated.
    pub processed: u32,

    /// Records submitted.
    pub total: usize,

    /// Wall-clock duration of the job in seconds.
    pub duration_secs: f64,

    /// Records per second over the whole job.
    pub rate: f64,

    /// Failure description when `success` is false.
    pub error: Option<String>,
}

impl SyncReport {
    /// Builds a success report.
    pub fn completed(processed: u32, total: usize, duration: Duration) -> Self {
        let duration_secs = duration.as_secs_f64();
        let rate = if duration_secs > 0.0 {
            processed as f64 / duration_secs
        } else {
            0.0
        };

        SyncReport {
            success: true,
            processed,
            total,
            duration_secs,
            rate,
            error: None,
        }
    }

    /// Builds a failure report.
    pub fn failed(total: usize, duration: Duration, error: impl Into<String>) -> Self {
        SyncReport {
            success: false,
            processed: 0,
            total,
            duration_secs: duration.as_secs_f64(),
            rate: 0.0,
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Trait for streaming engine events to the embedding shell.
pub trait SyncEventEmitter: Send + Sync {
    /// Emits a per-entry progress update for a store.
    fn emit_progress(&self, store_code: &str, progress: &ProgressUpdate);

    /// Emits a log line for a store.
    fn emit_log(&self, store_code: &str, message: &str);

    /// Emits the final outcome of a sync job.
    fn emit_complete(&self, store_code: &str, report: &SyncReport);

    /// Emits a periodic rate-limiter status snapshot (all stores).
    fn emit_limiter_status(&self, status: &RegistryStatus);
}

/// No-op event emitter for testing and headless use.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_progress(&self, _store_code: &str, _progress: &ProgressUpdate) {}
    fn emit_log(&self, _store_code: &str, _message: &str) {}
    fn emit_complete(&self, _store_code: &str, _report: &SyncReport) {}
    fn emit_limiter_status(&self, _status: &RegistryStatus) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let p = ProgressUpdate::new(5, 20, "RING-42", SyncPhase::InventoryUpdate, Duration::ZERO);
        assert_eq!(p.percentage, 25);
        assert_eq!(p.eta_secs, None);

        let p = ProgressUpdate::new(0, 0, "", SyncPhase::SkuLookup, Duration::ZERO);
        assert_eq!(p.percentage, 100);
    }

    #[test]
    fn test_progress_eta() {
        // 5 of 20 in 10s → 2s per entry → 30s remaining.
        let p = ProgressUpdate::new(
            5,
            20,
            "RING-42",
            SyncPhase::InventoryUpdate,
            Duration::from_secs(10),
        );
        assert_eq!(p.eta_secs, Some(30));
    }

    #[test]
    fn test_report_rate() {
        let report = SyncReport::completed(50, 60, Duration::from_secs(25));
        assert!(report.success);
        assert_eq!(report.processed, 50);
        assert!((report.rate - 2.0).abs() < f64::EPSILON);

        let report = SyncReport::failed(60, Duration::from_secs(5), "boom");
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("boom"));
    }
}
