//! # Batch Orchestrator
//!
//! Drives one store's full inventory sync from raw POS records to
//! completion.
//!
//! ## Batch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Batch Orchestrator Flow                             │
//! │                                                                         │
//! │  1. Extract: trim SKUs, drop empties and placeholders                  │
//! │                                                                         │
//! │  2. Resolve: client.resolve_skus() in ≤30-SKU chunks                   │
//! │     └── record whose SKU does not resolve → skipped, not failed        │
//! │                                                                         │
//! │  3. Process worklist STRICTLY IN ORDER; for each entry:                │
//! │     a. check cancellation, emit progress                               │
//! │     b. set_inventory()                                                 │
//! │     c. on success → evaluate_for_drafting() for the SAME item          │
//! │        before the next entry (evaluations never interleave, and       │
//! │        each one re-fetches live sibling quantities)                    │
//! │                                                                         │
//! │  4. Every 10 entries (and on the last): progress log line with the     │
//! │     live rate-limiter snapshot                                         │
//! │                                                                         │
//! │  Returns the count of successful updates. Per-record faults are        │
//! │  absorbed; only setup faults reject the job.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use shopsync_core::{InventoryUpdate, PosRecord};

use crate::client::ShopifyClient;
use crate::error::{SyncError, SyncResult};
use crate::events::{ProgressUpdate, SyncEventEmitter, SyncPhase};
use crate::limiter::RateLimiter;
use crate::logger::SyncLog;

/// A status log line (with limiter snapshot) goes out every this many
/// entries.
const STATUS_LOG_INTERVAL: usize = 10;

/// One store's batch sync, from records to aggregate result.
pub struct BatchOrchestrator {
    store_code: String,
    location_id: String,
    client: ShopifyClient,
    limiter: RateLimiter,
    log: SyncLog,
    emitter: Arc<dyn SyncEventEmitter>,
    cancel: CancellationToken,
}

impl BatchOrchestrator {
    /// Creates an orchestrator for one store's job.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store_code: impl Into<String>,
        location_id: impl Into<String>,
        client: ShopifyClient,
        limiter: RateLimiter,
        log: SyncLog,
        emitter: Arc<dyn SyncEventEmitter>,
        cancel: CancellationToken,
    ) -> Self {
        BatchOrchestrator {
            store_code: store_code.into(),
            location_id: location_id.into(),
            client,
            limiter,
            log,
            emitter,
            cancel,
        }
    }

    /// Runs the batch and returns the count of successfully updated records.
    ///
    /// Individual record failures never propagate; only setup faults (no
    /// SKU resolvable due to a systemic failure) and cancellation reject
    /// the whole job.
    pub async fn run(&self, records: &[PosRecord]) -> SyncResult<u32> {
        self.check_cancelled()?;

        self.log.line(format!(
            "Starting batch inventory update for {} records",
            records.len()
        ));

        // Step 1: extract and clean SKUs.
        let sku_list: Vec<String> = records
            .iter()
            .filter_map(|rec| rec.cleaned_sku())
            .collect();

        // Step 2: resolve against the remote platform.
        let resolution = self.client.resolve_skus(&sku_list).await;

        if resolution.total_chunks > 0
            && resolution.failed_chunks == resolution.total_chunks
            && resolution.map.is_empty()
        {
            return Err(SyncError::Setup(
                "could not resolve any SKUs: every lookup batch failed".into(),
            ));
        }

        // Step 3: build the worklist; unresolved SKUs are skipped, never
        // failed.
        let updates = build_worklist(records, &resolution.map);

        let skipped = records.len().saturating_sub(updates.len());
        if skipped > 0 {
            self.log.line(format!(
                "Skipping {} records with unresolved or excluded SKUs",
                skipped
            ));
        }

        self.log.line(format!(
            "Processing {} inventory updates...",
            updates.len()
        ));

        let total = updates.len();
        let started = Instant::now();
        let mut success_count: u32 = 0;

        for (index, update) in updates.iter().enumerate() {
            // Cancellation is cooperative: checked before each progress
            // emission; in-flight calls are never aborted.
            self.check_cancelled()?;

            let progress = ProgressUpdate::new(
                index + 1,
                total,
                &update.sku,
                SyncPhase::InventoryUpdate,
                started.elapsed(),
            );
            self.emitter.emit_progress(&self.store_code, &progress);

            let updated = self
                .client
                .set_inventory(
                    &update.inventory_item_id,
                    update.quantity,
                    &self.location_id,
                    &update.sku,
                )
                .await;

            if updated {
                success_count += 1;

                // Evaluation is sequenced directly after its own update, so
                // no two evaluations race on shared sibling state.
                self.client
                    .evaluate_for_drafting(&update.inventory_item_id, &self.location_id)
                    .await;
            }

            if (index + 1) % STATUS_LOG_INTERVAL == 0 || index + 1 == total {
                self.log.line(format!(
                    "Progress: {}/{} processed ({} successful)",
                    index + 1,
                    total,
                    success_count
                ));

                let status = self.limiter.status().await;
                self.log.line(format!(
                    "Rate limit status: REST {}/{}/s, GraphQL {}/{}/min, queue {}",
                    status.rest_calls_in_last_second,
                    status.rest_limit,
                    status.graphql_points_used,
                    status.graphql_limit,
                    status.queue_depth
                ));
            }
        }

        self.log.line(format!(
            "Batch update complete: {}/{} items successfully processed",
            success_count, total
        ));

        info!(
            store = %self.store_code,
            success = success_count,
            total,
            "Batch sync finished"
        );

        Ok(success_count)
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancel.is_cancelled() {
            self.log.line("Sync cancelled by user");
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }
}

/// Builds the update worklist: only records whose cleaned SKU resolved to a
/// remote inventory item are retained, in their original order.
fn build_worklist(
    records: &[PosRecord],
    resolved: &std::collections::HashMap<String, String>,
) -> Vec<InventoryUpdate> {
    records
        .iter()
        .filter_map(|rec| {
            let sku = rec.cleaned_sku()?;
            let inventory_item_id = resolved.get(&sku)?.clone();
            Some(InventoryUpdate {
                sku,
                quantity: rec.target_quantity(),
                inventory_item_id,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::ShopifyConfig;
    use crate::events::NoOpEmitter;
    use crate::limiter::LimiterConfig;

    fn orchestrator(cancel: CancellationToken) -> BatchOrchestrator {
        let limiter = RateLimiter::new(LimiterConfig::default());
        let emitter: Arc<dyn SyncEventEmitter> = Arc::new(NoOpEmitter);
        let log = SyncLog::new("STORE-1", None, emitter.clone());
        let client = ShopifyClient::new(
            ShopifyConfig::new("test-shop", "token"),
            limiter.clone(),
            log.clone(),
        )
        .unwrap();

        BatchOrchestrator::new(
            "STORE-1",
            "88049083702",
            client,
            limiter,
            log,
            emitter,
            cancel,
        )
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds_without_network() {
        let orchestrator = orchestrator(CancellationToken::new());
        let count = orchestrator.run(&[]).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_placeholder_and_empty_skus_never_reach_lookup() {
        let orchestrator = orchestrator(CancellationToken::new());

        // Every SKU is excluded at extraction, so no lookup chunk is ever
        // built and the batch completes offline.
        let records = vec![
            PosRecord::new("X-00001", 4, None),
            PosRecord::new("   ", 2, None),
            PosRecord::new("", 1, None),
        ];

        let count = orchestrator.run(&records).await.unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_worklist_only_contains_resolved_skus() {
        let records = vec![
            PosRecord::new(" RING-42 ", 3, None),
            PosRecord::new("BAND-7", -2, None),
            PosRecord::new("UNKNOWN-1", 5, None),
            PosRecord::new("X-00001", 5, None),
            PosRecord::new("", 5, None),
        ];

        let mut resolved = std::collections::HashMap::new();
        resolved.insert("RING-42".to_string(), "111".to_string());
        resolved.insert("BAND-7".to_string(), "222".to_string());
        // A resolved placeholder must still never reach the worklist.
        resolved.insert("X-00001".to_string(), "333".to_string());

        let worklist = build_worklist(&records, &resolved);

        assert_eq!(worklist.len(), 2);
        assert_eq!(worklist[0].sku, "RING-42");
        assert_eq!(worklist[0].inventory_item_id, "111");
        assert_eq!(worklist[0].quantity, 3);
        // Negative on-hand clamps to zero.
        assert_eq!(worklist[1].sku, "BAND-7");
        assert_eq!(worklist[1].quantity, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let orchestrator = orchestrator(cancel);
        let records = vec![PosRecord::new("RING-42", 3, None)];

        assert!(matches!(
            orchestrator.run(&records).await,
            Err(SyncError::Cancelled)
        ));
    }
}
