//! # shopsync-engine: Rate-Limited Sync Engine
//!
//! This crate keeps a Shopify account's inventory and product visibility in
//! step with the retail point-of-sale databases, pushing a continuous stream
//! of updates without ever exceeding the platform's throughput quotas.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Engine Architecture                          │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                SyncCoordinator (control surface)                 │  │
//! │  │                                                                  │  │
//! │  │  request_sync() / cancel_sync() / status()                       │  │
//! │  │  Global FIFO queue across stores, one job at a time,            │  │
//! │  │  stagger between jobs, duplicate-store rejection                 │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ one job                                 │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      BatchOrchestrator                           │  │
//! │  │                                                                  │  │
//! │  │  records → resolve SKUs → ordered update+evaluate worklist      │  │
//! │  │  progress event per entry, limiter snapshot every 10 entries    │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ operations                             │
//! │                               ▼                                         │
//! │  ┌────────────────┐   ┌────────────────────────────────────────────┐   │
//! │  │ ShopifyClient  │──►│ RateLimiter (one per store, registry-owned)│   │
//! │  │ GraphQL + REST │   │ 1s REST window + 60s GraphQL point budget  │   │
//! │  │ via reqwest    │   │ FIFO + retry-at-front with backoff         │   │
//! │  └────────────────┘   └────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  EVENTS (to the embedding shell via SyncEventEmitter):                 │
//! │  • progress   - per-entry {current, total, sku, phase, eta}            │
//! │  • log        - per-store log lines (also appended to {store}-log.txt) │
//! │  • complete   - aggregate report {processed, total, duration, rate}    │
//! │  • limiter    - periodic quota snapshots across all stores             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - Shopify Admin API wrapper and evaluation state machine
//! - [`config`] - tenant config store (TOML)
//! - [`coordinator`] - global job queue, cancellation, limiter registry
//! - [`error`] - sync error taxonomy
//! - [`events`] - event emitter trait and DTOs
//! - [`limiter`] - dual-quota rate limiter
//! - [`logger`] - per-store append-only log files
//! - [`orchestrator`] - one store's batch sync
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopsync_engine::{
//!     CoordinatorConfig, NoOpEmitter, ShopifyConfig, StoreLogger, SyncCoordinator,
//! };
//!
//! let config = CoordinatorConfig::new(ShopifyConfig::new(shop, token));
//! let coordinator = SyncCoordinator::new(
//!     config,
//!     Arc::new(NoOpEmitter),
//!     Some(StoreLogger::new("logs")),
//! );
//!
//! let report = coordinator
//!     .request_sync("STORE-1", "88049083702", records)
//!     .await?;
//! println!("{}/{} in {:.1}s", report.processed, report.total, report.duration_secs);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod limiter;
pub mod logger;
pub mod orchestrator;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{EvaluationOutcome, ShopifyClient, ShopifyConfig, SkuResolution};
pub use config::{StoreConfigFile, StoreEntry};
pub use coordinator::{CoordinatorConfig, SyncCoordinator};
pub use error::{SyncError, SyncResult};
pub use events::{NoOpEmitter, ProgressUpdate, SyncEventEmitter, SyncPhase, SyncReport};
pub use limiter::{
    LimiterConfig, LimiterRegistry, LimiterStatus, Operation, OperationKind, RateLimiter,
    RegistryStatus,
};
pub use logger::{StoreLogger, SyncLog};
pub use orchestrator::BatchOrchestrator;
