//! # shopsync-core: Pure Domain Logic for shopsync
//!
//! This crate is the **heart** of shopsync. It contains the domain rules the
//! POS reader and the sync engine agree on, as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        shopsync Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 shopsync-pos (DBF reader)                       │   │
//! │  │        SARECORD.DBF ──► Vec<PosRecord> + filters               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopsync-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐       ┌───────────┐       ┌───────────┐        │   │
//! │  │   │   types   │       │ validation│       │   error   │        │   │
//! │  │   │ PosRecord │       │ SKU rules │       │ CoreError │        │   │
//! │  │   │ Inventory │       │ store code│       │           │        │   │
//! │  │   │  Update   │       │ filenames │       │           │        │   │
//! │  │   └───────────┘       └───────────┘       └───────────┘        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             shopsync-engine (rate-limited sync)                 │   │
//! │  │     limiter, Shopify client, orchestrator, coordinator          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (PosRecord, InventoryUpdate)
//! - [`error`] - Domain error types
//! - [`validation`] - SKU, store-code, and filename rules

pub mod error;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult};
pub use types::{InventoryUpdate, PosRecord};
pub use validation::{clamp_quantity, clean_sku, is_placeholder_sku, sanitize_file_name};

/// Suffix marking internal placeholder/dummy SKUs that must never reach the
/// remote platform (e.g. `"X-00001"`).
pub const PLACEHOLDER_SKU_SUFFIX: &str = "00001";

/// Maximum accepted SKU length after trimming.
pub const MAX_SKU_LENGTH: usize = 50;
