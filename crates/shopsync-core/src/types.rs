//! # Domain Types
//!
//! Core domain types shared by the POS reader and the sync engine.
//!
//! ## Type Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Record Lifecycle                                │
//! │                                                                         │
//! │  SARECORD.DBF row                                                       │
//! │       │  (shopsync-pos parses fixed-width fields)                       │
//! │       ▼                                                                 │
//! │  ┌─────────────────┐      SKU resolved       ┌─────────────────┐       │
//! │  │    PosRecord    │ ──────────────────────► │ InventoryUpdate │       │
//! │  │  ─────────────  │   against the remote    │  ─────────────  │       │
//! │  │  sku            │   platform (engine)     │  sku            │       │
//! │  │  qty_on_hand    │                         │  quantity (u32) │       │
//! │  │  date           │                         │  inventory_item │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  Records whose SKU does not resolve are skipped, never errored.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validation::{clamp_quantity, clean_sku};

// =============================================================================
// POS Record
// =============================================================================

/// One point-of-sale transaction record, as read from the store database.
///
/// Field names mirror the source columns (`SKU_NO`, `QTYONHAND`, `DATE`);
/// the values here are already decoded from their fixed-width representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosRecord {
    /// Raw SKU as stored in the POS database. May carry padding whitespace;
    /// use [`PosRecord::cleaned_sku`] before sending it anywhere.
    pub sku: String,

    /// On-hand quantity reported by the POS. May be negative when the store
    /// database has drifted; negative values clamp to zero on update.
    pub qty_on_hand: i64,

    /// Transaction date, when the source row carried one.
    pub date: Option<NaiveDate>,
}

impl PosRecord {
    /// Creates a record from raw POS field values.
    pub fn new(sku: impl Into<String>, qty_on_hand: i64, date: Option<NaiveDate>) -> Self {
        PosRecord {
            sku: sku.into(),
            qty_on_hand,
            date,
        }
    }

    /// Returns the trimmed SKU, or `None` if it is empty, overlong, or a
    /// placeholder.
    pub fn cleaned_sku(&self) -> Option<String> {
        clean_sku(&self.sku)
    }

    /// Target quantity for the remote platform (negative on-hand clamps to 0).
    pub fn target_quantity(&self) -> u32 {
        clamp_quantity(self.qty_on_hand)
    }
}

// =============================================================================
// Inventory Update
// =============================================================================

/// A worklist entry: a record whose SKU resolved to a remote inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryUpdate {
    /// Cleaned SKU (trimmed, non-placeholder).
    pub sku: String,

    /// Quantity to set remotely.
    pub quantity: u32,

    /// Resolved remote inventory-item identifier (numeric, no gid prefix).
    pub inventory_item_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleaned_sku_trims() {
        let rec = PosRecord::new("  RING-42  ", 3, None);
        assert_eq!(rec.cleaned_sku().as_deref(), Some("RING-42"));
    }

    #[test]
    fn test_cleaned_sku_rejects_placeholder() {
        let rec = PosRecord::new("X-00001", 3, None);
        assert_eq!(rec.cleaned_sku(), None);
    }

    #[test]
    fn test_target_quantity_clamps_negative() {
        assert_eq!(PosRecord::new("A", -4, None).target_quantity(), 0);
        assert_eq!(PosRecord::new("A", 7, None).target_quantity(), 7);
    }
}
