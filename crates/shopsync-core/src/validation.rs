//! # Validation Module
//!
//! SKU, store-code, and filename rules for shopsync.
//!
//! ## Where These Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: POS reader (shopsync-pos)                                    │
//! │  ├── clean_sku / is_placeholder_sku while decoding rows                │
//! │  └── drops placeholder and empty SKUs before they ever queue           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Sync engine (shopsync-engine)                                │
//! │  ├── validate_store_code / validate_location_id on request_sync        │
//! │  └── clean_sku again on whatever records the caller hands over         │
//! │                                                                         │
//! │  Defense in depth: the engine never trusts reader output blindly.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::{MAX_SKU_LENGTH, PLACEHOLDER_SKU_SUFFIX};

// =============================================================================
// SKU Rules
// =============================================================================

/// Returns true if the (already trimmed) SKU is an internal placeholder.
///
/// Placeholder SKUs end in a fixed suffix (`00001`) and represent dummy
/// items the stores use for non-inventory transactions. They must never be
/// pushed to the remote platform.
///
/// ## Example
/// ```rust
/// use shopsync_core::is_placeholder_sku;
///
/// assert!(is_placeholder_sku("X-00001"));
/// assert!(!is_placeholder_sku("RING-42"));
/// ```
pub fn is_placeholder_sku(sku: &str) -> bool {
    sku.ends_with(PLACEHOLDER_SKU_SUFFIX)
}

/// Normalizes a raw SKU: trims whitespace, then rejects empty, overlong,
/// and placeholder values.
///
/// Returns `None` for anything that must not reach the remote platform.
pub fn clean_sku(raw: &str) -> Option<String> {
    let sku = raw.trim();

    if sku.is_empty() || sku.len() > MAX_SKU_LENGTH {
        return None;
    }

    if is_placeholder_sku(sku) {
        return None;
    }

    Some(sku.to_string())
}

// =============================================================================
// Quantity Rules
// =============================================================================

/// Clamps a POS on-hand quantity to a remote-acceptable value.
///
/// Store databases drift negative on returns and voids; the remote platform
/// only accepts non-negative levels.
pub fn clamp_quantity(qty_on_hand: i64) -> u32 {
    qty_on_hand.max(0).min(u32::MAX as i64) as u32
}

// =============================================================================
// Tenant Identifiers
// =============================================================================

/// Validates a store code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must contain only alphanumerics, hyphens, and underscores (it routes
///   queues and names log files)
pub fn validate_store_code(code: &str) -> CoreResult<()> {
    let trimmed = code.trim();

    if trimmed.is_empty() {
        return Err(CoreError::InvalidStoreCode {
            code: code.to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::InvalidStoreCode {
            code: code.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a remote location identifier (numeric string).
pub fn validate_location_id(location_id: &str) -> CoreResult<()> {
    let trimmed = location_id.trim();

    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidLocationId(location_id.to_string()));
    }

    Ok(())
}

// =============================================================================
// Filenames
// =============================================================================

/// Strips everything but alphanumerics, hyphens, and underscores.
///
/// Used for per-store log file names.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_placeholder_sku() {
        assert!(is_placeholder_sku("X-00001"));
        assert!(is_placeholder_sku("00001"));
        assert!(!is_placeholder_sku("RING-42"));
        // Suffix check is exact: a SKU merely containing the marker is fine.
        assert!(!is_placeholder_sku("00001-X"));
    }

    #[test]
    fn test_clean_sku() {
        assert_eq!(clean_sku("  RING-42 ").as_deref(), Some("RING-42"));
        assert_eq!(clean_sku(""), None);
        assert_eq!(clean_sku("   "), None);
        assert_eq!(clean_sku("X-00001"), None);
        assert_eq!(clean_sku(&"A".repeat(100)), None);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(-10), 0);
        assert_eq!(clamp_quantity(0), 0);
        assert_eq!(clamp_quantity(42), 42);
    }

    #[test]
    fn test_validate_store_code() {
        assert!(validate_store_code("STORE-1").is_ok());
        assert!(validate_store_code("main_01").is_ok());

        assert!(validate_store_code("").is_err());
        assert!(validate_store_code("   ").is_err());
        assert!(validate_store_code("a/b").is_err());
        assert!(validate_store_code("a b").is_err());
    }

    #[test]
    fn test_validate_location_id() {
        assert!(validate_location_id("88049083702").is_ok());
        assert!(validate_location_id("").is_err());
        assert!(validate_location_id("gid://shopify/Location/1").is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("STORE-1"), "STORE-1");
        assert_eq!(sanitize_file_name("a/b c!"), "abc");
    }
}
