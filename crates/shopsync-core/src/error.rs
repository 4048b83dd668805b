//! # Error Types
//!
//! Domain-specific error types for shopsync-core.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, store code, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

/// Core domain errors.
///
/// These errors represent rule violations caught before any I/O happens.
/// The engine converts them into setup faults at its boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store code is empty or contains characters unsafe for routing/log
    /// file names.
    #[error("Invalid store code '{code}': {reason}")]
    InvalidStoreCode { code: String, reason: String },

    /// SKU failed normalization (empty after trimming, too long, or a
    /// placeholder).
    #[error("Invalid SKU '{sku}': {reason}")]
    InvalidSku { sku: String, reason: String },

    /// Location identifier is not a usable Shopify location id.
    #[error("Invalid location id '{0}': must be a non-empty numeric string")]
    InvalidLocationId(String),
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidStoreCode {
            code: "a/b".to_string(),
            reason: "contains path separators".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid store code 'a/b': contains path separators"
        );

        let err = CoreError::InvalidLocationId("".to_string());
        assert!(err.to_string().contains("non-empty numeric"));
    }
}
