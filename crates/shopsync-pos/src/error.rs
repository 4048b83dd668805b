//! # POS Reader Error Types

use thiserror::Error;

/// Result type alias for POS reader operations.
pub type PosResult<T> = Result<T, PosError>;

/// Errors raised while locating or parsing a POS transaction file.
#[derive(Debug, Error)]
pub enum PosError {
    /// File could not be opened or read.
    #[error("Failed to read POS file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is shorter than its own header claims.
    #[error("Truncated DBF file: {0}")]
    Truncated(String),

    /// Structural problem in the DBF header or field descriptors.
    #[error("Malformed DBF file: {0}")]
    Malformed(String),

    /// A column the sync depends on is absent from the table.
    #[error("SARECORD table is missing the {0} column")]
    MissingColumn(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PosError::MissingColumn("SKU_NO");
        assert_eq!(err.to_string(), "SARECORD table is missing the SKU_NO column");
    }
}
