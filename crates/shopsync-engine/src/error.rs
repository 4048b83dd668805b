//! # Sync Error Types
//!
//! Error taxonomy for the sync engine.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Retryable     │  │    Terminal     │  │     Control             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  RateLimited    │  │  ClientFault    │  │  Cancelled              │ │
//! │  │  ServerFault    │  │  GraphqlErrors  │  │  AlreadyRunning         │ │
//! │  │  Transport      │  │  Setup          │  │  Channel                │ │
//! │  └─────────────────┘  │  Config         │  └─────────────────────────┘ │
//! │                       └─────────────────┘                               │
//! │                                                                         │
//! │  Retryable faults are absorbed by the rate limiter's backoff loop and  │
//! │  only surface once retries are exhausted. Per-record terminal faults   │
//! │  are logged and counted, never thrown. Setup faults reject the whole   │
//! │  sync job.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all engine failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Remote API Faults
    // =========================================================================
    /// The platform rejected the call with HTTP 429.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The platform returned a 5xx response.
    #[error("Server error ({status}): {message}")]
    ServerFault { status: u16, message: String },

    /// The call never completed: timeout, connection reset, DNS failure.
    #[error("Network error: {0}")]
    Transport(String),

    /// The platform returned a non-429 4xx response.
    #[error("API error ({status}): {message}")]
    ClientFault { status: u16, message: String },

    /// A 200 response whose GraphQL payload carries an `errors` array.
    #[error("GraphQL errors: {0}")]
    GraphqlErrors(String),

    // =========================================================================
    // Setup / Configuration Faults
    // =========================================================================
    /// The sync cannot perform any useful work (misconfigured tenant,
    /// no SKU resolvable at all).
    #[error("Sync setup failed: {0}")]
    Setup(String),

    /// Invalid engine or store configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    // =========================================================================
    // Control Faults
    // =========================================================================
    /// The sync was cancelled by the caller.
    #[error("Sync cancelled by user")]
    Cancelled,

    /// A sync is already active for this store.
    #[error("Sync already in progress for store {0}")]
    AlreadyRunning(String),

    /// Internal channel send/receive failed.
    #[error("Channel error: {0}")]
    Channel(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            SyncError::Transport(format!("connection failed: {}", err))
        } else if err.is_decode() {
            SyncError::ClientFault {
                status: 0,
                message: format!("invalid response body: {}", err),
            }
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}

impl From<shopsync_core::CoreError> for SyncError {
    fn from(err: shopsync_core::CoreError) -> Self {
        SyncError::Setup(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Builds the error for a failed HTTP response.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => SyncError::RateLimited(message),
            s if s >= 500 => SyncError::ServerFault { status: s, message },
            s => SyncError::ClientFault { status: s, message },
        }
    }

    /// Returns true if the rate limiter may retry the operation.
    ///
    /// ## Retryable
    /// - Quota rejections (429)
    /// - Server faults (5xx)
    /// - Transport faults (timeout, reset)
    ///
    /// ## Not Retryable
    /// - Other 4xx responses (the request itself is wrong)
    /// - GraphQL payload errors
    /// - Setup, configuration, and control faults
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RateLimited(_) | SyncError::ServerFault { .. } | SyncError::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            SyncError::from_status(429, "slow down".into()),
            SyncError::RateLimited(_)
        ));
        assert!(matches!(
            SyncError::from_status(503, "unavailable".into()),
            SyncError::ServerFault { status: 503, .. }
        ));
        assert!(matches!(
            SyncError::from_status(404, "missing".into()),
            SyncError::ClientFault { status: 404, .. }
        ));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::RateLimited("throttled".into()).is_retryable());
        assert!(SyncError::ServerFault {
            status: 502,
            message: "bad gateway".into()
        }
        .is_retryable());
        assert!(SyncError::Transport("reset".into()).is_retryable());

        assert!(!SyncError::ClientFault {
            status: 422,
            message: "unprocessable".into()
        }
        .is_retryable());
        assert!(!SyncError::GraphqlErrors("bad query".into()).is_retryable());
        assert!(!SyncError::Cancelled.is_retryable());
        assert!(!SyncError::Setup("no store".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::AlreadyRunning("STORE-1".into());
        assert_eq!(err.to_string(), "Sync already in progress for store STORE-1");
    }
}
