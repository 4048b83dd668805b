//! # Per-Store Log Sink
//!
//! Every store gets its own append-only text log (`{store}-log.txt`), the
//! format operators already grep through on the back-office machines:
//!
//! ```text
//! 2026-08-07 14:03:11 | Starting batch inventory update for 120 records
//! 2026-08-07 14:03:12 | Looking up 117 SKUs on Shopify...
//! ```
//!
//! [`SyncLog`] is the handle the engine components write through: one call
//! fans a line out to the store's file, the event emitter, and `tracing`.
//! File errors are absorbed — losing a log line must never fail a sync.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use shopsync_core::sanitize_file_name;

use crate::events::SyncEventEmitter;

// =============================================================================
// Store Logger (file sink)
// =============================================================================

/// Append-only per-store log files under a shared directory.
#[derive(Debug, Clone)]
pub struct StoreLogger {
    dir: PathBuf,
}

impl StoreLogger {
    /// Creates a logger rooted at the given directory. The directory is
    /// created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        StoreLogger { dir: dir.into() }
    }

    /// Path of a store's log file.
    pub fn log_path(&self, store_code: &str) -> PathBuf {
        self.dir
            .join(format!("{}-log.txt", sanitize_file_name(store_code)))
    }

    /// Appends a timestamped line to the store's log file.
    ///
    /// Best-effort: failures are reported through `tracing` and swallowed.
    pub fn append(&self, store_code: &str, message: &str) {
        let line = format!("{} | {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);

        if let Err(err) = self.try_append(store_code, &line) {
            warn!(store = %store_code, ?err, "Failed to write store log line");
        }
    }

    fn try_append(&self, store_code: &str, line: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(store_code))?;
        file.write_all(line.as_bytes())
    }
}

// =============================================================================
// Sync Log (fan-out handle)
// =============================================================================

/// Log handle carried through one store's sync job.
///
/// A single `line` call reaches the store's log file (if file logging is
/// configured), the event emitter, and the process log.
#[derive(Clone)]
pub struct SyncLog {
    store_code: String,
    file: Option<StoreLogger>,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl SyncLog {
    /// Creates a log handle for one store.
    pub fn new(
        store_code: impl Into<String>,
        file: Option<StoreLogger>,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> Self {
        SyncLog {
            store_code: store_code.into(),
            file,
            emitter,
        }
    }

    /// The store this handle logs for.
    pub fn store_code(&self) -> &str {
        &self.store_code
    }

    /// Writes one log line to every sink.
    pub fn line(&self, message: impl AsRef<str>) {
        let message = message.as_ref();

        if let Some(file) = &self.file {
            file.append(&self.store_code, message);
        }

        self.emitter.emit_log(&self.store_code, message);
        info!(store = %self.store_code, "{}", message);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::events::{ProgressUpdate, SyncReport};
    use crate::limiter::RegistryStatus;

    #[derive(Default)]
    struct RecordingEmitter {
        lines: Mutex<Vec<(String, String)>>,
    }

    impl SyncEventEmitter for RecordingEmitter {
        fn emit_progress(&self, _store_code: &str, _progress: &ProgressUpdate) {}
        fn emit_log(&self, store_code: &str, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push((store_code.to_string(), message.to_string()));
        }
        fn emit_complete(&self, _store_code: &str, _report: &SyncReport) {}
        fn emit_limiter_status(&self, _status: &RegistryStatus) {}
    }

    #[test]
    fn test_append_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let logger = StoreLogger::new(dir.path());

        logger.append("STORE-1", "first line");
        logger.append("STORE-1", "second line");

        let content = std::fs::read_to_string(logger.log_path("STORE-1")).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("| first line"));
        assert!(lines[1].ends_with("| second line"));
    }

    #[test]
    fn test_log_path_is_sanitized() {
        let logger = StoreLogger::new("/tmp/logs");
        let path = logger.log_path("STORE/1!");
        assert_eq!(path.file_name().unwrap(), "STORE1-log.txt");
    }

    #[test]
    fn test_sync_log_fans_out() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = Arc::new(RecordingEmitter::default());
        let log = SyncLog::new(
            "STORE-1",
            Some(StoreLogger::new(dir.path())),
            emitter.clone(),
        );

        log.line("hello");

        let lines = emitter.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "STORE-1");
        assert_eq!(lines[0].1, "hello");

        let file = StoreLogger::new(dir.path());
        let content = std::fs::read_to_string(file.log_path("STORE-1")).unwrap();
        assert!(content.contains("hello"));
    }

    #[test]
    fn test_sync_log_without_file_sink() {
        let emitter = Arc::new(RecordingEmitter::default());
        let log = SyncLog::new("STORE-2", None, emitter.clone());

        log.line("no file");
        assert_eq!(emitter.lines.lock().unwrap().len(), 1);
    }
}
