//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits,
//! allowing end-to-end tests of the conversion workflow without CloudConvert.
//!
//! # Example
//!
//! ```rust,ignore
//! use convertino_core::testing::{MockConversionClient, RecordingAuditSink};
//!
//! let client = Arc::new(MockConversionClient::new());
//! let audit = RecordingAuditSink::new();
//!
//! let orchestrator = ConversionOrchestrator::new(client.clone(), cache)
//!     .with_audit(Arc::new(audit.clone()));
//! ```

mod mock_conversion_client;
mod recording_sinks;

pub use mock_conversion_client::MockConversionClient;
pub use recording_sinks::{RecordedNotification, RecordingAuditSink, RecordingNotifier};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::cloudconvert::AccountInfo;

    /// Write a small source document into `dir` and return its path.
    pub fn source_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("source document {}", name)).unwrap_or_else(|e| {
            panic!("failed to write fixture {}: {}", path.display(), e)
        });
        path
    }

    /// Account with the given remaining credits.
    pub fn account(username: &str, credits: i64) -> AccountInfo {
        AccountInfo {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            credits,
        }
    }
}
