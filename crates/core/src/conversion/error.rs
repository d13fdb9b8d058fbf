//! Error types for the conversion workflow.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::CacheError;
use crate::cloudconvert::ClientError;

/// Terminal error of a single conversion call.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Source is missing, not a regular file, or unreadable.
    #[error("Could not find source file at {path}")]
    SourceNotFound { path: PathBuf },

    /// Output format is empty after normalization.
    #[error("Invalid output format: {format:?}")]
    InvalidFormat { format: String },

    /// Target directory cannot be created or is not writable.
    #[error("Unable to use target directory {path}: {reason}")]
    InvalidTargetDirectory { path: PathBuf, reason: String },

    /// The remote conversion did not produce a result.
    #[error("File conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        source: Option<ClientError>,
    },

    /// The result stream was empty.
    #[error("No bytes were written to {path}")]
    CreateFileFromStream { path: PathBuf },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound { path: path.into() }
    }

    pub fn invalid_target_directory(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidTargetDirectory {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn conversion_failed(reason: impl Into<String>, source: Option<ClientError>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            source,
        }
    }

    /// Short label for metrics and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceNotFound { .. } => "source_not_found",
            Self::InvalidFormat { .. } => "invalid_format",
            Self::InvalidTargetDirectory { .. } => "invalid_target_directory",
            Self::ConversionFailed { .. } => "conversion_failed",
            Self::CreateFileFromStream { .. } => "create_file_from_stream",
            Self::Cache(_) => "cache",
            Self::Io(_) => "io",
        }
    }

    /// Whether repeating the call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConversionFailed {
                source: Some(e), ..
            } => e.is_retryable(),
            Self::Io(_) => true,
            _ => false,
        }
    }
}

impl From<ClientError> for ConvertError {
    fn from(e: ClientError) -> Self {
        Self::ConversionFailed {
            reason: e.to_string(),
            source: Some(e),
        }
    }
}
