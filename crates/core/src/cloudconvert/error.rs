//! Error types for the CloudConvert client.

use thiserror::Error;

/// Errors that can occur while talking to the conversion backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    #[error("Job {job_id} finished without an export URL")]
    NoExportUrl { job_id: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether repeating the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::Transport("reset".into()).is_retryable());
        assert!(ClientError::Api {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!ClientError::Api {
            status: 422,
            message: "bad format".into()
        }
        .is_retryable());
        assert!(!ClientError::AuthenticationFailed("nope".into()).is_retryable());
        assert!(!ClientError::NoExportUrl {
            job_id: "j".into()
        }
        .is_retryable());
    }
}
