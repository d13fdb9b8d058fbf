use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    /// Free-text entry tagged with the logical scope that produced it.
    Message {
        message: String,
        scope: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        principal: Option<String>,
    },

    // Conversion events
    ConversionCompleted {
        /// Who requested the conversion (`anonymous` when unknown)
        principal: String,
        /// Logical scope of the operation
        scope: String,
        /// Source file basename
        source: String,
        /// Target file basename
        target: String,
        /// Normalized output format
        format: String,
        /// How the artifact was produced: cache_hit, target_reuse or remote_convert
        outcome: String,
        /// Whether the artifact was written into the cache
        cached: bool,
        size_bytes: u64,
        duration_ms: u64,
    },
    ConversionFailed {
        principal: String,
        scope: String,
        source: String,
        format: String,
        error: String,
    },

    // Account events
    CreditLimitReached {
        username: String,
        credits: i64,
        limit: i64,
        recipients: Vec<String>,
        notified: bool,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::Message { .. } => "message",
            Self::ConversionCompleted { .. } => "conversion_completed",
            Self::ConversionFailed { .. } => "conversion_failed",
            Self::CreditLimitReached { .. } => "credit_limit_reached",
        }
    }

    /// Logical scope tag, if the event carries one
    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::Message { scope, .. }
            | Self::ConversionCompleted { scope, .. }
            | Self::ConversionFailed { scope, .. } => Some(scope),
            _ => None,
        }
    }

    /// Acting principal, if the event carries one
    pub fn principal(&self) -> Option<&str> {
        match self {
            Self::Message { principal, .. } => principal.as_deref(),
            Self::ConversionCompleted { principal, .. }
            | Self::ConversionFailed { principal, .. } => Some(principal),
            _ => None,
        }
    }

    /// Human readable one-line summary.
    pub fn summary(&self) -> String {
        match self {
            Self::ServiceStarted { version, .. } => format!("Service started (v{})", version),
            Self::ServiceStopped { reason } => format!("Service stopped: {}", reason),
            Self::Message { message, .. } => message.clone(),
            Self::ConversionCompleted {
                principal,
                source,
                target,
                outcome,
                ..
            } => format!(
                "{} converted \"{}\" to \"{}\" ({})",
                principal, source, target, outcome
            ),
            Self::ConversionFailed {
                principal,
                source,
                format,
                error,
                ..
            } => format!(
                "{} failed to convert \"{}\" to {}: {}",
                principal, source, format, error
            ),
            Self::CreditLimitReached {
                username,
                credits,
                limit,
                ..
            } => format!(
                "CloudConvert credits of \"{}\" dropped to {} (limit {})",
                username, credits, limit
            ),
        }
    }
}

/// A persisted audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub scope: Option<String>,
    pub principal: Option<String>,
    pub data: AuditEvent,
}
