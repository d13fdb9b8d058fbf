//! Recording audit sink and credit notifier for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::audit::{AuditEvent, AuditSink};
use crate::cloudconvert::AccountInfo;
use crate::credits::{CreditNotifier, NotifyError};

/// Audit sink that keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotification {
    pub account: AccountInfo,
    pub limit: i64,
    pub recipients: Vec<String>,
}

/// Credit notifier that records calls and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notifications: Arc<Mutex<Vec<RecordedNotification>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<RecordedNotification> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Make every following notification fail.
    pub fn set_failing(&self, fail: bool) {
        *self
            .fail
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = fail;
    }
}

#[async_trait]
impl CreditNotifier for RecordingNotifier {
    async fn notify(
        &self,
        account: &AccountInfo,
        limit: i64,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedNotification {
                account: account.clone(),
                limit,
                recipients: recipients.to_vec(),
            });

        let fail = *self
            .fail
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if fail {
            return Err(NotifyError("mail transport unavailable".to_string()));
        }
        Ok(())
    }
}
