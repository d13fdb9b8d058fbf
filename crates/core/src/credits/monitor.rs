//! Periodic check of the remaining account credits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::audit::{AuditEvent, AuditSink, NoopAuditSink};
use crate::cloudconvert::ConversionClient;
use crate::metrics;

use super::config::CreditMonitorConfig;
use super::notifier::{CreditNotifier, LogNotifier};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Drops invalid addresses (logged at error level) and duplicates, keeping order.
pub fn filter_recipients(emails: &[String]) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::with_capacity(emails.len());
    for email in emails {
        let email = email.trim();
        if !is_valid_email(email) {
            error!(email, "Invalid email set for credit expiration notification");
            continue;
        }
        if !recipients.iter().any(|r| r == email) {
            recipients.push(email.to_string());
        }
    }
    recipients
}

/// Result of one credit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreditCheck {
    /// Monitor is disabled, the limit is negative or nobody would be told.
    Inactive,
    AboveLimit { credits: i64 },
    BelowLimit { credits: i64, notified: bool },
    /// The account lookup failed; the next tick tries again.
    Failed { reason: String },
}

/// Watches the account and notifies recipients when credits run low.
pub struct CreditMonitor {
    client: Arc<dyn ConversionClient>,
    notifier: Arc<dyn CreditNotifier>,
    audit: Arc<dyn AuditSink>,
    config: CreditMonitorConfig,
    recipients: Vec<String>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CreditMonitor {
    /// Create a monitor with the logging notifier and no audit sink.
    pub fn new(client: Arc<dyn ConversionClient>, config: CreditMonitorConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let recipients = filter_recipients(&config.emails);

        Self {
            client,
            notifier: Arc::new(LogNotifier),
            audit: Arc::new(NoopAuditSink),
            config,
            recipients,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn CreditNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Valid, de-duplicated recipients.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn is_active(&self) -> bool {
        self.config.enabled && self.config.limit >= 0 && !self.recipients.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs a single check now.
    pub async fn check_once(&self) -> CreditCheck {
        if !self.is_active() {
            return CreditCheck::Inactive;
        }
        Self::check(
            &self.client,
            &self.notifier,
            &self.audit,
            self.config.limit,
            &self.recipients,
        )
        .await
    }

    async fn check(
        client: &Arc<dyn ConversionClient>,
        notifier: &Arc<dyn CreditNotifier>,
        audit: &Arc<dyn AuditSink>,
        limit: i64,
        recipients: &[String],
    ) -> CreditCheck {
        let account = match client.current_user(false).await {
            Ok(account) => account,
            Err(e) => {
                error!(error = %e, "Could not establish connection to the CloudConvert user API");
                metrics::CREDIT_CHECKS.with_label_values(&["error"]).inc();
                return CreditCheck::Failed {
                    reason: e.to_string(),
                };
            }
        };

        metrics::REMAINING_CREDITS.set(account.credits);
        if account.credits >= limit {
            debug!(credits = account.credits, limit, "Credits above limit");
            metrics::CREDIT_CHECKS.with_label_values(&["ok"]).inc();
            return CreditCheck::AboveLimit {
                credits: account.credits,
            };
        }

        metrics::CREDIT_CHECKS
            .with_label_values(&["below_limit"])
            .inc();
        let notified = match notifier.notify(&account, limit, recipients).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    recipients = %recipients.join(", "),
                    error = %e,
                    "Could not send credit expiration notification"
                );
                false
            }
        };

        audit.record(AuditEvent::CreditLimitReached {
            username: account.username.clone(),
            credits: account.credits,
            limit,
            recipients: recipients.to_vec(),
            notified,
        });

        CreditCheck::BelowLimit {
            credits: account.credits,
            notified,
        }
    }

    /// Spawns the periodic check. Does nothing when inactive or already running.
    pub fn start(&self) {
        if !self.is_active() {
            info!("Credit monitor inactive");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Credit monitor already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let client = Arc::clone(&self.client);
        let notifier = Arc::clone(&self.notifier);
        let audit = Arc::clone(&self.audit);
        let limit = self.config.limit;
        let recipients = self.recipients.clone();
        let interval = Duration::from_secs(self.config.interval_secs.max(1));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), limit, "Credit monitor started");
            Self::check(&client, &notifier, &audit, limit, &recipients).await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Credit monitor received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        Self::check(&client, &notifier, &audit, limit, &recipients).await;
                    }
                }
            }
            info!("Credit monitor stopped");
        });
    }

    /// Signals the periodic check to stop.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for CreditMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
