//! Delivery of low-credit notifications.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::cloudconvert::AccountInfo;

/// Subject line used for low-credit notifications.
pub const NOTIFICATION_SUBJECT: &str = "CloudConvert credits have reached expiration limit";

#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Tells recipients that the account is running out of credits.
#[async_trait]
pub trait CreditNotifier: Send + Sync {
    async fn notify(
        &self,
        account: &AccountInfo,
        limit: i64,
        recipients: &[String],
    ) -> Result<(), NotifyError>;
}

/// Plain-text body of a low-credit notification.
pub fn render_notification(account: &AccountInfo, limit: i64) -> String {
    format!(
        "The CloudConvert account \"{}\" <{}> has {} credits left, below the notification limit of {}.\n\
         Top up the account at https://cloudconvert.com/dashboard to keep conversions running.",
        account.username, account.email, account.credits, limit
    )
}

/// Default notifier: writes the notification to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl CreditNotifier for LogNotifier {
    async fn notify(
        &self,
        account: &AccountInfo,
        limit: i64,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        warn!(
            subject = NOTIFICATION_SUBJECT,
            recipients = %recipients.join(", "),
            "{}",
            render_notification(account, limit)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_notification() {
        let account = AccountInfo {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            credits: 7,
        };
        let body = render_notification(&account, 10);
        assert!(body.contains("\"alice\""));
        assert!(body.contains("<alice@example.com>"));
        assert!(body.contains("7 credits left"));
        assert!(body.contains("limit of 10"));
    }

    #[tokio::test]
    async fn test_log_notifier_succeeds() {
        let account = AccountInfo {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            credits: 1,
        };
        LogNotifier
            .notify(&account, 5, &["ops@example.com".to_string()])
            .await
            .unwrap();
    }
}
