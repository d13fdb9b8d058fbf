//! One-shot credit alert for operators.

use serde::{Deserialize, Serialize};

use crate::cloudconvert::{ClientError, ConversionClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Error,
}

/// Message shown to operators about the account state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAlert {
    pub level: AlertLevel,
    pub message: String,
}

impl CreditAlert {
    fn info(message: String) -> Self {
        Self {
            level: AlertLevel::Info,
            message,
        }
    }

    fn error(message: &str) -> Self {
        Self {
            level: AlertLevel::Error,
            message: message.to_string(),
        }
    }
}

pub const AUTH_FAILED_MESSAGE: &str =
    "Could not authenticate against the CloudConvert API. Please check the api_key in your configuration.";
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred while querying the CloudConvert API.";

/// Returns an alert when fewer than `limit` credits remain or the account
/// cannot be read. A `limit` of 0 disables the alert without any API call.
pub async fn credit_alert(client: &dyn ConversionClient, limit: u32) -> Option<CreditAlert> {
    if limit == 0 {
        return None;
    }

    let account = match client.current_user(false).await {
        Ok(account) => account,
        Err(ClientError::AuthenticationFailed(_)) => {
            return Some(CreditAlert::error(AUTH_FAILED_MESSAGE))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Credit alert lookup failed");
            return Some(CreditAlert::error(UNEXPECTED_ERROR_MESSAGE));
        }
    };

    if account.credits < i64::from(limit) {
        Some(CreditAlert::info(format!(
            "Remaining CloudConvert credits for user \"{}\": {}",
            account.username, account.credits
        )))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConversionClient;

    #[tokio::test]
    async fn test_zero_limit_disables_alert() {
        let client = MockConversionClient::new();
        client.set_credits(0).await;

        assert_eq!(credit_alert(&client, 0).await, None);
        assert_eq!(client.account_call_count().await, 0);
    }

    #[tokio::test]
    async fn test_below_limit_reports_user_and_credits() {
        let client = MockConversionClient::new();
        client.set_credits(12).await;

        let alert = credit_alert(&client, 50).await.unwrap();
        assert_eq!(alert.level, AlertLevel::Info);
        assert_eq!(
            alert.message,
            "Remaining CloudConvert credits for user \"mock-user\": 12"
        );
    }

    #[tokio::test]
    async fn test_enough_credits_no_alert() {
        let client = MockConversionClient::new();
        client.set_credits(50).await;
        assert_eq!(credit_alert(&client, 50).await, None);
    }

    #[tokio::test]
    async fn test_auth_failure_asks_to_check_key() {
        let client = MockConversionClient::new();
        client
            .set_next_account_error(ClientError::AuthenticationFailed("Unauthenticated.".into()))
            .await;

        let alert = credit_alert(&client, 50).await.unwrap();
        assert_eq!(alert.level, AlertLevel::Error);
        assert_eq!(alert.message, AUTH_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_other_failure_is_generic() {
        let client = MockConversionClient::new();
        client.set_next_account_error(ClientError::Timeout).await;

        let alert = credit_alert(&client, 50).await.unwrap();
        assert_eq!(alert.level, AlertLevel::Error);
        assert_eq!(alert.message, UNEXPECTED_ERROR_MESSAGE);
    }
}
