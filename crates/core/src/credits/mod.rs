//! Account credit monitoring.
//!
//! - `CreditMonitor` checks the account periodically and notifies recipients
//!   when the remaining credits drop below the configured limit
//! - `credit_alert` produces an operator message on demand

mod alert;
mod config;
mod monitor;
mod notifier;

pub use alert::{credit_alert, AlertLevel, CreditAlert, AUTH_FAILED_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
pub use config::CreditMonitorConfig;
pub use monitor::{filter_recipients, is_valid_email, CreditCheck, CreditMonitor};
pub use notifier::{
    render_notification, CreditNotifier, LogNotifier, NotifyError, NOTIFICATION_SUBJECT,
};
