//! Configuration for the credit monitor.

use serde::{Deserialize, Serialize};

/// `[credit_monitor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditMonitorConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Notify when the remaining credits drop below this value.
    #[serde(default)]
    pub limit: i64,

    /// Notification recipients. Invalid addresses are dropped at startup.
    #[serde(default)]
    pub emails: Vec<String>,

    /// Seconds between two account checks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for CreditMonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: 0,
            emails: Vec::new(),
            interval_secs: default_interval_secs(),
        }
    }
}
