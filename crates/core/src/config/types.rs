use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::cloudconvert::{CloudConvertConfig, ImportMethod};
use crate::credits::CreditMonitorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub cloudconvert: CloudConvertConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub credit_monitor: CreditMonitorConfig,
    /// Show a credit alert when fewer credits remain (0 = disabled).
    #[serde(default)]
    pub backend_alert_credit_limit: u32,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory HTTP callers may read sources from and write targets to.
    /// Relative request paths are resolved against it.
    #[serde(default = "default_files_root")]
    pub files_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            files_root: default_files_root(),
        }
    }
}

fn default_files_root() -> PathBuf {
    PathBuf::from("var/files")
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when `method = "api_key"`.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration (audit log)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("convertino.db")
}

/// Conversion cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Root directory; entries live at `<dir>/<format>/<cache_key>`.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("var/cache/convertino")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cloudconvert: SanitizedCloudConvertConfig,
    pub cache: CacheConfig,
    pub credit_monitor: SanitizedCreditMonitorConfig,
    pub backend_alert_credit_limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
}

/// Sanitized CloudConvert config (API keys hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCloudConvertConfig {
    pub api_url: String,
    pub sandbox_api_url: String,
    pub api_key_configured: bool,
    pub sandbox_api_key_configured: bool,
    pub import_method: ImportMethod,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

/// Sanitized credit monitor config (recipients counted, not listed)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCreditMonitorConfig {
    pub enabled: bool,
    pub limit: i64,
    pub recipients: usize,
    pub interval_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let cc = &config.cloudconvert;
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
            },
            server: config.server.clone(),
            database: config.database.clone(),
            cloudconvert: SanitizedCloudConvertConfig {
                api_url: cc.api_url.clone(),
                sandbox_api_url: cc.sandbox_api_url.clone(),
                api_key_configured: !cc.api_key.is_empty(),
                sandbox_api_key_configured: cc
                    .sandbox_api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                import_method: cc.import_method,
                poll_interval_ms: cc.poll_interval_ms,
                timeout_secs: cc.timeout_secs,
            },
            cache: config.cache.clone(),
            credit_monitor: SanitizedCreditMonitorConfig {
                enabled: config.credit_monitor.enabled,
                limit: config.credit_monitor.limit,
                recipients: config.credit_monitor.emails.len(),
                interval_secs: config.credit_monitor.interval_secs,
            },
            backend_alert_credit_limit: config.backend_alert_credit_limit,
        }
    }
}
