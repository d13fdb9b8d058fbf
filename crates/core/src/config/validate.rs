use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - A files root is set
/// - A CloudConvert API key is set
/// - Job polling interval and timeout are positive
/// - Credit monitor interval is positive when the monitor is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.files_root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "server.files_root cannot be empty".to_string(),
        ));
    }

    if config.cloudconvert.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "cloudconvert.api_key cannot be empty".to_string(),
        ));
    }

    if config.cloudconvert.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "cloudconvert.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.cloudconvert.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cloudconvert.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.credit_monitor.enabled && config.credit_monitor.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "credit_monitor.interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
