//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{FloofbotConfig, LogConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &FloofbotConfig) -> ConfigResult<()> {
    if config.token.trim().is_empty() {
        return Err(ConfigError::invalid("token", "must not be empty"));
    }

    validate_log_config(&config.log)
}

fn validate_log_config(log: &LogConfig) -> ConfigResult<()> {
    log.rotation()?;

    if log.max_files == 0 {
        return Err(ConfigError::invalid("log.max_files", "must be at least 1"));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
    for (module, level) in &log.filters {
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                format!("log.filters.{module}"),
                format!("is not a log level: {level:?}"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> FloofbotConfig {
        FloofbotConfig {
            token: "123:abc".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut config = valid();
        config.token = "  ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid { field, .. }) if field == "token"
        ));
    }

    #[test]
    fn test_unknown_rotation_rejected() {
        let mut config = valid();
        config.log.rotation = "fortnightly".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("fortnightly"));
    }

    #[test]
    fn test_zero_max_files_rejected() {
        let mut config = valid();
        config.log.max_files = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_filter_level_rejected() {
        let mut config = valid();
        config
            .log
            .filters
            .insert("floofbot_framework".to_string(), "loud".to_string());
        assert!(validate_config(&config).is_err());
    }
}
