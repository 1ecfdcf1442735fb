//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use floofbot_core::ChatId;

use super::error::ConfigError;

/// Root configuration structure.
///
/// ```yaml
/// token: "123456:ABC"
/// debug: false
/// log:
///   file: logs/floofbot.log
///   rotation: daily
///   max_files: 5
/// database: sqlite://floofbot.db
/// main_group: -1001
/// admin_groups: [-1002]
/// plugins:
///   greeter:
///     greeting: "Hi there"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloofbotConfig {
    /// Platform API token.
    #[serde(default)]
    pub token: String,

    /// Enables DEBUG level logging.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub log: LogConfig,

    /// Connection string handed to the persistence collaborator.
    #[serde(default)]
    pub database: Option<String>,

    /// The bot's home chat.
    #[serde(default)]
    pub main_group: Option<ChatId>,

    /// Chats whose members count as administrators and receive escalations.
    #[serde(default)]
    pub admin_groups: Vec<ChatId>,

    /// Free-form per-plugin sections, keyed by plugin name.
    #[serde(default)]
    pub plugins: HashMap<String, serde_json::Value>,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Rolling log file. Logs go to stdout only when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// How often the log file rolls over (`never`, `minutely`, `hourly`, `daily`).
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Number of rolled files to keep.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default)]
    pub format: LogFormat,

    /// Per-module level overrides, e.g. `floofbot_framework: trace`.
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            rotation: default_rotation(),
            max_files: default_max_files(),
            format: LogFormat::default(),
            filters: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// Parses the configured rotation.
    pub fn rotation(&self) -> Result<LogRotation, ConfigError> {
        self.rotation.parse()
    }
}

fn default_rotation() -> String {
    "daily".to_string()
}

fn default_max_files() -> usize {
    5
}

/// Console log layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log file rollover period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Never,
    Minutely,
    Hourly,
    Daily,
}

impl LogRotation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Minutely => "minutely",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

impl FromStr for LogRotation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "minutely" => Ok(Self::Minutely),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            other => Err(ConfigError::invalid(
                "log.rotation",
                format!("must be never, minutely, hourly or daily, not {other:?}"),
            )),
        }
    }
}

impl fmt::Display for LogRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogRotation> for tracing_appender::rolling::Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Never => Self::NEVER,
            LogRotation::Minutely => Self::MINUTELY,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_parse() {
        assert_eq!("Daily".parse::<LogRotation>().unwrap(), LogRotation::Daily);
        assert_eq!(" never ".parse::<LogRotation>().unwrap(), LogRotation::Never);
        assert!("weekly".parse::<LogRotation>().is_err());
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: FloofbotConfig = serde_json::from_value(serde_json::json!({
            "token": "abc",
            "admin_groups": [-5],
            "plugins": { "greeter": { "greeting": "hi" } }
        }))
        .unwrap();

        assert_eq!(config.token, "abc");
        assert!(!config.debug);
        assert_eq!(config.admin_groups, vec![-5]);
        assert_eq!(config.log.rotation, "daily");
        assert_eq!(config.log.max_files, 5);
        assert_eq!(config.plugins["greeter"]["greeting"], "hi");
    }
}
