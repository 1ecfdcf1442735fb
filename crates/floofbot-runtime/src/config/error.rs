//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("no configuration file at {}", .0.display())]
    NotFound(PathBuf),

    /// The merged sources do not fit [`FloofbotConfig`](super::FloofbotConfig).
    #[error("configuration could not be read: {0}")]
    Extract(Box<figment::Error>),

    /// A value is present but unusable.
    #[error("`{field}` {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
