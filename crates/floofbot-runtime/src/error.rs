//! Runtime error types.

use thiserror::Error;

use floofbot_core::LoaderError;

use crate::config::ConfigError;
use crate::logging::LoggingError;

/// Errors that can occur while bringing up or running the host.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The logging subscriber could not be installed.
    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// Plugin loading or setup aborted startup.
    #[error("Startup aborted: {0}")]
    Loader(#[from] LoaderError),

    /// A termination signal handler could not be registered.
    #[error("Failed to listen for termination signals: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
