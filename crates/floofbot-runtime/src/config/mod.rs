//! Configuration for the Floofbot runtime.
//!
//! Settings are read from a YAML file (`floofbot.yaml`), overridden by
//! `FLOOFBOT_*` environment variables, and validated before the host starts.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, PROFILE_VAR};
pub use schema::{FloofbotConfig, LogConfig, LogFormat, LogRotation};
pub use validation::validate_config;
