//! # Floofbot Runtime
//!
//! Turns a configuration file into a running host:
//!
//! - YAML + environment configuration ([`config`])
//! - stdout and rolling-file logging ([`logging`])
//! - the single-consumer event loop ([`FloofbotRuntime`], [`Session`])
//!
//! ```rust,ignore
//! use floofbot_runtime::FloofbotRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = FloofbotRuntime::builder().build()?;
//!     let session = runtime.start(platform, store, builtin::all()).await?;
//!     session.run(events).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, FloofbotConfig, validate_config};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingError, SpanEvents};
pub use runtime::{FloofbotRuntime, RuntimeBuilder, Session};

// Re-exported for binaries that log through the runtime's subscriber.
pub use tracing;
