//! Runtime orchestration: configuration, logging and the event loop.
//!
//! ```rust,ignore
//! use floofbot_runtime::FloofbotRuntime;
//!
//! let runtime = FloofbotRuntime::builder()
//!     .config_file("config/floofbot.yaml")
//!     .profile("production")
//!     .build()?;
//!
//! let session = runtime.start(platform, store, builtin::all()).await?;
//! session.run(events).await?;
//! ```

use std::path::Path;

use tokio::signal;
use tracing::{debug, info};

use floofbot_core::{BoxedPlatform, BoxedStore, Event, EventSource};
use floofbot_framework::{DispatchOutcome, Dispatcher, GLOBAL_SLOT, Host, InstanceSlot, Plugin};

use crate::config::{ConfigLoader, FloofbotConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging::{LoggingBuilder, LoggingError};

/// A configured runtime, ready to start a host.
#[derive(Debug)]
pub struct FloofbotRuntime {
    config: FloofbotConfig,
    slot: &'static InstanceSlot,
}

impl FloofbotRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Logging is not initialized here; use [`LoggingBuilder::from_config`].
    pub fn from_config(config: FloofbotConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        Ok(Self {
            config,
            slot: &GLOBAL_SLOT,
        })
    }

    pub fn config(&self) -> &FloofbotConfig {
        &self.config
    }

    /// Loads `plugins` plus every statically linked plugin and runs their
    /// setup hooks.
    ///
    /// Fails if another host is alive or any plugin fails to load.
    pub async fn start(
        &self,
        platform: BoxedPlatform,
        store: BoxedStore,
        plugins: impl IntoIterator<Item = Plugin>,
    ) -> RuntimeResult<Session> {
        if let Some(database) = &self.config.database {
            debug!(database = %database, "Persistence configured");
        }

        let host = Host::builder(platform)
            .store(store)
            .instance_slot(self.slot)
            .plugins(plugins)
            .linked_plugins()
            .plugin_configs(self.config.plugins.clone())
            .main_group(self.config.main_group)
            .admin_groups(self.config.admin_groups.iter().copied())
            .build()
            .await?;

        info!(commands = ?host.registry().sorted_command_names(), "Runtime started");

        Ok(Session {
            dispatcher: Dispatcher::new(host),
        })
    }
}

/// A running host and its dispatcher.
#[derive(Debug)]
pub struct Session {
    dispatcher: Dispatcher,
}

impl Session {
    pub fn host(&self) -> &Host {
        self.dispatcher.host()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatches a single event outside the loop.
    pub async fn dispatch(&self, event: Event) -> DispatchOutcome {
        self.dispatcher.dispatch(event).await
    }

    /// Consumes events one at a time until shutdown.
    ///
    /// The loop ends when the host shuts down (critical failure or
    /// [`Host::shutdown`]), on Ctrl+C or SIGTERM, or when `source` is
    /// exhausted. The event being dispatched when shutdown is requested
    /// finishes first.
    pub async fn run<E: EventSource>(self, mut source: E) -> RuntimeResult<()> {
        let host = self.dispatcher.host().clone();
        let token = host.shutdown_token();
        let terminate = wait_for_signal()?;
        tokio::pin!(terminate);

        info!("Floofbot is now running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    info!("Shutdown requested, leaving event loop");
                    break;
                }
                _ = &mut terminate => {
                    host.shutdown();
                    break;
                }
                event = source.next_event() => match event {
                    Some(event) => {
                        self.dispatcher.dispatch(event).await;
                    }
                    None => {
                        info!("Event source closed");
                        host.shutdown();
                        break;
                    }
                },
            }
        }

        info!("Runtime stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
#[cfg(unix)]
fn wait_for_signal() -> RuntimeResult<impl Future<Output = ()>> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }
    })
}

#[cfg(not(unix))]
fn wait_for_signal() -> RuntimeResult<impl Future<Output = ()>> {
    Ok(async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    })
}

/// Builder for creating a [`FloofbotRuntime`].
///
/// Configuration sources are described in [`crate::config::loader`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    init_logging: bool,
    slot: &'static InstanceSlot,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            init_logging: true,
            slot: &GLOBAL_SLOT,
        }
    }

    fn map_loader(mut self, f: impl FnOnce(ConfigLoader) -> ConfigLoader) -> Self {
        self.config_loader = f(self.config_loader);
        self
    }

    /// Reads `path` instead of searching for `floofbot.yaml`.
    pub fn config_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.map_loader(|loader| loader.file(path))
    }

    /// Selects the `floofbot.<profile>.yaml` overrides.
    pub fn profile(self, profile: impl Into<String>) -> Self {
        self.map_loader(|loader| loader.profile(profile))
    }

    pub fn search_path<P: AsRef<Path>>(self, dir: P) -> Self {
        self.map_loader(|loader| loader.search_path(dir))
    }

    /// Disables `FLOOFBOT_*` environment overrides.
    pub fn without_env(self) -> Self {
        self.map_loader(ConfigLoader::without_env)
    }

    /// Supplies values that the configuration file may override.
    pub fn merge(self, config: FloofbotConfig) -> Self {
        self.map_loader(|loader| loader.merge(config))
    }

    /// Leaves the global subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Uses `slot` instead of the process-wide one.
    pub fn instance_slot(mut self, slot: &'static InstanceSlot) -> Self {
        self.slot = slot;
        self
    }

    /// Loads and validates the configuration, then installs logging.
    ///
    /// An already installed subscriber is kept.
    pub fn build(self) -> RuntimeResult<FloofbotRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;

        if self.init_logging {
            match LoggingBuilder::from_config(&config).try_init() {
                Ok(()) => {}
                Err(LoggingError::Init(e)) => debug!(error = %e, "Keeping existing subscriber"),
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            debug = config.debug,
            admin_groups = config.admin_groups.len(),
            plugins = config.plugins.len(),
            "Configuration accepted"
        );

        Ok(FloofbotRuntime {
            config,
            slot: self.slot,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
