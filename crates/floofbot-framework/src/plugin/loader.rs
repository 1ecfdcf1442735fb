use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use floofbot_core::{Failure, LoaderError};

use crate::callback::CallbackRegistry;
use crate::command::CommandRegistry;
use crate::handler::BoxedSetupHandler;
use crate::host::Host;
use crate::registry::Registry;

use super::Plugin;
use super::registrar::Registrar;

/// A setup callback waiting for the live host.
pub struct PendingSetup {
    plugin: &'static str,
    handler: BoxedSetupHandler,
}

impl PendingSetup {
    pub(crate) fn new(plugin: &'static str, handler: BoxedSetupHandler) -> Self {
        Self { plugin, handler }
    }

    pub fn plugin(&self) -> &'static str {
        self.plugin
    }
}

impl fmt::Debug for PendingSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSetup")
            .field("plugin", &self.plugin)
            .finish()
    }
}

/// Runs the load phase.
///
/// Each plugin's registration function is called at most once; loading a
/// plugin whose name was already loaded is a no-op. [`finish`](Self::finish)
/// ends the phase and freezes the registries.
#[derive(Debug, Default)]
pub struct PluginLoader {
    loaded: HashSet<&'static str>,
    commands: CommandRegistry,
    callbacks: CallbackRegistry,
    setups: Vec<PendingSetup>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `plugin` unless it is already loaded.
    ///
    /// Returns `false` for a repeated load.
    pub fn load(&mut self, plugin: &Plugin) -> Result<bool, LoaderError> {
        if !self.loaded.insert(plugin.name()) {
            debug!(plugin = plugin.name(), "Plugin already loaded, skipping");
            return Ok(false);
        }

        let mut registrar = Registrar::new(
            plugin.name(),
            &mut self.commands,
            &mut self.callbacks,
            &mut self.setups,
        );
        plugin.register(&mut registrar)?;

        info!(plugin = plugin.name(), "Loaded plugin");
        Ok(true)
    }

    /// Loads every plugin in order, stopping at the first error.
    pub fn load_all<'p>(
        &mut self,
        plugins: impl IntoIterator<Item = &'p Plugin>,
    ) -> Result<(), LoaderError> {
        for plugin in plugins {
            self.load(plugin)?;
        }
        Ok(())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    /// Ends the load phase.
    pub fn finish(self) -> (Registry, Vec<PendingSetup>) {
        debug!(
            commands = self.commands.len(),
            callbacks = self.callbacks.len(),
            setups = self.setups.len(),
            "Registries frozen"
        );
        (Registry::new(self.commands, self.callbacks), self.setups)
    }
}

/// Runs deferred setups in registration order.
///
/// The first failure aborts the sequence and is reported as a loader error.
pub async fn run_setups(host: &Host, setups: Vec<PendingSetup>) -> Result<(), LoaderError> {
    for setup in setups {
        debug!(plugin = setup.plugin, "Running plugin setup");
        setup
            .handler
            .call(host.clone())
            .await
            .map_err(|failure: Failure| {
                warn!(plugin = setup.plugin, error = %failure, "Plugin setup failed");
                LoaderError::Setup {
                    plugin: setup.plugin.to_string(),
                    message: failure.to_string(),
                }
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Args;
    use floofbot_core::{CommandEvent, HandlerResult};

    async fn ping(_host: Host, _event: CommandEvent, _args: Args) -> HandlerResult {
        Ok(())
    }

    fn register_ping(r: &mut Registrar<'_>) -> Result<(), LoaderError> {
        r.command("ping").handler(ping)
    }

    fn register_inferred(r: &mut Registrar<'_>) -> Result<(), LoaderError> {
        r.command_fn(ping)
    }

    fn register_closure(r: &mut Registrar<'_>) -> Result<(), LoaderError> {
        r.command_fn(|_: Host, _: CommandEvent, _: Args| async { HandlerResult::Ok(()) })
    }

    #[test]
    fn test_load_is_idempotent() {
        let plugin = Plugin::new("pinger", register_ping);
        let mut loader = PluginLoader::new();

        assert!(loader.load(&plugin).unwrap());
        assert!(!loader.load(&plugin).unwrap());
        assert!(loader.is_loaded("pinger"));

        let (registry, setups) = loader.finish();
        assert_eq!(registry.commands().len(), 1);
        assert!(setups.is_empty());
    }

    #[test]
    fn test_duplicates_detected_in_either_order() {
        let first = Plugin::new("first", register_ping);
        let second = Plugin::new("second", register_inferred);

        for (a, b) in [(first, second), (second, first)] {
            let mut loader = PluginLoader::new();
            loader.load(&a).unwrap();
            let err = loader.load(&b).unwrap_err();
            assert_eq!(
                err,
                LoaderError::DuplicateCommand {
                    name: "ping".into(),
                    plugin: b.name().into(),
                }
            );
        }
    }

    #[test]
    fn test_closures_need_a_name() {
        let mut loader = PluginLoader::new();
        let err = loader
            .load(&Plugin::new("closure", register_closure))
            .unwrap_err();
        assert!(matches!(err, LoaderError::UnnamedHandler { .. }));
    }
}
