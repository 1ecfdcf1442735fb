//! The frozen registry shared by the dispatcher and handlers.

use crate::callback::{CallbackEntry, CallbackRegistry};
use crate::command::{CommandEntry, CommandRegistry};

/// Commands and callbacks, immutable once the load phase ends.
///
/// Only the [`PluginLoader`](crate::plugin::PluginLoader) builds one; after
/// that it is shared behind an `Arc` and read without locks.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    commands: CommandRegistry,
    callbacks: CallbackRegistry,
}

impl Registry {
    pub(crate) fn new(commands: CommandRegistry, callbacks: CallbackRegistry) -> Self {
        Self {
            commands,
            callbacks,
        }
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.lookup(name)
    }

    pub fn callback(&self, key: &str) -> Option<&CallbackEntry> {
        self.callbacks.lookup(key)
    }

    /// Command names sorted alphabetically.
    pub fn sorted_command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.list_all().map(CommandEntry::name).collect();
        names.sort_unstable();
        names
    }
}
