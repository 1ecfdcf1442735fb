//! Plugin system.
//!
//! A plugin is a named registration function. The loader calls it once with
//! a [`Registrar`] during the load phase, when commands, callbacks and setup
//! hooks are declared:
//!
//! ```rust,ignore
//! use floofbot_framework::plugin::{Plugin, Registrar};
//!
//! pub static GREETER: Plugin = Plugin::new("greeter", register);
//!
//! fn register(r: &mut Registrar<'_>) -> Result<(), LoaderError> {
//!     r.command("hello").help("Says hello").handler(hello)?;
//!     r.setup(announce);
//!     Ok(())
//! }
//! ```
//!
//! Plugins can also be linked in statically. Every static placed in
//! [`LINKED_PLUGINS`] is picked up by [`linked_plugins`]:
//!
//! ```rust,ignore
//! #[distributed_slice(LINKED_PLUGINS)]
//! static GREETER: Plugin = Plugin::new("greeter", register);
//! ```

mod loader;
mod registrar;

#[cfg(feature = "builtin")]
pub mod builtin;

use std::fmt;

use linkme::distributed_slice;

use floofbot_core::LoaderError;

pub use loader::{PendingSetup, PluginLoader, run_setups};
pub use registrar::{CallbackBuilder, CommandBuilder, Registrar};

/// Registration function of a plugin.
pub type RegisterFn = fn(&mut Registrar<'_>) -> Result<(), LoaderError>;

/// A named plugin.
#[derive(Clone, Copy)]
pub struct Plugin {
    name: &'static str,
    register: RegisterFn,
}

impl Plugin {
    pub const fn new(name: &'static str, register: RegisterFn) -> Self {
        Self { name, register }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), LoaderError> {
        (self.register)(registrar)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name).finish()
    }
}

/// Plugins linked into the binary.
#[distributed_slice]
pub static LINKED_PLUGINS: [Plugin];

/// Every statically linked plugin, sorted by name.
pub fn linked_plugins() -> Vec<Plugin> {
    let mut plugins: Vec<Plugin> = LINKED_PLUGINS.iter().copied().collect();
    plugins.sort_by_key(Plugin::name);
    plugins
}
