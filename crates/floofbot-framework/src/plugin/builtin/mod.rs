//! Built-in plugins shipped with Floofbot.
//!
//! Enabled by the `builtin` feature flag (on by default).
//!
//! | Plugin | Commands | Callbacks |
//! |--------|----------|-----------|
//! | [`EXTRA_PLUGIN`] | `/ping`, `/id`, `/help` | `help_menu_page` |
//!
//! # Loading built-in plugins
//!
//! ```rust,ignore
//! let host = Host::builder(platform)
//!     .plugins(builtin::all())
//!     .build()
//!     .await?;
//! ```

pub mod extra;

pub use extra::EXTRA_PLUGIN;

use super::Plugin;

/// Every built-in plugin.
pub fn all() -> Vec<Plugin> {
    vec![EXTRA_PLUGIN]
}
