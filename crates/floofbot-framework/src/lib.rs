//! # Floofbot Framework
//!
//! Everything between an inbound event and a handler:
//!
//! - Argument schemas compiled into positional parsers ([`schema`])
//! - Command and callback registries, frozen after the load phase
//! - Plugin registration and loading ([`plugin`])
//! - The live [`Host`] handle and its single-instance guard
//! - The [`Dispatcher`] pipeline (match, parse, invoke) wrapped by the
//!   failure [`report`]er
//!
//! Built-in plugins (`/ping`, `/id`, `/help`) live behind the `builtin`
//! feature.

pub mod callback;
pub mod command;
pub mod dispatcher;
pub mod handler;
pub mod help;
pub mod host;
pub mod plugin;
pub mod registry;
pub mod report;
pub mod schema;
pub mod split;

pub use callback::{CallbackEntry, CallbackRegistry, DecodeMode, callback_token, split_token};
pub use command::{CommandEntry, CommandRegistry};
pub use dispatcher::{DispatchOutcome, Dispatcher, PipelineService};
pub use handler::{CallbackHandler, CallbackPayload, CommandHandler, SetupHandler};
pub use help::HelpData;
pub use host::{GLOBAL_SLOT, Host, HostBuilder, InstanceSlot};
pub use plugin::{LINKED_PLUGINS, Plugin, PluginLoader, Registrar, linked_plugins};
pub use registry::Registry;
pub use report::{Disposition, ReportLayer, Reporter, classify};
pub use schema::{
    ArgValue, ArgumentField, ArgumentHelp, ArgumentSchema, Args, CompiledParser, FieldType,
    ParseError, Primitive,
};
pub use split::{SplitError, shell_split};

/// Re-exported so downstream crates can place plugins in [`LINKED_PLUGINS`]
/// without depending on `linkme` themselves.
pub use linkme;
