//! # Floofbot
//!
//! A chat bot host: plugins register typed commands and inline-button
//! callbacks, and a single dispatcher turns inbound events into handler
//! calls, replying with help text when arguments do not parse.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────────┐     ┌──────────┐
//! │ EventSource  │────▶│ Dispatcher                   │────▶│ handlers │──▶ Platform
//! │ (platform)   │     │  ReportLayer ▶ match ▶ parse │     └──────────┘
//! └──────────────┘     └──────────────────────────────┘
//! ```
//!
//! - **Runtime**: configuration, logging, the event loop
//! - **Plugins**: named registration functions, loaded once at startup
//! - **Registries**: commands by name, callbacks by key, frozen after load
//! - **Reporter**: turns handler failures into user notices, admin
//!   escalations and, for critical ones, a shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use floofbot::prelude::*;
//!
//! async fn hello(host: Host, event: CommandEvent, args: Args) -> HandlerResult {
//!     let name = args.text("name").unwrap_or("stranger");
//!     host.reply(&event, &format!("Hello, {name}!")).await
//! }
//!
//! fn register(r: &mut Registrar<'_>) -> Result<(), LoaderError> {
//!     r.command("hello")
//!         .help("Greets someone")
//!         .schema(ArgumentSchema::new().field(ArgumentField::text("name").optional()))
//!         .handler(hello)?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = FloofbotRuntime::builder().build()?;
//!     let session = runtime
//!         .start(platform, store, [Plugin::new("greeter", register)])
//!         .await?;
//!     session.run(events).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `testing`: in-memory `MockPlatform` for tests and demos
//! - `json-log`: JSON log output

pub use floofbot_core as core;
pub use floofbot_framework as framework;
pub use floofbot_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use floofbot::prelude::*;
/// ```
pub mod prelude {
    // Runtime
    pub use floofbot_runtime::{FloofbotConfig, FloofbotRuntime, Session};

    // Events and collaborators
    pub use floofbot_core::{
        ApiError, CallbackEvent, ChatId, CommandEvent, Event, EventSource, InlineButton,
        InlineKeyboard, MemoryStore, MessageRef, ParseMode, Platform, Record, Store, User, UserId,
        escape_markdown,
    };

    // Failures
    pub use floofbot_core::{Failure, HandlerResult, LoaderError};

    // Plugins and handlers
    pub use floofbot_framework::plugin::builtin;
    pub use floofbot_framework::{
        ArgumentField, ArgumentSchema, Args, Host, LINKED_PLUGINS, Plugin, Registrar,
        callback_token,
    };

    pub use floofbot_runtime::tracing::{debug, error, info, trace, warn};
}
