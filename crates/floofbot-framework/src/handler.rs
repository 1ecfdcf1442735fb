//! Handler traits.
//!
//! Handlers are plain async functions. Blanket implementations let any
//! `async fn(Host, CommandEvent, Args) -> HandlerResult` be registered as a
//! command, and any `async fn(Host) -> HandlerResult` as a setup callback:
//!
//! ```rust,ignore
//! async fn ping(host: Host, event: CommandEvent, _args: Args) -> HandlerResult {
//!     host.reply(&event, "Pong!").await
//! }
//! ```
//!
//! Callback handlers come in two shapes (raw payload text or decoded
//! [`Args`]); the registrar wraps them in [`RawCallback`] and
//! [`StructuredCallback`] so both are stored behind one [`CallbackHandler`]
//! object.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use floofbot_core::{CallbackEvent, CommandEvent, Failure, HandlerResult};

use crate::host::Host;
use crate::schema::Args;

/// Future returned by every type-erased handler.
pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

// =============================================================================
// Commands
// =============================================================================

/// A command handler.
pub trait CommandHandler: Send + Sync + 'static {
    fn call(&self, host: Host, event: CommandEvent, args: Args) -> HandlerFuture;
}

impl<F, Fut> CommandHandler for F
where
    F: Fn(Host, CommandEvent, Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, host: Host, event: CommandEvent, args: Args) -> HandlerFuture {
        Box::pin(self(host, event, args))
    }
}

pub type BoxedCommandHandler = Arc<dyn CommandHandler>;

// =============================================================================
// Callbacks
// =============================================================================

/// The decoded payload of a callback token.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackPayload {
    Raw(String),
    Structured(Args),
}

/// A callback handler, type-erased over its payload shape.
pub trait CallbackHandler: Send + Sync + 'static {
    fn call(&self, host: Host, event: CallbackEvent, payload: CallbackPayload) -> HandlerFuture;
}

pub type BoxedCallbackHandler = Arc<dyn CallbackHandler>;

/// Adapts `async fn(Host, CallbackEvent, String)`.
pub struct RawCallback<F>(pub F);

impl<F, Fut> CallbackHandler for RawCallback<F>
where
    F: Fn(Host, CallbackEvent, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, host: Host, event: CallbackEvent, payload: CallbackPayload) -> HandlerFuture {
        match payload {
            CallbackPayload::Raw(text) => Box::pin((self.0)(host, event, text)),
            CallbackPayload::Structured(_) => mismatched(&event, "raw", "structured"),
        }
    }
}

/// Adapts `async fn(Host, CallbackEvent, Args)`.
pub struct StructuredCallback<F>(pub F);

impl<F, Fut> CallbackHandler for StructuredCallback<F>
where
    F: Fn(Host, CallbackEvent, Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, host: Host, event: CallbackEvent, payload: CallbackPayload) -> HandlerFuture {
        match payload {
            CallbackPayload::Structured(args) => Box::pin((self.0)(host, event, args)),
            CallbackPayload::Raw(_) => mismatched(&event, "structured", "raw"),
        }
    }
}

fn mismatched(event: &CallbackEvent, expected: &str, got: &str) -> HandlerFuture {
    let failure = Failure::unclassified(format!(
        "callback '{}' expects a {expected} payload but was given a {got} one",
        event.data
    ));
    Box::pin(async move { Err(failure) })
}

// =============================================================================
// Setup
// =============================================================================

/// A deferred setup callback, run once with the live host after loading.
pub trait SetupHandler: Send + Sync + 'static {
    fn call(&self, host: Host) -> HandlerFuture;
}

impl<F, Fut> SetupHandler for F
where
    F: Fn(Host) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, host: Host) -> HandlerFuture {
        Box::pin(self(host))
    }
}

pub type BoxedSetupHandler = Arc<dyn SetupHandler>;

/// Infers a command name from a handler's type.
///
/// Function items are named after their last path segment
/// (`my_plugin::commands::ping` becomes `ping`). Closures have no usable
/// identifier and yield `None`.
pub(crate) fn infer_name<H>() -> Option<&'static str> {
    let full = std::any::type_name::<H>();
    let path = full.split('<').next().unwrap_or(full);
    let last = path.rsplit("::").next()?;
    if last.is_empty() || last.contains('{') {
        None
    } else {
        Some(last)
    }
}
