//! Event dispatcher.
//!
//! Every inbound [`Event`] goes through the same pipeline:
//!
//! 1. **Match**: look the command name or callback key up in the registry.
//!    Unmatched events are ignored.
//! 2. **Parse**: run the entry's compiled parser or payload decoder.
//! 3. **Invoke**: call the handler with the host, the event and the
//!    parsed arguments.
//! 4. **Report**: any failure from steps 2 and 3 goes to the
//!    [`Reporter`](crate::report::Reporter), exactly once.
//!
//! Steps 1 to 3 are the [`PipelineService`]; step 4 is the
//! [`ReportLayer`] stacked on top of it.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(host.clone());
//! while let Some(event) = source.next_event().await {
//!     dispatcher.dispatch(event).await;
//! }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::util::BoxCloneSyncService;
use tower::{Service, ServiceBuilder, ServiceExt};
use tracing::{Instrument, Level, debug, span};

use floofbot_core::{CallbackEvent, CommandEvent, Event, Failure};

use crate::handler::{CallbackHandler, CommandHandler};
use crate::host::Host;
use crate::report::ReportLayer;

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No entry matched, or the host is shutting down.
    Ignored,
    /// The handler ran and succeeded.
    Handled,
    /// Parsing or the handler failed and the failure was reported.
    Failed,
}

/// Match, parse and invoke, without reporting.
#[derive(Debug, Clone)]
pub struct PipelineService {
    host: Host,
}

impl PipelineService {
    pub fn new(host: Host) -> Self {
        Self { host }
    }
}

impl Service<Event> for PipelineService {
    type Response = DispatchOutcome;
    type Error = Failure;
    type Future = Pin<Box<dyn Future<Output = Result<DispatchOutcome, Failure>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: Event) -> Self::Future {
        let host = self.host.clone();
        Box::pin(async move {
            match event {
                Event::Command(event) => run_command(host, event).await,
                Event::Callback(event) => run_callback(host, event).await,
                Event::Other => Ok(DispatchOutcome::Ignored),
            }
        })
    }
}

async fn run_command(host: Host, event: CommandEvent) -> Result<DispatchOutcome, Failure> {
    let Some(entry) = host.registry().command(&event.command) else {
        debug!(command = %event.command, "No command registered, ignoring");
        return Ok(DispatchOutcome::Ignored);
    };

    let args = entry.parse(&event.text)?;
    debug!(command = %event.command, plugin = entry.plugin(), "Invoking command");
    let handler = entry.handler().clone();
    handler.call(host, event, args).await?;
    Ok(DispatchOutcome::Handled)
}

async fn run_callback(host: Host, event: CallbackEvent) -> Result<DispatchOutcome, Failure> {
    let Some((entry, payload)) = host.registry().callbacks().route(&event.data) else {
        debug!(data = %event.data, "No callback registered, ignoring");
        return Ok(DispatchOutcome::Ignored);
    };

    host.platform().answer_callback(&event.id).await?;

    let payload = entry.mode().decode(payload)?;
    debug!(key = entry.key(), plugin = entry.plugin(), "Invoking callback");
    let handler = entry.handler().clone();
    handler.call(host, event, payload).await?;
    Ok(DispatchOutcome::Handled)
}

/// The full dispatch pipeline with failure reporting.
#[derive(Clone)]
pub struct Dispatcher {
    host: Host,
    service: BoxCloneSyncService<Event, DispatchOutcome, Infallible>,
}

impl Dispatcher {
    pub fn new(host: Host) -> Self {
        let service = ServiceBuilder::new()
            .layer(ReportLayer::new(host.clone()))
            .service(PipelineService::new(host.clone()));
        Self {
            host,
            service: BoxCloneSyncService::new(service),
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Dispatches one event to completion.
    ///
    /// Once shutdown has begun, events are no longer accepted.
    pub async fn dispatch(&self, event: Event) -> DispatchOutcome {
        if self.host.is_shutting_down() {
            debug!(event_name = event.event_name(), "Host is shutting down, dropping event");
            return DispatchOutcome::Ignored;
        }

        let span = span!(Level::DEBUG, "dispatch", event_name = %event.event_name());
        let outcome = self.service.clone().oneshot(event).instrument(span).await;
        match outcome {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("host", &self.host)
            .finish()
    }
}
