//! Failure classification and reporting.
//!
//! [`classify`] is a pure function deciding what a [`Failure`] turns into:
//! a notice for the originating chat, a log level, an admin escalation and
//! whether the host shuts down. [`Reporter`] carries the decision out.
//! [`ReportLayer`] wraps the dispatch pipeline so every failure it produces
//! is reported exactly once.
//!
//! Precedence, first match wins:
//!
//! 1. Syntax failures render the message plus the command help.
//! 2. Flagged failures honor `critical`, `silent` and `notify`.
//! 3. Unclassified failures get a generic notice, unless benign.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tower_layer::Layer;
use tracing::{Level, debug, error, info, warn};

use floofbot_core::{ChatId, Event, Failure, FailureKind, escape_markdown};

use crate::dispatcher::DispatchOutcome;
use crate::host::Host;

/// What to do with a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    /// MarkdownV2 notice for the originating chat.
    pub notice: Option<String>,
    /// MarkdownV2 notice forwarded to every admin chat.
    pub escalation: Option<String>,
    /// Level the failure is logged at.
    pub level: Level,
    /// Initiate host shutdown after reporting.
    pub shutdown: bool,
}

/// Decides how `failure` is surfaced. Performs no I/O.
pub fn classify(failure: &Failure) -> Disposition {
    let severity = failure.severity();
    let titled = || {
        format!(
            "*{}:*\n{}",
            escape_markdown(failure.title()),
            escape_markdown(failure.message())
        )
    };

    match failure.kind() {
        FailureKind::Syntax => {
            let mut notice =
                escape_markdown(format!("Invalid command syntax: {}", failure.message()));
            if let Some(help) = failure.help() {
                notice.push_str("\n\n");
                notice.push_str(help);
            }
            Disposition {
                notice: Some(notice),
                escalation: None,
                level: Level::INFO,
                shutdown: false,
            }
        }
        FailureKind::Unclassified if failure.is_benign() => Disposition {
            notice: None,
            escalation: None,
            level: Level::DEBUG,
            shutdown: false,
        },
        FailureKind::Unclassified => Disposition {
            notice: (!severity.silent).then(|| {
                format!(
                    "*An unhandled exception occurred:*\n{}",
                    escape_markdown(failure.message())
                )
            }),
            escalation: severity.notify.then(titled),
            level: Level::ERROR,
            shutdown: severity.critical,
        },
        FailureKind::Loader | FailureKind::Permissions | FailureKind::Domain => Disposition {
            notice: (!severity.silent).then(titled),
            escalation: severity.notify.then(titled),
            level: Level::ERROR,
            shutdown: severity.critical,
        },
    }
}

/// Carries out the [`Disposition`] of failures.
#[derive(Debug, Clone)]
pub struct Reporter {
    host: Host,
}

impl Reporter {
    pub fn new(host: Host) -> Self {
        Self { host }
    }

    /// Reports `failure` raised while handling an event from `chat`.
    ///
    /// Never fails: problems delivering notices are logged and dropped.
    pub async fn report(&self, failure: Failure, chat: Option<ChatId>) {
        let disposition = classify(&failure);
        log_failure(&failure, &disposition);

        if let (Some(notice), Some(chat)) = (&disposition.notice, chat) {
            self.deliver(chat, notice).await;
        }
        if let Some(escalation) = &disposition.escalation {
            for &group in self.host.admin_groups() {
                self.deliver(group, escalation).await;
            }
        }
        if disposition.shutdown {
            self.host.shutdown();
        }
    }

    async fn deliver(&self, chat: ChatId, text: &str) {
        if let Err(err) = self.host.send_markdown(chat, text, None).await {
            warn!(chat, error = %err, "Failed to deliver failure notice");
        }
    }
}

fn log_failure(failure: &Failure, disposition: &Disposition) {
    let kind = failure.kind();
    let source = std::error::Error::source(failure).map(ToString::to_string);

    if disposition.shutdown {
        error!(?kind, ?source, "The bot is shutting down due to a critical failure: {failure}");
    } else if disposition.level == Level::ERROR {
        error!(?kind, ?source, "{}: {failure}", failure.title());
    } else if disposition.level == Level::INFO {
        info!(?kind, "{}: {failure}", failure.title());
    } else {
        debug!(?kind, "Suppressed benign failure: {failure}");
    }
}

// =============================================================================
// Tower layer
// =============================================================================

/// Wraps a dispatch service so failures are reported instead of returned.
#[derive(Debug, Clone)]
pub struct ReportLayer {
    reporter: Reporter,
}

impl ReportLayer {
    pub fn new(host: Host) -> Self {
        Self {
            reporter: Reporter::new(host),
        }
    }
}

impl<S> Layer<S> for ReportLayer {
    type Service = ReportService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ReportService {
            inner,
            reporter: self.reporter.clone(),
        }
    }
}

/// Service produced by [`ReportLayer`].
#[derive(Debug, Clone)]
pub struct ReportService<S> {
    inner: S,
    reporter: Reporter,
}

impl<S> Service<Event> for ReportService<S>
where
    S: Service<Event, Response = DispatchOutcome, Error = Failure> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = DispatchOutcome;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.inner.poll_ready(cx) {
            Poll::Ready(Err(failure)) => {
                error!(error = %failure, "Dispatch service unavailable");
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            Poll::Pending => Poll::Pending,
        }
    }

    fn call(&mut self, event: Event) -> Self::Future {
        let chat = event.chat_id();
        let reporter = self.reporter.clone();
        let future = self.inner.call(event);

        Box::pin(async move {
            match future.await {
                Ok(outcome) => Ok(outcome),
                Err(failure) => {
                    reporter.report(failure, chat).await;
                    Ok(DispatchOutcome::Failed)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floofbot_core::ApiError;

    #[test]
    fn test_syntax_failures_render_help() {
        let failure = Failure::syntax("argument count: invalid integer value: 'abc'")
            .with_help("Syntax: `/count count`");
        let disposition = classify(&failure);
        assert_eq!(
            disposition.notice.as_deref(),
            Some(
                "Invalid command syntax: argument count: invalid integer value: 'abc'\n\n\
                 Syntax: `/count count`"
            )
        );
        assert!(!disposition.shutdown);
        assert_eq!(disposition.level, Level::INFO);
    }

    #[test]
    fn test_syntax_failures_are_never_critical() {
        let disposition = classify(&Failure::syntax("bad").critical());
        assert!(!disposition.shutdown);
        assert!(disposition.notice.is_some());
    }

    #[test]
    fn test_titled_notice() {
        let failure = Failure::domain("User not found", "Could not resolve user @nobody.");
        assert_eq!(
            classify(&failure).notice.as_deref(),
            Some("*User not found:*\nCould not resolve user @nobody\\.")
        );
    }

    #[test]
    fn test_critical_failures_shut_down() {
        let disposition = classify(&Failure::domain("Broken", "state").critical());
        assert!(disposition.shutdown);
        assert_eq!(disposition.level, Level::ERROR);
        assert!(disposition.notice.is_some());
    }

    #[test]
    fn test_silent_failures_send_nothing_but_log() {
        let disposition = classify(&Failure::permissions("nope").silent());
        assert_eq!(disposition.notice, None);
        assert_eq!(disposition.level, Level::ERROR);
    }

    #[test]
    fn test_notify_escalates() {
        let disposition = classify(&Failure::permissions("nope").silent().notify());
        assert_eq!(disposition.notice, None);
        assert_eq!(
            disposition.escalation.as_deref(),
            Some("*Permissions error:*\nnope")
        );
    }

    #[test]
    fn test_unclassified_generic_notice() {
        let disposition = classify(&Failure::from(ApiError::Timeout));
        assert_eq!(
            disposition.notice.as_deref(),
            Some("*An unhandled exception occurred:*\nplatform call timed out")
        );
        assert_eq!(disposition.level, Level::ERROR);
    }

    #[test]
    fn test_benign_failures_are_suppressed() {
        let disposition = classify(&Failure::from(ApiError::bad_request(
            "Message is not modified: specified new message content is the same",
        )));
        assert_eq!(disposition.notice, None);
        assert_eq!(disposition.escalation, None);
        assert!(!disposition.shutdown);
    }
}
