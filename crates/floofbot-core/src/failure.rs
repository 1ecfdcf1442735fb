//! Failure taxonomy.
//!
//! Every error that reaches the reporter is a [`Failure`]: a tagged record
//! carrying a [`FailureKind`], a message, an optional title and the
//! [`Severity`] flags that decide how it is surfaced. Handlers build
//! failures explicitly (`Failure::domain("User not found", ...)`) or let
//! `?` convert platform and storage errors into unclassified failures.
//!
//! Registration problems are reported as [`LoaderError`], which always
//! converts into a critical failure.

use thiserror::Error;

use crate::platform::{ApiError, NOT_MODIFIED_PREFIX};
use crate::store::StoreError;

/// Boxed error used as the diagnostic source of unclassified failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by every command and callback handler.
pub type HandlerResult = Result<(), Failure>;

/// Reporting flags of a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Severity {
    /// Escalate the notice to the configured admin chats.
    pub notify: bool,
    /// Shut the host down after reporting.
    pub critical: bool,
    /// Do not send a notice to the originating chat.
    pub silent: bool,
}

/// The class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Arguments could not be parsed or decoded.
    Syntax,
    /// Registration or host construction failed.
    Loader,
    /// A handler refused the caller.
    Permissions,
    /// A handler-declared failure (lookup miss, invalid state, ...).
    Domain,
    /// Any other runtime fault.
    Unclassified,
}

impl FailureKind {
    /// Title used when the failure does not carry one.
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Syntax => "Syntax error",
            Self::Loader => "Loader error",
            Self::Permissions => "Permissions error",
            Self::Domain => "Error",
            Self::Unclassified => "Unhandled exception",
        }
    }
}

/// A classified failure raised by a handler or by the dispatch pipeline.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Failure {
    kind: FailureKind,
    message: String,
    title: Option<String>,
    severity: Severity,
    help: Option<String>,
    #[source]
    source: Option<BoxError>,
}

impl Failure {
    /// Creates a failure of the given kind with default flags.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            title: None,
            severity: Severity::default(),
            help: None,
            source: None,
        }
    }

    /// Arguments could not be parsed. Never critical.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Syntax, message)
    }

    /// A load-time failure. Always critical.
    pub fn loader(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Loader, message).critical()
    }

    /// The caller is not allowed to run the handler.
    pub fn permissions(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Permissions, message)
    }

    /// A handler-declared failure shown to the user as `title: message`.
    pub fn domain(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Domain, message).with_title(title)
    }

    /// Wraps an arbitrary error as an unclassified failure.
    pub fn unclassified<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        let source: BoxError = error.into();
        Self {
            message: source.to_string(),
            source: Some(source),
            ..Self::new(FailureKind::Unclassified, String::new())
        }
    }

    /// Sets the human readable title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attaches MarkdownV2 help text rendered after the message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Replaces all severity flags.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Marks the failure as critical: reporting it shuts the host down.
    pub fn critical(mut self) -> Self {
        self.severity.critical = true;
        self
    }

    /// Suppresses the notice to the originating chat.
    pub fn silent(mut self) -> Self {
        self.severity.silent = true;
        self
    }

    /// Escalates the notice to the admin chats.
    pub fn notify(mut self) -> Self {
        self.severity.notify = true;
        self
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The explicit title, or the kind's default title.
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.kind.default_title())
    }

    pub fn is_critical(&self) -> bool {
        self.severity.critical
    }

    /// Returns `true` for the platform's "message is not modified" response,
    /// which signals an idempotent edit rather than a fault.
    pub fn is_benign(&self) -> bool {
        if self.kind != FailureKind::Unclassified {
            return false;
        }
        let api_not_modified = self
            .source
            .as_deref()
            .and_then(|e| e.downcast_ref::<ApiError>())
            .is_some_and(ApiError::is_not_modified);
        api_not_modified || self.message.starts_with(NOT_MODIFIED_PREFIX)
    }
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Self::unclassified(err)
    }
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        Self::unclassified(err)
    }
}

/// Errors raised while registering plugins or constructing the host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoaderError {
    /// Two commands share a name.
    #[error("duplicate command found: {name} (registered by {plugin})")]
    DuplicateCommand { name: String, plugin: String },

    /// Two callbacks share a key.
    #[error("duplicate callback key found: {key} (registered by {plugin})")]
    DuplicateCallback { key: String, plugin: String },

    /// A field declares a type the schema compiler cannot parse.
    #[error("argument '{field}' has unsupported data type: {declared}")]
    UnsupportedArgumentType { field: String, declared: String },

    /// A field's default value does not match its declared type.
    #[error("argument '{field}' has a default that is not a valid {expected}")]
    InvalidDefault { field: String, expected: String },

    /// A greedy field is not the last field or is not text.
    #[error("argument '{field}' cannot consume the remaining input: {reason}")]
    InvalidGreedy { field: String, reason: &'static str },

    /// Two fields of one schema share a name.
    #[error("argument '{field}' is declared more than once")]
    DuplicateField { field: String },

    /// A command or callback name is empty or contains whitespace or `;`.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// No name was given and none could be inferred from the handler.
    #[error("cannot infer a command name from handler {type_name}")]
    UnnamedHandler { type_name: String },

    /// A live host already exists in this instance slot.
    #[error("only one bot host can be active at a time")]
    HostAlreadyRunning,

    /// A plugin setup callback failed.
    #[error("setup of plugin '{plugin}' failed: {message}")]
    Setup { plugin: String, message: String },
}

impl From<LoaderError> for Failure {
    fn from(err: LoaderError) -> Self {
        Self::loader(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_titles() {
        assert_eq!(Failure::syntax("x").title(), "Syntax error");
        assert_eq!(Failure::permissions("x").title(), "Permissions error");
        assert_eq!(Failure::domain("User not found", "x").title(), "User not found");
    }

    #[test]
    fn test_loader_failures_are_critical() {
        let failure = Failure::from(LoaderError::HostAlreadyRunning);
        assert_eq!(failure.kind(), FailureKind::Loader);
        assert!(failure.is_critical());
        assert!(!Failure::syntax("x").is_critical());
    }

    #[test]
    fn test_severity_builders() {
        let failure = Failure::domain("t", "m").silent().notify();
        assert_eq!(
            failure.severity(),
            Severity {
                notify: true,
                critical: false,
                silent: true,
            }
        );
    }

    #[test]
    fn test_unclassified_keeps_source() {
        let failure = Failure::from(ApiError::Timeout);
        assert_eq!(failure.kind(), FailureKind::Unclassified);
        assert_eq!(failure.message(), "platform call timed out");
        assert!(std::error::Error::source(&failure).is_some());
    }

    #[test]
    fn test_benign_detection() {
        let benign = Failure::from(ApiError::bad_request("Message is not modified: same text"));
        assert!(benign.is_benign());

        let by_message = Failure::unclassified("Message is not modified: same text");
        assert!(by_message.is_benign());

        assert!(!Failure::from(ApiError::bad_request("Chat not found")).is_benign());
        assert!(!Failure::domain("t", "Message is not modified").is_benign());
    }

    #[test]
    fn test_loader_error_messages() {
        let err = LoaderError::DuplicateCommand {
            name: "ping".into(),
            plugin: "extra".into(),
        };
        assert_eq!(err.to_string(), "duplicate command found: ping (registered by extra)");
    }
}
