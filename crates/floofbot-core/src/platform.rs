//! The outbound half of the platform collaborator.
//!
//! A [`Platform`] sends and edits messages and answers lookups on behalf of
//! handlers. The host never talks to the network itself; concrete clients
//! (a Telegram client, the console demo, the test double) implement this
//! trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{ChatId, MessageRef, User, UserId};

/// Prefix of the platform error returned when an edit leaves a message
/// unchanged.
pub const NOT_MODIFIED_PREFIX: &str = "Message is not modified";

/// Error type for platform calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The platform client is not connected.
    #[error("platform is not connected")]
    NotConnected,

    /// The call timed out.
    #[error("platform call timed out")]
    Timeout,

    /// The platform rejected the request.
    #[error("{message}")]
    BadRequest {
        /// Platform error code.
        code: i32,
        /// Platform error description.
        message: String,
    },

    /// Transport failure underneath the client.
    #[error("transport error: {0}")]
    Transport(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Creates a `BadRequest` error with the conventional code 400.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: 400,
            message: message.into(),
        }
    }

    /// Returns `true` for the benign "message is not modified" condition
    /// produced by an edit that would not change anything.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::BadRequest { message, .. } if message.starts_with(NOT_MODIFIED_PREFIX))
    }
}

/// Result type for platform calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Text formatting mode of an outbound message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    /// No markup; text is shown verbatim.
    #[default]
    Plain,
    /// Telegram MarkdownV2. Literal text must go through
    /// [`escape_markdown`](crate::escape_markdown).
    MarkdownV2,
}

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    /// Routing token delivered back in a [`CallbackEvent`](crate::CallbackEvent).
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Inline keyboard attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Creates a keyboard from rows of buttons.
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Appends a row of buttons (builder pattern).
    pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
        self.rows.push(buttons);
        self
    }
}

/// Outbound platform operations used by handlers and the reporter.
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// Sends a message to a conversation.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: ParseMode,
        markup: Option<&InlineKeyboard>,
    ) -> ApiResult<MessageRef>;

    /// Replaces the text (and keyboard) of an existing message.
    async fn edit_message(
        &self,
        message: &MessageRef,
        text: &str,
        parse_mode: ParseMode,
        markup: Option<&InlineKeyboard>,
    ) -> ApiResult<()>;

    /// Looks up a member of a conversation.
    async fn resolve_chat_member(&self, chat_id: ChatId, user_id: UserId)
    -> ApiResult<Option<User>>;

    /// Looks up a user by a raw ID or an `@username`.
    async fn resolve_user(&self, identifier: &str) -> ApiResult<Option<User>>;

    /// Acknowledges a callback query so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> ApiResult<()>;

    /// Releases the inbound event subscription. Called once during shutdown.
    ///
    /// The default implementation does nothing.
    async fn stop(&self) {}
}

/// A shared platform trait object.
pub type BoxedPlatform = Arc<dyn Platform>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_modified_detection() {
        let err = ApiError::bad_request(
            "Message is not modified: specified new message content and reply markup are exactly the same",
        );
        assert!(err.is_not_modified());
        assert!(!ApiError::bad_request("Chat not found").is_not_modified());
        assert!(!ApiError::Other("Message is not modified".into()).is_not_modified());
    }

    #[test]
    fn test_keyboard_builder() {
        let keyboard = InlineKeyboard::default().row(vec![
            InlineButton::new("Previous", "page;a: p"),
            InlineButton::new("Next", "page;a: n"),
        ]);
        assert_eq!(keyboard.rows.len(), 1);
        assert_eq!(keyboard.rows[0][1].callback_data, "page;a: n");
    }
}
