//! Inbound event model.
//!
//! The platform collaborator delivers two event shapes that the host
//! consumes: [`CommandEvent`] (a `/command` message) and [`CallbackEvent`]
//! (a press on an inline button). Everything else arrives as
//! [`Event::Other`] and is ignored by the dispatcher.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Platform identifier of a conversation (private chat, group, channel).
pub type ChatId = i64;

/// Platform identifier of a user.
pub type UserId = i64;

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    /// Creates a user with only an ID and a first name.
    pub fn new(id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            id,
            username: None,
            first_name: first_name.into(),
            last_name: None,
        }
    }

    /// Sets the `@username` of this user (builder pattern).
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// `@username` when available, otherwise the full name.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.full_name(),
        }
    }
}

/// Reference to a message the bot (or a user) sent, used for edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
    /// Text of the message at the time the event was produced.
    #[serde(default)]
    pub text: String,
}

/// A `/command` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Command name without the leading `/` and without any `@botname` suffix.
    pub command: String,
    /// Raw text following the command name.
    #[serde(default)]
    pub text: String,
    pub chat_id: ChatId,
    pub user: User,
    /// Users mentioned in the message, in order of appearance.
    #[serde(default)]
    pub mentions: Vec<User>,
}

impl CommandEvent {
    /// Creates a command event with no mentions.
    pub fn new(
        command: impl Into<String>,
        text: impl Into<String>,
        chat_id: ChatId,
        user: User,
    ) -> Self {
        Self {
            command: command.into(),
            text: text.into(),
            chat_id,
            user,
            mentions: Vec::new(),
        }
    }

    /// Splits a raw message such as `/help@floofbot ping` into a command event.
    ///
    /// Returns `None` when the text does not start with `/` or the command
    /// name is empty.
    pub fn from_message_text(text: &str, chat_id: ChatId, user: User) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let (head, tail) = match rest.find(char::is_whitespace) {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, ""),
        };
        let command = head.split('@').next().unwrap_or_default();
        if command.is_empty() {
            return None;
        }
        Some(Self::new(command, tail.trim_start(), chat_id, user))
    }
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackEvent {
    /// Platform identifier of the callback query, used to acknowledge it.
    pub id: String,
    /// Opaque routing token of the form `key;payload`.
    pub data: String,
    pub chat_id: ChatId,
    pub user: User,
    /// The message carrying the pressed button.
    pub message: MessageRef,
}

/// Any inbound event delivered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Command(CommandEvent),
    Callback(CallbackEvent),
    /// Traffic the host has no interest in (plain messages, joins, ...).
    Other,
}

impl Event {
    /// Short name used in log spans.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Command(_) => "command",
            Self::Callback(_) => "callback",
            Self::Other => "other",
        }
    }

    /// The conversation the event originated from, if any.
    pub fn chat_id(&self) -> Option<ChatId> {
        match self {
            Self::Command(cmd) => Some(cmd.chat_id),
            Self::Callback(cb) => Some(cb.chat_id),
            Self::Other => None,
        }
    }
}

impl From<CommandEvent> for Event {
    fn from(event: CommandEvent) -> Self {
        Self::Command(event)
    }
}

impl From<CallbackEvent> for Event {
    fn from(event: CallbackEvent) -> Self {
        Self::Callback(event)
    }
}

/// The inbound half of the platform collaborator: a stream of events.
///
/// `None` means the subscription has ended and no more events will arrive.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Option<Event>;
}

#[async_trait]
impl EventSource for mpsc::Receiver<Event> {
    async fn next_event(&mut self) -> Option<Event> {
        self.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new(1, "Alice")
    }

    #[test]
    fn test_from_message_text_with_arguments() {
        let event = CommandEvent::from_message_text("/help   ping", 10, alice()).unwrap();
        assert_eq!(event.command, "help");
        assert_eq!(event.text, "ping");
        assert_eq!(event.chat_id, 10);
    }

    #[test]
    fn test_from_message_text_strips_bot_suffix() {
        let event = CommandEvent::from_message_text("/id@floofbot", 10, alice()).unwrap();
        assert_eq!(event.command, "id");
        assert_eq!(event.text, "");
    }

    #[test]
    fn test_from_message_text_rejects_plain_text() {
        assert!(CommandEvent::from_message_text("hello", 10, alice()).is_none());
        assert!(CommandEvent::from_message_text("/", 10, alice()).is_none());
        assert!(CommandEvent::from_message_text("/ ping", 10, alice()).is_none());
    }

    #[test]
    fn test_user_names() {
        let mut user = alice();
        assert_eq!(user.display_name(), "Alice");
        user.last_name = Some("Liddell".into());
        assert_eq!(user.full_name(), "Alice Liddell");
        let user = user.with_username("alice");
        assert_eq!(user.display_name(), "@alice");
    }

    #[test]
    fn test_event_chat_id() {
        let event = Event::from(CommandEvent::new("ping", "", 42, alice()));
        assert_eq!(event.chat_id(), Some(42));
        assert_eq!(event.event_name(), "command");
        assert_eq!(Event::Other.chat_id(), None);
    }

    #[tokio::test]
    async fn test_channel_event_source() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(Event::Other).await.unwrap();
        drop(tx);
        assert_eq!(rx.next_event().await, Some(Event::Other));
        assert_eq!(rx.next_event().await, None);
    }
}
