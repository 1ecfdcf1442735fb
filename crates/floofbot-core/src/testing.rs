//! In-memory platform double.
//!
//! [`MockPlatform`] records every outbound call so tests can assert on what
//! a handler or the reporter sent. Enabled by the `testing` feature.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::event::{ChatId, MessageRef, User, UserId};
use crate::platform::{ApiError, ApiResult, InlineKeyboard, ParseMode, Platform};

/// A message recorded by [`MockPlatform`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub parse_mode: ParseMode,
    pub markup: Option<InlineKeyboard>,
}

/// An edit recorded by [`MockPlatform`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditedMessage {
    pub message: MessageRef,
    pub text: String,
    pub markup: Option<InlineKeyboard>,
}

/// Platform double that records calls instead of performing them.
#[derive(Debug, Default)]
pub struct MockPlatform {
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<EditedMessage>>,
    answered: Mutex<Vec<String>>,
    users: Mutex<HashMap<String, User>>,
    members: Mutex<HashMap<(ChatId, UserId), User>>,
    send_error: Mutex<Option<ApiError>>,
    edit_error: Mutex<Option<ApiError>>,
    next_message_id: AtomicI64,
    stops: AtomicUsize,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `user` resolvable by its ID and, if set, its username.
    pub fn add_user(&self, user: User) {
        let mut users = self.users.lock();
        if let Some(username) = &user.username {
            users.insert(format!("@{username}"), user.clone());
        }
        users.insert(user.id.to_string(), user);
    }

    /// Makes `user` a member of `chat_id`.
    pub fn add_member(&self, chat_id: ChatId, user: User) {
        self.members.lock().insert((chat_id, user.id), user);
    }

    /// Makes every following `send_message` fail with `error`.
    pub fn fail_sends(&self, error: ApiError) {
        *self.send_error.lock() = Some(error);
    }

    /// Makes every following `edit_message` fail with `error`.
    pub fn fail_edits(&self, error: ApiError) {
        *self.edit_error.lock() = Some(error);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Texts of all messages sent to `chat_id`.
    pub fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn edits(&self) -> Vec<EditedMessage> {
        self.edits.lock().clone()
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().clone()
    }

    /// Number of times [`Platform::stop`] was called.
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: ParseMode,
        markup: Option<&InlineKeyboard>,
    ) -> ApiResult<MessageRef> {
        if let Some(err) = self.send_error.lock().clone() {
            return Err(err);
        }
        self.sent.lock().push(SentMessage {
            chat_id,
            text: text.to_string(),
            parse_mode,
            markup: markup.cloned(),
        });
        Ok(MessageRef {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
            text: text.to_string(),
        })
    }

    async fn edit_message(
        &self,
        message: &MessageRef,
        text: &str,
        _parse_mode: ParseMode,
        markup: Option<&InlineKeyboard>,
    ) -> ApiResult<()> {
        if let Some(err) = self.edit_error.lock().clone() {
            return Err(err);
        }
        self.edits.lock().push(EditedMessage {
            message: message.clone(),
            text: text.to_string(),
            markup: markup.cloned(),
        });
        Ok(())
    }

    async fn resolve_chat_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> ApiResult<Option<User>> {
        Ok(self.members.lock().get(&(chat_id, user_id)).cloned())
    }

    async fn resolve_user(&self, identifier: &str) -> ApiResult<Option<User>> {
        Ok(self.users.lock().get(identifier).cloned())
    }

    async fn answer_callback(&self, callback_id: &str) -> ApiResult<()> {
        self.answered.lock().push(callback_id.to_string());
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_messages_and_lookups() {
        let platform = MockPlatform::new();
        platform.add_user(User::new(5, "Bob").with_username("bob"));

        let sent = platform
            .send_message(1, "hi", ParseMode::Plain, None)
            .await
            .unwrap();
        assert_eq!(sent.message_id, 1);
        assert_eq!(platform.sent_to(1), vec!["hi"]);

        assert_eq!(platform.resolve_user("@bob").await.unwrap().unwrap().id, 5);
        assert_eq!(platform.resolve_user("5").await.unwrap().unwrap().id, 5);
        assert!(platform.resolve_user("@carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_send_failure() {
        let platform = MockPlatform::new();
        platform.fail_sends(ApiError::NotConnected);
        assert!(platform.send_message(1, "hi", ParseMode::Plain, None).await.is_err());
        assert!(platform.sent().is_empty());
    }
}
