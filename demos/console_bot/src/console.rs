//! A [`Platform`] and [`EventSource`] backed by the terminal.
//!
//! Every line typed on stdin becomes an event:
//!
//! - `/command args` → a command event from the operator
//! - `press N` → a press on button `N` of the last keyboard shown
//! - anything else → ignored traffic

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

use floofbot::core::{
    ApiError, ApiResult, CallbackEvent, ChatId, CommandEvent, Event, EventSource, InlineKeyboard,
    MessageRef, NOT_MODIFIED_PREFIX, ParseMode, Platform, User, UserId,
};

/// A button of the most recent keyboard.
#[derive(Debug, Clone)]
struct Button {
    chat_id: ChatId,
    message_id: i64,
    callback_data: String,
}

/// Prints outbound messages and remembers their keyboards.
#[derive(Debug)]
pub struct ConsolePlatform {
    operator: User,
    /// Whether the operator counts as a member of every chat.
    admin: bool,
    users: HashMap<String, User>,
    messages: Mutex<HashMap<i64, String>>,
    buttons: Mutex<Vec<Button>>,
    next_message_id: AtomicI64,
    next_callback_id: AtomicUsize,
}

impl ConsolePlatform {
    pub fn new(operator: User, admin: bool) -> Self {
        let mut users = HashMap::new();
        users.insert(operator.id.to_string(), operator.clone());
        if let Some(username) = &operator.username {
            users.insert(format!("@{username}"), operator.clone());
        }

        Self {
            operator,
            admin,
            users,
            messages: Mutex::new(HashMap::new()),
            buttons: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(1),
            next_callback_id: AtomicUsize::new(1),
        }
    }

    pub fn operator(&self) -> &User {
        &self.operator
    }

    fn show_keyboard(&self, chat_id: ChatId, message_id: i64, markup: Option<&InlineKeyboard>) {
        let Some(markup) = markup else {
            return;
        };

        let mut buttons = self.buttons.lock();
        buttons.clear();
        for row in &markup.rows {
            let labels: Vec<String> = row
                .iter()
                .map(|button| {
                    buttons.push(Button {
                        chat_id,
                        message_id,
                        callback_data: button.callback_data.clone(),
                    });
                    format!("[{}] {}", buttons.len(), button.text)
                })
                .collect();
            println!("    {}", labels.join("   "));
        }
    }

    /// Builds the callback event for a press on button `index` (1-based).
    fn press(&self, index: usize) -> Option<CallbackEvent> {
        let button = self.buttons.lock().get(index.checked_sub(1)?)?.clone();
        let text = self.messages.lock().get(&button.message_id)?.clone();
        let id = self.next_callback_id.fetch_add(1, Ordering::SeqCst);

        Some(CallbackEvent {
            id: format!("console-{id}"),
            data: button.callback_data,
            chat_id: button.chat_id,
            user: self.operator.clone(),
            message: MessageRef {
                chat_id: button.chat_id,
                message_id: button.message_id,
                text,
            },
        })
    }
}

#[async_trait]
impl Platform for ConsolePlatform {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: ParseMode,
        markup: Option<&InlineKeyboard>,
    ) -> ApiResult<MessageRef> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().insert(message_id, text.to_string());

        println!("[chat {chat_id} #{message_id} {parse_mode:?}]");
        for line in text.lines() {
            println!("  {line}");
        }
        self.show_keyboard(chat_id, message_id, markup);

        Ok(MessageRef {
            chat_id,
            message_id,
            text: text.to_string(),
        })
    }

    async fn edit_message(
        &self,
        message: &MessageRef,
        text: &str,
        parse_mode: ParseMode,
        markup: Option<&InlineKeyboard>,
    ) -> ApiResult<()> {
        {
            let mut messages = self.messages.lock();
            let Some(current) = messages.get_mut(&message.message_id) else {
                return Err(ApiError::bad_request("Message to edit not found"));
            };
            if current == text {
                return Err(ApiError::bad_request(format!(
                    "{NOT_MODIFIED_PREFIX}: specified new message content is the same"
                )));
            }
            *current = text.to_string();
        }

        println!("[chat {} #{} edited {parse_mode:?}]", message.chat_id, message.message_id);
        for line in text.lines() {
            println!("  {line}");
        }
        self.show_keyboard(message.chat_id, message.message_id, markup);
        Ok(())
    }

    async fn resolve_chat_member(
        &self,
        _chat_id: ChatId,
        user_id: UserId,
    ) -> ApiResult<Option<User>> {
        Ok((self.admin && user_id == self.operator.id).then(|| self.operator.clone()))
    }

    async fn resolve_user(&self, identifier: &str) -> ApiResult<Option<User>> {
        if identifier.parse::<UserId>().is_err() && !identifier.starts_with('@') {
            return Err(ApiError::bad_request(format!("Invalid user identifier: {identifier}")));
        }
        Ok(self.users.get(identifier).cloned())
    }

    async fn answer_callback(&self, callback_id: &str) -> ApiResult<()> {
        debug!(callback_id, "Callback answered");
        Ok(())
    }

    async fn stop(&self) {
        info!("Console closed");
    }
}

/// Reads events from stdin until EOF.
pub struct ConsoleSource {
    lines: Lines<BufReader<Stdin>>,
    platform: Arc<ConsolePlatform>,
    chat_id: ChatId,
}

impl ConsoleSource {
    pub fn new(platform: Arc<ConsolePlatform>, chat_id: ChatId) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            platform,
            chat_id,
        }
    }

    fn parse_line(&self, line: &str) -> Event {
        let line = line.trim();
        if let Some(index) = line.strip_prefix("press ") {
            return match index.trim().parse().ok().and_then(|i| self.platform.press(i)) {
                Some(callback) => callback.into(),
                None => {
                    println!("  (no such button)");
                    Event::Other
                }
            };
        }

        CommandEvent::from_message_text(line, self.chat_id, self.platform.operator().clone())
            .map_or(Event::Other, Event::from)
    }
}

#[async_trait]
impl EventSource for ConsoleSource {
    async fn next_event(&mut self) -> Option<Event> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(self.parse_line(&line)),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read from stdin");
                None
            }
        }
    }
}
