//! Callback registry.
//!
//! Interactive controls carry a routing token of the form `key;payload`.
//! The key selects a [`CallbackEntry`]; the payload is handed to the entry's
//! [`DecodeMode`]:
//!
//! - [`DecodeMode::Raw`] passes the payload through as text.
//! - [`DecodeMode::Structured`] reads it as a flat YAML mapping
//!   (`a: n`) and validates it against the declared schema.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use floofbot_core::{Failure, LoaderError};

use crate::command::validate_name;
use crate::handler::{BoxedCallbackHandler, CallbackHandler, CallbackPayload};
use crate::schema::{ArgumentSchema, CompiledParser, ParseError};

/// Separator between the key and the payload of a callback token.
pub const TOKEN_SEPARATOR: char = ';';

/// Builds a callback token for an outbound control.
pub fn callback_token(key: &str, payload: &str) -> String {
    format!("{key}{TOKEN_SEPARATOR}{payload}")
}

/// Splits a token into key and payload. Tokens without a payload are
/// not routable.
pub fn split_token(token: &str) -> Option<(&str, &str)> {
    token
        .split_once(TOKEN_SEPARATOR)
        .filter(|(_, payload)| !payload.is_empty())
}

/// How a callback payload is decoded before the handler sees it.
#[derive(Debug, Clone)]
pub enum DecodeMode {
    Raw,
    Structured(CompiledParser),
}

impl DecodeMode {
    /// Decodes `payload`, failing with a syntax failure on bad input.
    pub fn decode(&self, payload: &str) -> Result<CallbackPayload, Failure> {
        match self {
            Self::Raw => Ok(CallbackPayload::Raw(payload.to_string())),
            Self::Structured(parser) => {
                let value: Value = serde_yaml::from_str(payload)
                    .map_err(|e| ParseError::Malformed(e.to_string()))?;
                let Value::Object(object) = value else {
                    return Err(ParseError::NotAMapping.into());
                };
                Ok(CallbackPayload::Structured(parser.parse_object(&object)?))
            }
        }
    }
}

/// A registered callback action.
#[derive(Clone)]
pub struct CallbackEntry {
    key: String,
    plugin: String,
    handler: BoxedCallbackHandler,
    mode: DecodeMode,
}

impl CallbackEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn handler(&self) -> &BoxedCallbackHandler {
        &self.handler
    }

    pub fn mode(&self) -> &DecodeMode {
        &self.mode
    }
}

impl fmt::Debug for CallbackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("key", &self.key)
            .field("plugin", &self.plugin)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Mapping from callback key to [`CallbackEntry`].
#[derive(Debug, Default, Clone)]
pub struct CallbackRegistry {
    entries: HashMap<String, CallbackEntry>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a callback decoded with `schema`, or raw when `schema` is
    /// `None`.
    pub fn register<H>(
        &mut self,
        plugin: &str,
        key: &str,
        handler: H,
        schema: Option<&ArgumentSchema>,
    ) -> Result<(), LoaderError>
    where
        H: CallbackHandler,
    {
        validate_name(key)?;
        if self.entries.contains_key(key) {
            return Err(LoaderError::DuplicateCallback {
                key: key.to_string(),
                plugin: plugin.to_string(),
            });
        }

        let mode = match schema {
            Some(schema) => DecodeMode::Structured(CompiledParser::compile(schema)?),
            None => DecodeMode::Raw,
        };

        self.entries.insert(
            key.to_string(),
            CallbackEntry {
                key: key.to_string(),
                plugin: plugin.to_string(),
                handler: Arc::new(handler),
                mode,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Option<&CallbackEntry> {
        self.entries.get(key)
    }

    /// Matches a full token, returning the entry and the undecoded payload.
    pub fn route<'t>(&self, token: &'t str) -> Option<(&CallbackEntry, &'t str)> {
        let (key, payload) = split_token(token)?;
        self.lookup(key).map(|entry| (entry, payload))
    }

    pub fn list_all(&self) -> impl Iterator<Item = &CallbackEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
