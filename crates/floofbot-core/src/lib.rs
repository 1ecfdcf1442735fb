//! # Floofbot Core
//!
//! Foundation types shared by every Floofbot crate:
//!
//! - **Events**: the inbound [`Event`] model and the [`EventSource`] trait
//! - **Platform**: the outbound [`Platform`] collaborator and [`escape_markdown`]
//! - **Persistence**: the unit-of-work [`Store`] collaborator and [`MemoryStore`]
//! - **Failures**: the tagged [`Failure`] record and [`LoaderError`]
//!
//! Nothing in this crate talks to the network; concrete platform clients
//! implement [`Platform`] and feed events through an [`EventSource`].

pub mod event;
pub mod failure;
pub mod markdown;
pub mod platform;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use event::{
    CallbackEvent, ChatId, CommandEvent, Event, EventSource, MessageRef, User, UserId,
};
pub use failure::{
    BoxError, Failure, FailureKind, HandlerResult, LoaderError, Severity,
};
pub use markdown::escape_markdown;
pub use platform::{
    ApiError, ApiResult, BoxedPlatform, InlineButton, InlineKeyboard, NOT_MODIFIED_PREFIX,
    ParseMode, Platform,
};
pub use store::{BoxedStore, MemoryStore, Record, Store, StoreError, StoreResult};
