//! The live bot host.
//!
//! [`Host`] is the handle every handler receives. It bundles the platform
//! client, the persistence store, the frozen [`Registry`] and the shutdown
//! signal. Cloning is cheap.
//!
//! Only one host may be alive per [`InstanceSlot`]. The default slot is
//! process-wide; building a second host while the first is alive fails with
//! [`LoaderError::HostAlreadyRunning`]. Dropping the last handle frees the
//! slot again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use floofbot_core::{
    BoxedPlatform, BoxedStore, ChatId, CommandEvent, Failure, HandlerResult, InlineKeyboard,
    LoaderError, MemoryStore, MessageRef, ParseMode, UserId,
};

use crate::plugin::{Plugin, PluginLoader, linked_plugins, run_setups};
use crate::registry::Registry;

// =============================================================================
// Instance slot
// =============================================================================

/// Guards the "one live host" rule.
#[derive(Debug)]
pub struct InstanceSlot {
    taken: AtomicBool,
}

impl InstanceSlot {
    pub const fn new() -> Self {
        Self {
            taken: AtomicBool::new(false),
        }
    }

    /// Returns `true` while a host built with this slot is alive.
    pub fn is_taken(&self) -> bool {
        self.taken.load(Ordering::SeqCst)
    }

    fn acquire(&'static self) -> Result<SlotGuard, LoaderError> {
        self.taken
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| SlotGuard(self))
            .map_err(|_| LoaderError::HostAlreadyRunning)
    }
}

impl Default for InstanceSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide slot used unless a builder is given another one.
pub static GLOBAL_SLOT: InstanceSlot = InstanceSlot::new();

struct SlotGuard(&'static InstanceSlot);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.taken.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Host
// =============================================================================

struct HostInner {
    platform: BoxedPlatform,
    store: BoxedStore,
    registry: Arc<Registry>,
    plugin_configs: HashMap<String, serde_json::Value>,
    main_group: Option<ChatId>,
    admin_groups: Vec<ChatId>,
    shutdown: CancellationToken,
    stopping: AtomicBool,
    _slot: SlotGuard,
}

/// Handle to the running bot.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

impl Host {
    /// Starts building a host around `platform`.
    pub fn builder(platform: BoxedPlatform) -> HostBuilder {
        HostBuilder::new(platform)
    }

    pub fn platform(&self) -> &BoxedPlatform {
        &self.inner.platform
    }

    pub fn store(&self) -> &BoxedStore {
        &self.inner.store
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    pub fn main_group(&self) -> Option<ChatId> {
        self.inner.main_group
    }

    pub fn admin_groups(&self) -> &[ChatId] {
        &self.inner.admin_groups
    }

    /// Raw configuration section of a plugin.
    pub fn plugin_config_value(&self, plugin: &str) -> Option<&serde_json::Value> {
        self.inner.plugin_configs.get(plugin)
    }

    /// Typed configuration section of a plugin, or `T::default()` when the
    /// section is absent.
    ///
    /// A malformed section fails the calling handler only.
    pub fn plugin_config<T>(&self, plugin: &str) -> Result<T, Failure>
    where
        T: DeserializeOwned + Default,
    {
        match self.plugin_config_value(plugin) {
            None => Ok(T::default()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                Failure::domain(
                    "Invalid configuration",
                    format!("invalid configuration for plugin '{plugin}': {e}"),
                )
            }),
        }
    }

    /// Sends plain text to `chat_id`.
    pub async fn send(&self, chat_id: ChatId, text: &str) -> Result<MessageRef, Failure> {
        Ok(self
            .inner
            .platform
            .send_message(chat_id, text, ParseMode::Plain, None)
            .await?)
    }

    /// Sends MarkdownV2 text, optionally with an inline keyboard.
    pub async fn send_markdown(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, Failure> {
        Ok(self
            .inner
            .platform
            .send_message(chat_id, text, ParseMode::MarkdownV2, markup)
            .await?)
    }

    /// Replies with plain text in the chat a command came from.
    pub async fn reply(&self, event: &CommandEvent, text: &str) -> HandlerResult {
        self.send(event.chat_id, text).await.map(|_| ())
    }

    /// Refuses unless `user` is a member of one of the admin chats.
    ///
    /// A chat that cannot be queried counts as a refusal rather than being
    /// skipped or replaced by the originating chat.
    pub async fn require_admin(&self, user: UserId) -> HandlerResult {
        if self.inner.admin_groups.is_empty() {
            return Err(Failure::permissions("No admin chats are configured"));
        }
        for &group in &self.inner.admin_groups {
            match self.inner.platform.resolve_chat_member(group, user).await {
                Ok(Some(_)) => return Ok(()),
                Ok(None) => continue,
                Err(err) => {
                    warn!(group, user, error = %err, "Unable to resolve admin chat membership");
                    return Err(Failure::permissions(format!(
                        "Unable to verify admin status: {err}"
                    )));
                }
            }
        }
        Err(Failure::permissions("You are not allowed to use this command"))
    }

    /// Initiates shutdown.
    ///
    /// Only the first call has an effect: it stops event intake and hands the
    /// release of the platform subscription to a background task, so the
    /// caller never waits on it.
    pub fn shutdown(&self) {
        if self.inner.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down");
        self.inner.shutdown.cancel();

        let platform = Arc::clone(&self.inner.platform);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    platform.stop().await;
                });
            }
            Err(_) => warn!("No async runtime available, platform subscription not released"),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.stopping.load(Ordering::SeqCst)
    }

    /// Token cancelled when shutdown begins.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("commands", &self.inner.registry.commands().len())
            .field("callbacks", &self.inner.registry.callbacks().len())
            .field("stopping", &self.is_shutting_down())
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Host`].
pub struct HostBuilder {
    platform: BoxedPlatform,
    store: Option<BoxedStore>,
    plugins: Vec<Plugin>,
    plugin_configs: HashMap<String, serde_json::Value>,
    main_group: Option<ChatId>,
    admin_groups: Vec<ChatId>,
    slot: &'static InstanceSlot,
}

impl HostBuilder {
    pub fn new(platform: BoxedPlatform) -> Self {
        Self {
            platform,
            store: None,
            plugins: Vec::new(),
            plugin_configs: HashMap::new(),
            main_group: None,
            admin_groups: Vec::new(),
            slot: &GLOBAL_SLOT,
        }
    }

    /// Persistence store shared by handlers. Defaults to a [`MemoryStore`].
    pub fn store(mut self, store: BoxedStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Adds every plugin from [`LINKED_PLUGINS`](crate::plugin::LINKED_PLUGINS).
    pub fn linked_plugins(self) -> Self {
        self.plugins(linked_plugins())
    }

    pub fn plugin_config(mut self, plugin: impl Into<String>, value: serde_json::Value) -> Self {
        self.plugin_configs.insert(plugin.into(), value);
        self
    }

    pub fn plugin_configs(mut self, configs: HashMap<String, serde_json::Value>) -> Self {
        self.plugin_configs.extend(configs);
        self
    }

    pub fn main_group(mut self, chat_id: Option<ChatId>) -> Self {
        self.main_group = chat_id;
        self
    }

    pub fn admin_groups(mut self, groups: impl IntoIterator<Item = ChatId>) -> Self {
        self.admin_groups = groups.into_iter().collect();
        self
    }

    /// Uses `slot` instead of the process-wide one.
    pub fn instance_slot(mut self, slot: &'static InstanceSlot) -> Self {
        self.slot = slot;
        self
    }

    /// Loads all plugins, freezes the registry and runs setup callbacks.
    ///
    /// # Errors
    ///
    /// Fails immediately with [`LoaderError::HostAlreadyRunning`] if the
    /// slot is taken, or with the first registration or setup error.
    pub async fn build(self) -> Result<Host, LoaderError> {
        let slot = self.slot.acquire()?;

        let mut loader = PluginLoader::new();
        loader.load_all(&self.plugins)?;
        let (registry, setups) = loader.finish();

        let host = Host {
            inner: Arc::new(HostInner {
                platform: self.platform,
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(MemoryStore::new())),
                registry: Arc::new(registry),
                plugin_configs: self.plugin_configs,
                main_group: self.main_group,
                admin_groups: self.admin_groups,
                shutdown: CancellationToken::new(),
                stopping: AtomicBool::new(false),
                _slot: slot,
            }),
        };

        run_setups(&host, setups).await?;

        info!(
            commands = host.registry().commands().len(),
            callbacks = host.registry().callbacks().len(),
            "Host ready"
        );
        Ok(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floofbot_core::testing::MockPlatform;
    use floofbot_core::{ApiError, FailureKind, User};

    fn platform() -> Arc<MockPlatform> {
        Arc::new(MockPlatform::new())
    }

    #[tokio::test]
    async fn test_second_host_is_rejected_until_first_dropped() {
        static SLOT: InstanceSlot = InstanceSlot::new();

        let first = Host::builder(platform()).instance_slot(&SLOT).build().await.unwrap();
        assert!(SLOT.is_taken());

        let second = Host::builder(platform()).instance_slot(&SLOT).build().await;
        assert_eq!(second.unwrap_err(), LoaderError::HostAlreadyRunning);

        let clone = first.clone();
        drop(first);
        assert!(SLOT.is_taken());
        drop(clone);
        assert!(!SLOT.is_taken());

        assert!(Host::builder(platform()).instance_slot(&SLOT).build().await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_runs_once() {
        static SLOT: InstanceSlot = InstanceSlot::new();
        let mock = platform();
        let host = Host::builder(mock.clone()).instance_slot(&SLOT).build().await.unwrap();

        let token = host.shutdown_token();
        host.shutdown();
        host.shutdown();
        assert!(token.is_cancelled());
        assert!(host.is_shutting_down());

        tokio::task::yield_now().await;
        for _ in 0..10 {
            if mock.stop_count() > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(mock.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_plugin_config() {
        #[derive(Debug, Default, serde::Deserialize, PartialEq)]
        struct Greeting {
            text: String,
        }

        static SLOT: InstanceSlot = InstanceSlot::new();
        let host = Host::builder(platform())
            .instance_slot(&SLOT)
            .plugin_config("greeter", serde_json::json!({ "text": "hi" }))
            .plugin_config("broken", serde_json::json!({ "text": 5 }))
            .build()
            .await
            .unwrap();

        let greeting: Greeting = host.plugin_config("greeter").unwrap();
        assert_eq!(greeting.text, "hi");
        assert_eq!(host.plugin_config::<Greeting>("missing").unwrap(), Greeting::default());
        let err = host.plugin_config::<Greeting>("broken").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Domain);
        assert_eq!(err.title(), "Invalid configuration");
        assert!(!err.is_critical());
    }

    #[tokio::test]
    async fn test_require_admin() {
        static SLOT: InstanceSlot = InstanceSlot::new();
        let mock = platform();
        mock.add_member(-100, User::new(1, "Admin"));
        let host = Host::builder(mock.clone())
            .instance_slot(&SLOT)
            .admin_groups([-100])
            .build()
            .await
            .unwrap();

        assert!(host.require_admin(1).await.is_ok());
        let refused = host.require_admin(2).await.unwrap_err();
        assert_eq!(refused.kind(), FailureKind::Permissions);
    }

    #[tokio::test]
    async fn test_require_admin_refuses_on_lookup_failure() {
        struct Unreachable;

        #[async_trait::async_trait]
        impl floofbot_core::Platform for Unreachable {
            async fn send_message(
                &self,
                _chat_id: ChatId,
                _text: &str,
                _parse_mode: ParseMode,
                _markup: Option<&InlineKeyboard>,
            ) -> floofbot_core::ApiResult<MessageRef> {
                Err(ApiError::NotConnected)
            }

            async fn edit_message(
                &self,
                _message: &MessageRef,
                _text: &str,
                _parse_mode: ParseMode,
                _markup: Option<&InlineKeyboard>,
            ) -> floofbot_core::ApiResult<()> {
                Err(ApiError::NotConnected)
            }

            async fn resolve_chat_member(
                &self,
                _chat_id: ChatId,
                _user_id: UserId,
            ) -> floofbot_core::ApiResult<Option<User>> {
                Err(ApiError::NotConnected)
            }

            async fn resolve_user(&self, _identifier: &str) -> floofbot_core::ApiResult<Option<User>> {
                Err(ApiError::NotConnected)
            }

            async fn answer_callback(&self, _callback_id: &str) -> floofbot_core::ApiResult<()> {
                Err(ApiError::NotConnected)
            }
        }

        static SLOT: InstanceSlot = InstanceSlot::new();
        let host = Host::builder(Arc::new(Unreachable))
            .instance_slot(&SLOT)
            .admin_groups([-100])
            .build()
            .await
            .unwrap();

        let refused = host.require_admin(1).await.unwrap_err();
        assert_eq!(refused.kind(), FailureKind::Permissions);
    }
}
