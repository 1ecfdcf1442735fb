use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use floofbot_core::testing::MockPlatform;
use floofbot_core::{
    CommandEvent, Failure, HandlerResult, LoaderError, MemoryStore, User,
};
use floofbot_framework::plugin::builtin;
use floofbot_framework::{Args, Registrar};

use super::*;
use crate::config::ConfigError;
use crate::error::RuntimeError;

const CHAT: i64 = -1001;

fn config() -> FloofbotConfig {
    FloofbotConfig {
        token: "123:abc".to_string(),
        admin_groups: vec![-500],
        ..Default::default()
    }
}

fn runtime(slot: &'static InstanceSlot, config: FloofbotConfig) -> FloofbotRuntime {
    FloofbotRuntime { config, slot }
}

fn ping() -> Event {
    CommandEvent::new("ping", "", CHAT, User::new(1, "Alice")).into()
}

async fn explode(_host: Host, _event: CommandEvent, _args: Args) -> HandlerResult {
    Err(Failure::unclassified("disk on fire").critical())
}

fn register_explode(r: &mut Registrar<'_>) -> Result<(), LoaderError> {
    r.command("explode").handler(explode)?;
    Ok(())
}

#[test]
fn test_from_config_validates() {
    let result = FloofbotRuntime::from_config(FloofbotConfig::default());
    assert!(matches!(result, Err(RuntimeError::Config(_))));
}

#[test]
fn test_builder_loads_and_validates() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("floofbot.yaml", "token: abc\nadmin_groups: [-7]\n")?;
        let runtime = FloofbotRuntime::builder()
            .search_path(jail.directory())
            .without_env()
            .without_logging()
            .build()
            .map_err(|e| e.to_string())?;
        assert_eq!(runtime.config().admin_groups, vec![-7]);

        jail.create_file("floofbot.yaml", "token: ''\n")?;
        let result = FloofbotRuntime::builder()
            .search_path(jail.directory())
            .without_env()
            .without_logging()
            .build();
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::Invalid { field, .. })) if field == "token"
        ));
        Ok(())
    });
}

#[tokio::test]
async fn test_run_until_source_closes() {
    static SLOT: InstanceSlot = InstanceSlot::new();
    let platform = Arc::new(MockPlatform::new());
    let session = runtime(&SLOT, config())
        .start(platform.clone(), Arc::new(MemoryStore::new()), builtin::all())
        .await
        .unwrap();

    let (tx, rx) = mpsc::channel(8);
    tx.send(ping()).await.unwrap();
    tx.send(ping()).await.unwrap();
    drop(tx);

    session.run(rx).await.unwrap();

    assert_eq!(platform.sent_to(CHAT), vec!["Pong!", "Pong!"]);
    assert!(!SLOT.is_taken());
}

#[tokio::test]
async fn test_critical_failure_ends_loop() {
    static SLOT: InstanceSlot = InstanceSlot::new();
    let platform = Arc::new(MockPlatform::new());
    let session = runtime(&SLOT, config())
        .start(
            platform.clone(),
            Arc::new(MemoryStore::new()),
            [Plugin::new("explosive", register_explode)],
        )
        .await
        .unwrap();

    let (tx, rx) = mpsc::channel(8);
    tx.send(CommandEvent::new("explode", "", CHAT, User::new(1, "Alice")).into())
        .await
        .unwrap();

    // The sender stays open, so only the shutdown can end the loop.
    tokio::time::timeout(Duration::from_secs(5), session.run(rx))
        .await
        .expect("loop did not stop")
        .unwrap();

    for _ in 0..20 {
        if platform.stop_count() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(platform.stop_count(), 1);
    assert!(tx.is_closed());
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    static SLOT: InstanceSlot = InstanceSlot::new();
    let runtime = runtime(&SLOT, config());
    let platform = Arc::new(MockPlatform::new());

    let first = runtime
        .start(platform.clone(), Arc::new(MemoryStore::new()), builtin::all())
        .await
        .unwrap();
    let second = runtime
        .start(platform.clone(), Arc::new(MemoryStore::new()), builtin::all())
        .await;
    assert!(matches!(
        second,
        Err(RuntimeError::Loader(LoaderError::HostAlreadyRunning))
    ));

    drop(first);
    assert!(
        runtime
            .start(platform, Arc::new(MemoryStore::new()), builtin::all())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_config_reaches_host() {
    static SLOT: InstanceSlot = InstanceSlot::new();
    let mut config = config();
    config.main_group = Some(CHAT);
    config.plugins.insert(
        "greeter".to_string(),
        serde_json::json!({ "greeting": "hi" }),
    );

    let session = runtime(&SLOT, config)
        .start(
            Arc::new(MockPlatform::new()),
            Arc::new(MemoryStore::new()),
            builtin::all(),
        )
        .await
        .unwrap();

    let host = session.host();
    assert_eq!(host.main_group(), Some(CHAT));
    assert_eq!(host.admin_groups(), &[-500]);
    assert_eq!(
        host.plugin_config_value("greeter"),
        Some(&serde_json::json!({ "greeting": "hi" }))
    );
    assert!(host.registry().command("help").is_some());
}
