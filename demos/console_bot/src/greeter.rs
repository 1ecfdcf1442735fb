//! A small plugin linked into the demo binary.
//!
//! ```yaml
//! plugins:
//!   greeter:
//!     greeting: Howdy
//! ```

use serde::Deserialize;
use tracing::info;

use floofbot::framework::linkme::distributed_slice;
use floofbot::prelude::*;

#[distributed_slice(LINKED_PLUGINS)]
#[linkme(crate = floofbot::framework::linkme)]
static GREETER: Plugin = Plugin::new("greeter", register);

#[derive(Debug, Default, Deserialize)]
struct GreeterConfig {
    greeting: Option<String>,
}

fn register(r: &mut Registrar<'_>) -> Result<(), LoaderError> {
    r.command("hello")
        .help("Greets you, or someone else")
        .schema(
            ArgumentSchema::new()
                .field(ArgumentField::text("name").optional().describe("Who to greet")),
        )
        .handler(hello)?;

    r.command("add")
        .help("Adds two numbers")
        .schema(
            ArgumentSchema::new()
                .field(ArgumentField::number("a"))
                .field(ArgumentField::number("b").default(0.0)),
        )
        .handler(add)?;

    r.command("note")
        .help("Saves a note")
        .schema(
            ArgumentSchema::new()
                .field(ArgumentField::text("text").greedy().describe("The note")),
        )
        .handler(note)?;

    r.command_fn(shutdown)?;

    r.callback("wave").raw_handler(wave)?;

    r.setup(announce);
    Ok(())
}

async fn announce(host: Host) -> HandlerResult {
    let config: GreeterConfig = host.plugin_config("greeter")?;
    info!(greeting = ?config.greeting, "Greeter ready");
    if let Some(chat) = host.main_group() {
        host.send(chat, "Greeter is online").await?;
    }
    Ok(())
}

async fn hello(host: Host, event: CommandEvent, args: Args) -> HandlerResult {
    let config: GreeterConfig = host.plugin_config("greeter")?;
    let greeting = config.greeting.as_deref().unwrap_or("Hello");
    let name = args
        .text("name")
        .map(str::to_string)
        .unwrap_or_else(|| event.user.full_name());

    let keyboard = InlineKeyboard::default()
        .row(vec![InlineButton::new("Wave back", callback_token("wave", &name))]);
    host.send_markdown(
        event.chat_id,
        &escape_markdown(format!("{greeting}, {name}!")),
        Some(&keyboard),
    )
    .await?;
    Ok(())
}

async fn wave(host: Host, event: CallbackEvent, name: String) -> HandlerResult {
    host.send(event.chat_id, &format!("{} waves at {name}", event.user.display_name()))
        .await?;
    Ok(())
}

async fn add(host: Host, event: CommandEvent, args: Args) -> HandlerResult {
    let a = args.number("a").unwrap_or_default();
    let b = args.number("b").unwrap_or_default();
    host.reply(&event, &format!("{a} + {b} = {}", a + b)).await
}

async fn note(host: Host, event: CommandEvent, args: Args) -> HandlerResult {
    let text = args.text("text").unwrap_or_default();
    let record = Record::new("notes")
        .field("chat_id", event.chat_id)
        .field("user_id", event.user.id)
        .field("text", text);

    let store = host.store();
    store.add(record).await?;
    if let Err(e) = store.commit().await {
        store.rollback().await;
        return Err(e.into());
    }
    host.reply(&event, "Noted.").await
}

/// Stops the bot. Admins only.
async fn shutdown(host: Host, event: CommandEvent, _args: Args) -> HandlerResult {
    host.require_admin(event.user.id).await?;
    host.reply(&event, "Bye!").await?;
    host.shutdown();
    Ok(())
}
