//! Console Bot
//!
//! Runs a Floofbot host against the terminal instead of a chat platform.
//! Type commands as you would in a chat; press inline buttons with
//! `press N`. Ctrl+D or `/shutdown` (with `--admin`) quits.
//! `FLOOFBOT_DEBUG=true` turns on debug logging.
//!
//! ```bash
//! cargo run --package console-bot -- --admin
//! > /help
//! > press 2
//! > /add 2 3.5
//! > /hello Floof
//! ```

mod console;
mod greeter;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use floofbot::prelude::*;

use crate::console::{ConsolePlatform, ConsoleSource};

/// Drive a Floofbot host from the terminal
#[derive(Parser, Debug)]
#[command(name = "console-bot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./floofbot.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile (overrides FLOOFBOT_PROFILE)
    #[arg(long)]
    profile: Option<String>,

    /// Chat the console speaks in
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    chat: ChatId,

    /// Your user ID
    #[arg(long, default_value_t = 1000)]
    user_id: UserId,

    /// Your display name
    #[arg(long, default_value = "Operator")]
    name: String,

    /// Treat you as a member of every admin chat
    #[arg(long)]
    admin: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console sessions need no platform token; admin escalations go to
    // the console chat unless the configuration says otherwise.
    let mut builder = FloofbotRuntime::builder().merge(FloofbotConfig {
        token: "console".to_string(),
        admin_groups: vec![cli.chat],
        ..Default::default()
    });
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    if let Some(database) = &runtime.config().database {
        info!(database = %database, "The console keeps records in memory");
    }

    let operator = User::new(cli.user_id, cli.name).with_username("operator");
    let platform = Arc::new(ConsolePlatform::new(operator, cli.admin));
    let store = Arc::new(MemoryStore::new());

    let session = runtime
        .start(platform.clone(), store, builtin::all())
        .await?;

    println!("Type /help to list commands, Ctrl+D to quit.");
    session.run(ConsoleSource::new(platform, cli.chat)).await?;

    Ok(())
}
