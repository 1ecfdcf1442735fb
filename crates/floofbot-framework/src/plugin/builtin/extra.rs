//! General purpose commands: `/ping`, `/id` and the paginated `/help`.

use floofbot_core::{
    ApiError, CallbackEvent, CommandEvent, Failure, HandlerResult, InlineButton, InlineKeyboard,
    LoaderError, ParseMode, User, escape_markdown,
};

use crate::callback::callback_token;
use crate::help::escape_code;
use crate::host::Host;
use crate::plugin::{Plugin, Registrar};
use crate::registry::Registry;
use crate::schema::{ArgumentField, ArgumentSchema, Args};

/// The `extra` plugin.
pub const EXTRA_PLUGIN: Plugin = Plugin::new("extra", register);

/// Commands shown per help page.
pub const COMMANDS_PER_PAGE: usize = 5;

/// Key of the help pagination buttons.
pub const HELP_MENU_KEY: &str = "help_menu_page";

fn register(r: &mut Registrar<'_>) -> Result<(), LoaderError> {
    r.command("ping")
        .help("Checks if the bot is alive")
        .handler(ping)?;

    r.command("id")
        .help("Shows the user's ID number")
        .schema(
            ArgumentSchema::new().field(
                ArgumentField::text("identifier")
                    .optional()
                    .describe("Either a raw user ID or mention"),
            ),
        )
        .handler(id_command)?;

    r.command("help")
        .help("Shows the help text of a command or lists all commands")
        .schema(
            ArgumentSchema::new()
                .field(ArgumentField::text("command").optional().describe("Name of the command")),
        )
        .handler(help_command)?;

    r.callback(HELP_MENU_KEY)
        .schema(
            ArgumentSchema::new().field(
                ArgumentField::text("a")
                    .describe("Button action. Must be 'p' (previous) or 'n' (next)"),
            ),
        )
        .handler(help_menu_page)?;

    Ok(())
}

async fn ping(host: Host, event: CommandEvent, _args: Args) -> HandlerResult {
    host.reply(&event, "Pong!").await
}

async fn id_command(host: Host, event: CommandEvent, args: Args) -> HandlerResult {
    let user = match (event.mentions.first(), args.text("identifier")) {
        (Some(mentioned), _) => mentioned.clone(),
        (None, Some(identifier)) => resolve(&host, identifier).await?,
        (None, None) => event.user.clone(),
    };

    let text = format!(
        "User ID for [@{}](tg://user?id={}): `{}`",
        escape_markdown(user.full_name()),
        user.id,
        user.id
    );
    host.send_markdown(event.chat_id, &text, None).await?;
    Ok(())
}

async fn resolve(host: &Host, identifier: &str) -> Result<User, Failure> {
    let not_found = || Failure::domain("User not found", format!("User \"{identifier}\" not found"));
    match host.platform().resolve_user(identifier).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) | Err(ApiError::BadRequest { .. }) => Err(not_found()),
        Err(err) => Err(err.into()),
    }
}

async fn help_command(host: Host, event: CommandEvent, args: Args) -> HandlerResult {
    let Some(name) = args.text("command") else {
        let page = help_page(host.registry(), 0);
        host.send_markdown(event.chat_id, &page, Some(&help_buttons()))
            .await?;
        return Ok(());
    };

    let name = name.trim_start_matches('/').to_lowercase();
    let text = match host.registry().command(&name) {
        Some(entry) => entry.render_help(),
        None => format!("Command `{}` not found", escape_code(&name)),
    };
    host.send_markdown(event.chat_id, &text, None).await?;
    Ok(())
}

async fn help_menu_page(host: Host, event: CallbackEvent, args: Args) -> HandlerResult {
    let delta: isize = match args.text("a") {
        Some("n") => 1,
        Some("p") => -1,
        other => {
            return Err(Failure::syntax(format!(
                "unknown help menu action: {}",
                other.unwrap_or_default()
            )));
        }
    };

    let pages = page_count(host.registry()) as isize;
    let current = current_page(&event.message.text).unwrap_or(1) as isize - 1;
    let index = (current + delta).rem_euclid(pages) as usize;

    host.platform()
        .edit_message(
            &event.message,
            &help_page(host.registry(), index),
            ParseMode::MarkdownV2,
            Some(&help_buttons()),
        )
        .await?;
    Ok(())
}

fn help_buttons() -> InlineKeyboard {
    InlineKeyboard::default().row(vec![
        InlineButton::new("Previous", callback_token(HELP_MENU_KEY, "a: p")),
        InlineButton::new("Next", callback_token(HELP_MENU_KEY, "a: n")),
    ])
}

fn page_count(registry: &Registry) -> usize {
    registry.commands().len().div_ceil(COMMANDS_PER_PAGE).max(1)
}

/// Reads the 1-based page number from a `Commands list: page X/Y` header.
fn current_page(text: &str) -> Option<usize> {
    let header = text.lines().next()?;
    let (_, fraction) = header.rsplit_once(' ')?;
    fraction.split('/').next()?.parse().ok()
}

/// Renders page `index` (0-based) of the sorted command list as MarkdownV2.
fn help_page(registry: &Registry, index: usize) -> String {
    let mut lines: Vec<String> = registry
        .commands()
        .list_all()
        .map(|entry| match entry.help().description.as_deref() {
            Some(description) if !description.is_empty() => {
                format!("/{}: {}", entry.name(), description)
            }
            _ => format!("/{}", entry.name()),
        })
        .collect();
    lines.sort();

    let pages = page_count(registry);
    let index = index.min(pages - 1);
    let page: Vec<String> = lines
        .iter()
        .skip(index * COMMANDS_PER_PAGE)
        .take(COMMANDS_PER_PAGE)
        .map(escape_markdown)
        .collect();

    format!(
        "Commands list: page {}/{}\n{}",
        index + 1,
        pages,
        page.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_page() {
        assert_eq!(current_page("Commands list: page 2/3\n/ping"), Some(2));
        assert_eq!(current_page("Commands list: page 1/1"), Some(1));
        assert_eq!(current_page("something else"), None);
        assert_eq!(current_page(""), None);
    }

    #[test]
    fn test_help_buttons_route_to_menu() {
        let keyboard = help_buttons();
        let data: Vec<&str> = keyboard.rows[0]
            .iter()
            .map(|b| b.callback_data.as_str())
            .collect();
        assert_eq!(data, ["help_menu_page;a: p", "help_menu_page;a: n"]);
    }
}
