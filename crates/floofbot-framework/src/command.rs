//! Command registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use floofbot_core::{Failure, LoaderError};

use crate::handler::{BoxedCommandHandler, CommandHandler};
use crate::help::HelpData;
use crate::schema::{ArgumentSchema, Args, CompiledParser};

/// A registered command.
#[derive(Clone)]
pub struct CommandEntry {
    name: String,
    plugin: String,
    handler: BoxedCommandHandler,
    parser: Option<CompiledParser>,
    help: HelpData,
}

impl CommandEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the plugin that registered this command.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn handler(&self) -> &BoxedCommandHandler {
        &self.handler
    }

    pub fn help(&self) -> &HelpData {
        &self.help
    }

    /// Rendered MarkdownV2 help text.
    pub fn render_help(&self) -> String {
        self.help.render()
    }

    /// Parses the trailing text of an invocation.
    ///
    /// Commands declared without a schema ignore their trailing text. Parse
    /// errors become syntax failures carrying this command's help.
    pub fn parse(&self, text: &str) -> Result<Args, Failure> {
        match &self.parser {
            None => Ok(Args::empty()),
            Some(parser) => parser
                .parse(text)
                .map_err(|err| Failure::from(err).with_help(self.render_help())),
        }
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("plugin", &self.plugin)
            .field("has_parser", &self.parser.is_some())
            .finish()
    }
}

/// Mapping from command name to [`CommandEntry`].
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    entries: HashMap<String, CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `schema` (if any) and inserts a new command.
    ///
    /// `help` overrides the schema description in the rendered help.
    ///
    /// # Errors
    ///
    /// [`LoaderError::DuplicateCommand`] if `name` is taken,
    /// [`LoaderError::InvalidName`] for a malformed name, or any schema
    /// compilation error.
    pub fn register<H>(
        &mut self,
        plugin: &str,
        name: &str,
        handler: H,
        schema: Option<&ArgumentSchema>,
        help: Option<String>,
    ) -> Result<(), LoaderError>
    where
        H: CommandHandler,
    {
        validate_name(name)?;
        if self.entries.contains_key(name) {
            return Err(LoaderError::DuplicateCommand {
                name: name.to_string(),
                plugin: plugin.to_string(),
            });
        }

        let parser = schema.map(CompiledParser::compile).transpose()?;
        let help = HelpData {
            name: name.to_string(),
            description: help.or_else(|| schema.and_then(|s| s.description.clone())),
            arguments: parser.as_ref().map(CompiledParser::arguments).unwrap_or_default(),
        };

        self.entries.insert(
            name.to_string(),
            CommandEntry {
                name: name.to_string(),
                plugin: plugin.to_string(),
                handler: Arc::new(handler),
                parser,
                help,
            },
        );
        Ok(())
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.get(name)
    }

    /// Every registered command, in no particular order.
    pub fn list_all(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rejects names that cannot be routed.
pub(crate) fn validate_name(name: &str) -> Result<(), LoaderError> {
    if name.is_empty() || name.contains(char::is_whitespace) || name.contains(';') {
        return Err(LoaderError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::schema::ArgumentField;
    use floofbot_core::{CommandEvent, FailureKind, HandlerResult};

    async fn noop(_host: Host, _event: CommandEvent, _args: Args) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = CommandRegistry::new();
        registry.register("test", "ping", noop, None, None).unwrap();

        assert!(registry.lookup("ping").is_some());
        assert!(registry.lookup("Ping").is_none());
        assert!(registry.lookup("pong").is_none());
        assert_eq!(registry.lookup("ping").unwrap().plugin(), "test");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_names_fail() {
        let mut registry = CommandRegistry::new();
        registry.register("a", "ping", noop, None, None).unwrap();
        let err = registry.register("b", "ping", noop, None, None).unwrap_err();
        assert_eq!(
            err,
            LoaderError::DuplicateCommand {
                name: "ping".into(),
                plugin: "b".into(),
            }
        );
        assert_eq!(registry.lookup("ping").unwrap().plugin(), "a");
    }

    #[test]
    fn test_invalid_names_fail() {
        let mut registry = CommandRegistry::new();
        for name in ["", "two words", "a;b"] {
            assert!(matches!(
                registry.register("test", name, noop, None, None),
                Err(LoaderError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_schema_errors_abort_registration() {
        let mut registry = CommandRegistry::new();
        let schema = ArgumentSchema::new().field(ArgumentField::new("flag", "boolean"));
        assert!(registry.register("test", "flag", noop, Some(&schema), None).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parse_failure_carries_help() {
        let mut registry = CommandRegistry::new();
        let schema = ArgumentSchema::new().field(ArgumentField::integer("count").default(0));
        registry
            .register("test", "count", noop, Some(&schema), Some("Counts.".into()))
            .unwrap();

        let entry = registry.lookup("count").unwrap();
        let failure = entry.parse("abc").unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Syntax);
        assert_eq!(failure.help(), Some(entry.render_help().as_str()));
        assert!(entry.render_help().starts_with("Counts\\.\n\n"));
    }

    #[test]
    fn test_commands_without_schema_ignore_text() {
        let mut registry = CommandRegistry::new();
        registry.register("test", "ping", noop, None, None).unwrap();
        let args = registry.lookup("ping").unwrap().parse("anything \"at all").unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_list_all() {
        let mut registry = CommandRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register("test", name, noop, None, None).unwrap();
        }
        let mut names: Vec<&str> = registry.list_all().map(CommandEntry::name).collect();
        names.sort_unstable();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
