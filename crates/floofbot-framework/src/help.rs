//! Help text rendering.

use floofbot_core::escape_markdown;

use crate::schema::ArgumentHelp;

/// Everything needed to describe one command to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct HelpData {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentHelp>,
}

impl HelpData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
        }
    }

    /// Renders the help as MarkdownV2.
    ///
    /// The output only depends on the declared metadata, so repeated calls
    /// produce identical text.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&escape_markdown(description));
            out.push_str("\n\n");
        }

        out.push_str("Syntax: `/");
        out.push_str(&escape_code(&self.name));
        for arg in &self.arguments {
            out.push(' ');
            out.push_str(&escape_code(&arg.name));
        }
        out.push('`');

        if !self.arguments.is_empty() {
            out.push_str("\n\nArguments:");
            for arg in &self.arguments {
                out.push('\n');
                out.push_str(&render_argument(arg));
            }
        }

        out
    }
}

fn render_argument(arg: &ArgumentHelp) -> String {
    let kind = if arg.optional {
        format!("(optional {})", arg.type_name)
    } else {
        format!("({})", arg.type_name)
    };

    let mut line = format!(" • `{}` {}", escape_code(&arg.name), escape_markdown(kind));
    if let Some(default) = &arg.default {
        line.push_str(&format!(
            " \\[default: {}\\]",
            escape_markdown(default.to_string())
        ));
    }
    if let Some(description) = &arg.description {
        line.push_str(": ");
        line.push_str(&escape_markdown(description));
    }
    line
}

/// Inside code spans only the backtick and backslash are special.
pub(crate) fn escape_code(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`")
}
