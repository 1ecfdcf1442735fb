//! MarkdownV2 escaping.

/// Characters that must be backslash-escaped in MarkdownV2 text.
const ESCAPED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.',
    '!',
];

/// Escapes `text` so that it renders literally in a MarkdownV2 message.
pub fn escape_markdown(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if ESCAPED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_markdown("hello world"), "hello world");
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape_markdown("a_b*c"), r"a\_b\*c");
        assert_eq!(escape_markdown("[default: 0]"), r"\[default: 0\]");
        assert_eq!(escape_markdown("v1.0!"), r"v1\.0\!");
        assert_eq!(escape_markdown(r"back\slash"), r"back\\slash");
    }

    #[test]
    fn test_escape_is_not_idempotent() {
        let once = escape_markdown("a.b");
        assert_eq!(escape_markdown(&once), r"a\\\.b");
    }
}
