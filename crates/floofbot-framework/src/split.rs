//! Shell-style tokenization of command arguments.

use thiserror::Error;

/// Errors raised while splitting argument text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("No closing quotation")]
    UnclosedQuote,

    #[error("No escaped character")]
    TrailingEscape,
}

/// Splits `input` into arguments using shell quoting rules.
///
/// Handles:
/// - Space-separated arguments
/// - Quoted strings (single and double quotes); `""` yields an empty argument
/// - Backslash escapes outside quotes, and `\"` / `\\` inside double quotes
pub fn shell_split(input: &str) -> Result<Vec<String>, SplitError> {
    let mut args = Vec::new();
    let mut current = String::new();
    // A quoted empty string still produces an argument.
    let mut in_token = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_double_quote => match chars.peek() {
                Some(&next @ ('"' | '\\')) => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push('\\'),
            },
            '\\' if !in_single_quote => {
                let next = chars.next().ok_or(SplitError::TrailingEscape)?;
                current.push(next);
                in_token = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                in_token = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                in_token = true;
            }
            c if c.is_whitespace() && !in_single_quote && !in_double_quote => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if in_single_quote || in_double_quote {
        return Err(SplitError::UnclosedQuote);
    }
    if in_token {
        args.push(current);
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_split_simple() {
        let args = shell_split("hello world").unwrap();
        assert_eq!(args, vec!["hello", "world"]);
    }

    #[test]
    fn test_shell_split_quoted() {
        let args = shell_split(r#""hello world" test"#).unwrap();
        assert_eq!(args, vec!["hello world", "test"]);
    }

    #[test]
    fn test_shell_split_single_quoted() {
        let args = shell_split("'hello world' test").unwrap();
        assert_eq!(args, vec!["hello world", "test"]);
    }

    #[test]
    fn test_shell_split_mixed_quotes() {
        let args = shell_split(r#""double's quote" 'single"s quote'"#).unwrap();
        assert_eq!(args, vec!["double's quote", r#"single"s quote"#]);
    }

    #[test]
    fn test_shell_split_escapes() {
        let args = shell_split(r#"a\ b "say \"hi\"" 'raw\n'"#).unwrap();
        assert_eq!(args, vec!["a b", r#"say "hi""#, r"raw\n"]);
    }

    #[test]
    fn test_shell_split_empty_quotes() {
        let args = shell_split(r#""" x"#).unwrap();
        assert_eq!(args, vec!["", "x"]);
    }

    #[test]
    fn test_shell_split_empty() {
        assert!(shell_split("").unwrap().is_empty());
        assert!(shell_split("   \t  ").unwrap().is_empty());
    }

    #[test]
    fn test_shell_split_unclosed_quote() {
        assert_eq!(shell_split(r#"say "hi"#), Err(SplitError::UnclosedQuote));
        assert_eq!(shell_split("it's"), Err(SplitError::UnclosedQuote));
    }

    #[test]
    fn test_shell_split_trailing_escape() {
        assert_eq!(shell_split(r"oops\"), Err(SplitError::TrailingEscape));
    }
}
