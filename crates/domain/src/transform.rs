use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::workflow::TransformOperation;

/// Errors raised by transform operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Regular expression failed to compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Pattern as authored.
        pattern: String,
        /// Compiler detail.
        message: String,
    },
    /// `json_path` input was not valid JSON.
    #[error("invalid JSON input")]
    InvalidJson,
}

/// Applies a transform operation to the step input.
pub fn apply_transform(operation: &TransformOperation, input: &str) -> Result<String, TransformError> {
    match operation {
        TransformOperation::Extract {
            pattern: Some(pattern),
        } => {
            let regex = compile(pattern)?;
            let matches: Vec<&str> = regex.find_iter(input).map(|found| found.as_str()).collect();
            Ok(matches.join("\n"))
        }
        TransformOperation::Replace {
            pattern: Some(pattern),
            replacement: Some(replacement),
        } => {
            let regex = compile(pattern)?;
            let replacement = translate_replacement(replacement);
            Ok(regex.replace_all(input, replacement.as_str()).into_owned())
        }
        TransformOperation::Format => Ok(input.split_whitespace().collect::<Vec<_>>().join(" ")),
        TransformOperation::JsonPath {
            json_path: Some(path),
        } => select_json_path(input, path),
        TransformOperation::Extract { pattern: None }
        | TransformOperation::Replace { .. }
        | TransformOperation::JsonPath { json_path: None }
        | TransformOperation::Passthrough { .. } => Ok(input.to_owned()),
    }
}

fn compile(pattern: &str) -> Result<Regex, TransformError> {
    Regex::new(pattern).map_err(|error| TransformError::InvalidPattern {
        pattern: pattern.to_owned(),
        message: error.to_string(),
    })
}

/// Rewrites `$&`, `$1` and `$<name>` references into the `${...}` form and
/// escapes any other `$` so it stays literal.
fn translate_replacement(replacement: &str) -> String {
    let mut translated = String::with_capacity(replacement.len() + 8);
    let mut chars = replacement.chars().peekable();

    while let Some(character) = chars.next() {
        if character != '$' {
            translated.push(character);
            continue;
        }

        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                translated.push_str("$$");
            }
            Some('&') => {
                chars.next();
                translated.push_str("${0}");
            }
            Some(digit) if digit.is_ascii_digit() => {
                let mut group = String::new();
                while let Some(next) = chars.peek().copied().filter(char::is_ascii_digit) {
                    group.push(next);
                    chars.next();
                }
                translated.push_str(&format!("${{{group}}}"));
            }
            Some('<') => {
                let rest: String = chars.clone().skip(1).collect();
                match rest.find('>') {
                    Some(end) if end > 0 => {
                        let name = &rest[..end];
                        for _ in 0..name.chars().count() + 2 {
                            chars.next();
                        }
                        translated.push_str(&format!("${{{name}}}"));
                    }
                    _ => translated.push_str("$$"),
                }
            }
            _ => translated.push_str("$$"),
        }
    }

    translated
}

fn select_json_path(input: &str, path: &str) -> Result<String, TransformError> {
    let document: Value = serde_json::from_str(input).map_err(|_| TransformError::InvalidJson)?;

    let mut current = &document;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        };

        match next {
            Some(value) => current = value,
            None => return Ok(String::new()),
        }
    }

    Ok(match current {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{TransformError, apply_transform};
    use crate::workflow::TransformOperation;

    fn extract(pattern: &str) -> TransformOperation {
        TransformOperation::Extract {
            pattern: Some(pattern.to_owned()),
        }
    }

    fn json_path(path: &str) -> TransformOperation {
        TransformOperation::JsonPath {
            json_path: Some(path.to_owned()),
        }
    }

    #[test]
    fn format_trims_and_collapses_whitespace() {
        assert_eq!(
            apply_transform(&TransformOperation::Format, "  a   b  "),
            Ok("a b".to_owned())
        );
        assert_eq!(
            apply_transform(&TransformOperation::Format, "line\n\n\tnext"),
            Ok("line next".to_owned())
        );
    }

    #[test]
    fn extract_joins_all_matches_with_newlines() {
        assert_eq!(
            apply_transform(&extract(r"\d+"), "value: 42 and 7"),
            Ok("42\n7".to_owned())
        );
        assert_eq!(apply_transform(&extract(r"\d+"), "none"), Ok(String::new()));
    }

    #[test]
    fn extract_without_pattern_is_passthrough() {
        let operation = TransformOperation::Extract { pattern: None };
        assert_eq!(apply_transform(&operation, "keep"), Ok("keep".to_owned()));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let result = apply_transform(&extract("(unclosed"), "text");
        assert!(matches!(result, Err(TransformError::InvalidPattern { .. })));
    }

    #[test]
    fn replace_supports_group_references() {
        let operation = TransformOperation::Replace {
            pattern: Some(r"(\w+)@(\w+)".to_owned()),
            replacement: Some("$2 at $1 ($&) costs $$5".to_owned()),
        };
        assert_eq!(
            apply_transform(&operation, "ada@host"),
            Ok("host at ada (ada@host) costs $5".to_owned())
        );
    }

    #[test]
    fn replace_supports_named_groups_and_literal_dollars() {
        let operation = TransformOperation::Replace {
            pattern: Some(r"(?P<word>cat)".to_owned()),
            replacement: Some("[$<word>] $x".to_owned()),
        };
        assert_eq!(
            apply_transform(&operation, "a cat"),
            Ok("a [cat] $x".to_owned())
        );
    }

    #[test]
    fn replace_without_replacement_is_passthrough() {
        let operation = TransformOperation::Replace {
            pattern: Some("a".to_owned()),
            replacement: None,
        };
        assert_eq!(apply_transform(&operation, "aaa"), Ok("aaa".to_owned()));
    }

    #[test]
    fn json_path_returns_strings_unquoted() {
        assert_eq!(
            apply_transform(&json_path("a.b"), r#"{"a":{"b":"x"}}"#),
            Ok("x".to_owned())
        );
    }

    #[test]
    fn json_path_stringifies_other_values() {
        let input = r#"{"items":[{"n":1},{"n":2}],"flag":true}"#;
        assert_eq!(apply_transform(&json_path("items.1.n"), input), Ok("2".to_owned()));
        assert_eq!(apply_transform(&json_path("flag"), input), Ok("true".to_owned()));
        assert_eq!(
            apply_transform(&json_path("items.0"), input),
            Ok(r#"{"n":1}"#.to_owned())
        );
    }

    #[test]
    fn json_path_missing_key_yields_empty_output() {
        assert_eq!(
            apply_transform(&json_path("a.c"), r#"{"a":{"b":"x"}}"#),
            Ok(String::new())
        );
    }

    #[test]
    fn json_path_rejects_invalid_json() {
        let result = apply_transform(&json_path("a"), "not json");
        assert_eq!(result, Err(TransformError::InvalidJson));
        assert_eq!(TransformError::InvalidJson.to_string(), "invalid JSON input");
    }

    #[test]
    fn unknown_operation_returns_input_unchanged() {
        let operation = TransformOperation::Passthrough {
            operation: Some("uppercase".to_owned()),
        };
        assert_eq!(apply_transform(&operation, "  Mixed  "), Ok("  Mixed  ".to_owned()));
    }
}
