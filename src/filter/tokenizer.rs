/// Split a string by whitespace, except when inside quotes.
///
/// A `"` toggles the quoted state unless the immediately preceding character
/// is a backslash. Consecutive separators produce no empty tokens. An
/// unterminated quote extends to the end of the input.
pub fn split_unquoted_whitespace(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    let mut prev = None;

    for (i, c) in input.char_indices() {
        match c {
            '"' if prev != Some('\\') => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if i > start {
                    tokens.push(&input[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
        prev = Some(c);
    }

    if start < input.len() {
        tokens.push(&input[start..]);
    }

    tokens
}

/// Remove one pair of enclosing double quotes, if present.
pub(crate) fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// Escape a value for embedding in a quoted string: `\` becomes `\\`,
/// `"` becomes `\"`. Backslashes are escaped first.
pub(crate) fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Invert [`escape_value`]: `\\` becomes `\` and `\"` becomes `"`.
/// A backslash before any other character is kept as written.
pub(crate) fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_empty_input() {
        assert_eq!(split_unquoted_whitespace(""), Vec::<&str>::new());
    }

    #[test]
    fn test_split_single_token() {
        assert_eq!(split_unquoted_whitespace("key=value"), vec!["key=value"]);
    }

    #[test]
    fn test_split_collapses_consecutive_spaces() {
        assert_eq!(
            split_unquoted_whitespace("key=value    key2=value2"),
            vec!["key=value", "key2=value2"]
        );
    }

    #[test]
    fn test_split_preserves_quoted_spaces() {
        assert_eq!(
            split_unquoted_whitespace("key=\"string value value2\""),
            vec!["key=\"string value value2\""]
        );
    }

    #[test]
    fn test_split_mixed_tokens() {
        assert_eq!(
            split_unquoted_whitespace("key=value   key2=value2 key3=\"string value\""),
            vec!["key=value", "key2=value2", "key3=\"string value\""]
        );
    }

    #[test]
    fn test_split_escaped_quote_does_not_toggle() {
        assert_eq!(
            split_unquoted_whitespace("name=\"span \\\" name\" next"),
            vec!["name=\"span \\\" name\"", "next"]
        );
    }

    #[test]
    fn test_split_unterminated_quote_extends_to_end() {
        assert_eq!(
            split_unquoted_whitespace("a \"bc d"),
            vec!["a", "\"bc d"]
        );
    }

    #[test]
    fn test_split_leading_and_trailing_spaces() {
        assert_eq!(split_unquoted_whitespace("  a b  "), vec!["a", "b"]);
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"quoted\""), "quoted");
        assert_eq!(strip_quotes("bare"), "bare");
        assert_eq!(strip_quotes("\"dangling"), "\"dangling");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("\"\""), "");
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("plain"), "plain");
        assert_eq!(escape_value("span\"name"), "span\\\"name");
        assert_eq!(escape_value("service \\ \" end"), "service \\\\ \\\" end");
    }

    #[test]
    fn test_unescape_value() {
        assert_eq!(unescape_value("plain"), "plain");
        assert_eq!(unescape_value("span\\\"name"), "span\"name");
        assert_eq!(unescape_value("service \\\\ \\\" end"), "service \\ \" end");
    }

    #[test]
    fn test_unescape_keeps_unknown_escapes() {
        assert_eq!(unescape_value("a\\xb"), "a\\xb");
        assert_eq!(unescape_value("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_escape_unescape_inverse() {
        for value in ["", "a b", "\\", "\"", "\\\"", "mixed \\ and \" chars"] {
            assert_eq!(unescape_value(&escape_value(value)), value);
        }
    }
}
