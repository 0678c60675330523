use super::model::{
    ATTRIBUTE_NAMESPACE, ATTRIBUTE_SERVICE_NAME, ATTRIBUTE_SPAN_DURATION, ATTRIBUTE_SPAN_NAME,
    ATTRIBUTE_STATUS, ATTRIBUTE_TRACE_DURATION, Filter,
};
use super::tokenizer::{split_unquoted_whitespace, strip_quotes, unescape_value};

/// A single query clause, classified by its attribute key.
///
/// Anything that does not match a recognized attribute/operator combination
/// becomes a `Custom` clause and is carried through verbatim; classification
/// never rejects input.
#[derive(Debug)]
enum Clause {
    /// Values for one of the OR-combined string groups.
    Group(GroupKey, Vec<String>),
    /// A bound on one of the duration attributes.
    Duration(DurationKey, DurationOp, String),
    /// A clause the translator does not interpret, preserved as written.
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKey {
    ServiceName,
    SpanName,
    Namespace,
    Status,
}

#[derive(Debug, Clone, Copy)]
enum DurationKey {
    Span,
    Trace,
}

#[derive(Debug, Clone, Copy)]
enum DurationOp {
    Min,
    Max,
    Exact,
}

/// Parse query text into a [`Filter`].
///
/// The input is the `{ ... }` form produced by `serialize`: clauses joined
/// with `&&`, each `attribute operator value`, with `=~` alternation and
/// parenthesized `status` equalities for OR-combined values.
///
/// Parsing is total. Unrecognized clauses become custom matchers instead of
/// errors, a missing brace is tolerated, and an unterminated quote extends
/// to the end of the input. A recognized clause also passes through when its
/// value could not be read back from serialized text: a status value that
/// cannot stand unquoted, or a quoted value ending in a backslash.
pub fn parse(query: &str) -> Filter {
    let body = strip_braces(query.trim());
    let tokens = split_unquoted_whitespace(body);

    let mut filter = Filter::default();
    for clause_tokens in tokens.split(|token| *token == "&&") {
        if clause_tokens.is_empty() {
            continue;
        }
        apply(&mut filter, classify(clause_tokens));
    }

    filter
}

/// Remove one enclosing `{ }` pair. Either brace may be missing; the rest of
/// the text still parses in a single pass.
fn strip_braces(query: &str) -> &str {
    let inner = query.strip_prefix('{').unwrap_or(query);
    inner.strip_suffix('}').unwrap_or(inner)
}

fn classify(tokens: &[&str]) -> Clause {
    if let Some(clause) = classify_status_alternation(tokens) {
        return clause;
    }
    if let &[attribute, operator, value] = tokens
        && let Some(clause) = classify_matcher(attribute, operator, value)
    {
        return clause;
    }
    Clause::Custom(tokens.join(" "))
}

/// Map an `attribute operator value` clause onto a filter field. Returns
/// `None` when the combination is not part of the filter model, or when the
/// value could not be read back from serialized text (see [`round_trips`]).
fn classify_matcher(attribute: &str, operator: &str, value: &str) -> Option<Clause> {
    if let Some(group) = string_group(attribute) {
        return match operator {
            "=" => {
                let unescaped = unescape_value(strip_quotes(value));
                round_trips(group, &unescaped).then(|| Clause::Group(group, vec![unescaped]))
            }
            // Alternation values are split but not unescaped; serialize
            // joins them back verbatim.
            "=~" => {
                let values: Vec<String> =
                    strip_quotes(value).split('|').map(str::to_string).collect();
                let ok = match (group, values.as_slice()) {
                    (GroupKey::Status, _) => values.iter().all(|v| round_trips(group, v)),
                    // A single alternative renders back through the quoted
                    // `=` form.
                    (_, [only]) => round_trips(group, only),
                    _ => alternation_round_trips(&values),
                };
                ok.then(|| Clause::Group(group, values))
            }
            _ => None,
        };
    }

    let key = match attribute {
        ATTRIBUTE_SPAN_DURATION => DurationKey::Span,
        ATTRIBUTE_TRACE_DURATION => DurationKey::Trace,
        _ => return None,
    };
    let op = match operator {
        ">=" => DurationOp::Min,
        "<=" => DurationOp::Max,
        "=" => DurationOp::Exact,
        _ => return None,
    };
    Some(Clause::Duration(key, op, value.to_string()))
}

/// Whether a parsed value reads back as itself from serialized text.
///
/// Status values render unquoted, so they must hold a single bare token
/// that is not query punctuation. Quoted values must not end in a
/// backslash: the escaped form would end in `\\"` and the closing quote
/// would read as escaped on the way back in. Values that fail the check
/// stay in their clause, which passes through as a custom matcher.
fn round_trips(group: GroupKey, value: &str) -> bool {
    match group {
        GroupKey::Status => {
            !value.is_empty()
                && value != "&&"
                && value != "||"
                && !value.contains([' ', '"', '(', ')'])
        }
        _ => !value.ends_with('\\'),
    }
}

/// Whether alternation values read back unchanged from the `key =~ "v1|v2"`
/// rendering, where the joined values sit verbatim between fresh quotes.
/// Walks the joined text the way the tokenizer would: the wrapping quote
/// must still be open and unescaped when it closes, with no unquoted space
/// in between.
fn alternation_round_trips(values: &[String]) -> bool {
    let joined = values.join("|");
    let mut in_quotes = true;
    let mut prev = '"';
    for c in joined.chars() {
        match c {
            '"' if prev != '\\' => in_quotes = !in_quotes,
            ' ' if !in_quotes => return false,
            _ => {}
        }
        prev = c;
    }
    in_quotes && prev != '\\'
}

fn string_group(attribute: &str) -> Option<GroupKey> {
    match attribute {
        ATTRIBUTE_SERVICE_NAME => Some(GroupKey::ServiceName),
        ATTRIBUTE_SPAN_NAME => Some(GroupKey::SpanName),
        ATTRIBUTE_NAMESPACE => Some(GroupKey::Namespace),
        ATTRIBUTE_STATUS => Some(GroupKey::Status),
        _ => None,
    }
}

/// Recognize a parenthesized `(status = a || status = b)` group and flatten
/// the alternatives into status values. Any other parenthesized content
/// returns `None` and falls through to a custom matcher.
fn classify_status_alternation(tokens: &[&str]) -> Option<Clause> {
    let mut inner = tokens.to_vec();
    let last = inner.len().checked_sub(1)?;
    inner[0] = inner[0].strip_prefix('(')?;
    inner[last] = inner[last].strip_suffix(')')?;

    let mut values = Vec::new();
    for alternative in inner.split(|token| *token == "||") {
        match alternative {
            &[ATTRIBUTE_STATUS, "=", value] => values.push(unescape_value(strip_quotes(value))),
            _ => return None,
        }
    }
    if !values.iter().all(|value| round_trips(GroupKey::Status, value)) {
        return None;
    }

    Some(Clause::Group(GroupKey::Status, values))
}

fn apply(filter: &mut Filter, clause: Clause) {
    match clause {
        Clause::Group(key, values) => {
            let group = match key {
                GroupKey::ServiceName => &mut filter.service_name,
                GroupKey::SpanName => &mut filter.span_name,
                GroupKey::Namespace => &mut filter.namespace,
                GroupKey::Status => &mut filter.status,
            };
            group.extend(values);
        }
        Clause::Duration(key, op, value) => {
            let field = match key {
                DurationKey::Span => &mut filter.span_duration,
                DurationKey::Trace => &mut filter.trace_duration,
            };
            match op {
                DurationOp::Min => field.min = Some(value),
                DurationOp::Max => field.max = Some(value),
                DurationOp::Exact => {
                    field.min = Some(value.clone());
                    field.max = Some(value);
                }
            }
        }
        Clause::Custom(matcher) => filter.custom_matchers.push(matcher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_query() {
        assert_eq!(parse("{}"), Filter::default());
        assert_eq!(parse("{ }"), Filter::default());
        assert_eq!(parse(""), Filter::default());
    }

    #[test]
    fn test_parse_single_status() {
        let filter = parse("{ status = ok }");
        assert_eq!(filter.status, vec!["ok"]);
        assert!(filter.service_name.is_empty());
        assert!(filter.custom_matchers.is_empty());
    }

    #[test]
    fn test_parse_braces_without_padding() {
        let filter = parse("{status = ok}");
        assert_eq!(filter.status, vec!["ok"]);
    }

    #[test]
    fn test_parse_alternation_splits_values() {
        let filter = parse("{ resource.service.name =~ \"shop|billing\" }");
        assert_eq!(filter.service_name, vec!["shop", "billing"]);
    }

    #[test]
    fn test_parse_alternation_values_are_not_unescaped() {
        let filter = parse("{ name =~ \"a\\\"b|c\" }");
        assert_eq!(filter.span_name, vec!["a\\\"b", "c"]);
    }

    #[test]
    fn test_parse_unquotes_and_unescapes_equality_values() {
        let filter = parse("{ name = \"span\\\"name\" }");
        assert_eq!(filter.span_name, vec!["span\"name"]);

        let filter = parse("{ name = \"service \\\\ \\\" end\" }");
        assert_eq!(filter.span_name, vec!["service \\ \" end"]);
    }

    #[test]
    fn test_parse_status_alternation_group() {
        let filter = parse("{ (status = ok || status = unset) }");
        assert_eq!(filter.status, vec!["ok", "unset"]);
    }

    #[test]
    fn test_parse_non_status_alternation_stays_custom() {
        let filter = parse("{ (name = a || name = b) }");
        assert!(filter.span_name.is_empty());
        assert_eq!(filter.custom_matchers, vec!["(name = a || name = b)"]);
    }

    #[test]
    fn test_parse_duration_bounds() {
        let filter = parse("{ duration >= 100ms && duration <= 2s }");
        assert_eq!(filter.span_duration.min.as_deref(), Some("100ms"));
        assert_eq!(filter.span_duration.max.as_deref(), Some("2s"));
        assert!(filter.trace_duration.is_empty());

        let filter = parse("{ traceDuration >= 1s }");
        assert_eq!(filter.trace_duration.min.as_deref(), Some("1s"));
        assert!(filter.trace_duration.max.is_none());
    }

    #[test]
    fn test_parse_duration_equality_sets_both_bounds() {
        let filter = parse("{ duration = 5ms }");
        assert_eq!(filter.span_duration.min.as_deref(), Some("5ms"));
        assert_eq!(filter.span_duration.max.as_deref(), Some("5ms"));
    }

    #[test]
    fn test_parse_repeated_duration_bound_overwrites() {
        let filter = parse("{ duration >= 100ms && duration >= 200ms }");
        assert_eq!(filter.span_duration.min.as_deref(), Some("200ms"));
    }

    #[test]
    fn test_parse_repeated_string_clauses_accumulate() {
        let filter = parse("{ name = \"a\" && name = \"b\" }");
        assert_eq!(filter.span_name, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_routes_unknown_clauses_to_custom_matchers() {
        let filter = parse("{ span.http.status_code>=200 && event:name=\"test\" && foo = bar }");
        assert_eq!(
            filter.custom_matchers,
            vec!["span.http.status_code>=200", "event:name=\"test\"", "foo = bar"]
        );
    }

    #[test]
    fn test_parse_unknown_operator_on_known_key_stays_custom() {
        let filter = parse("{ duration > 100ms && name != \"x\" }");
        assert!(filter.span_duration.is_empty());
        assert!(filter.span_name.is_empty());
        assert_eq!(filter.custom_matchers, vec!["duration > 100ms", "name != \"x\""]);
    }

    #[test]
    fn test_parse_status_value_that_cannot_render_unquoted_stays_custom() {
        // Status renders unquoted, so a value with a space (or quotes or
        // parens) would not read back; the clause passes through instead.
        let filter = parse("{ status = \"a b\" }");
        assert!(filter.status.is_empty());
        assert_eq!(filter.custom_matchers, vec!["status = \"a b\""]);

        let filter = parse("{ (status = ok || status = \"a b\") }");
        assert!(filter.status.is_empty());
        assert_eq!(
            filter.custom_matchers,
            vec!["(status = ok || status = \"a b\")"]
        );
    }

    #[test]
    fn test_parse_value_with_trailing_backslash_stays_custom() {
        // A quoted rendering of a value ending in `\` would escape its own
        // closing quote, so the clause passes through instead.
        let filter = parse(r"{ name = end\\ }");
        assert!(filter.span_name.is_empty());
        assert_eq!(filter.custom_matchers, vec![r"name = end\\"]);

        let filter = parse(r"{ name =~ a|b\\ }");
        assert!(filter.span_name.is_empty());
        assert_eq!(filter.custom_matchers, vec![r"name =~ a|b\\"]);
    }

    #[test]
    fn test_parse_tolerates_malformed_input() {
        // Missing braces and an unterminated quote must not panic or loop.
        let filter = parse("status = error");
        assert_eq!(filter.status, vec!["error"]);

        let filter = parse("{ name = \"unterminated }");
        assert_eq!(filter.span_name.len(), 1);
    }
}
