use super::model::{
    ATTRIBUTE_NAMESPACE, ATTRIBUTE_SERVICE_NAME, ATTRIBUTE_SPAN_DURATION, ATTRIBUTE_SPAN_NAME,
    ATTRIBUTE_STATUS, ATTRIBUTE_TRACE_DURATION, DurationField, Filter,
};
use super::tokenizer::escape_value;

/// Serialize a [`Filter`] to canonical query text.
///
/// Clauses appear in a fixed order: service name, span name, namespace,
/// status, span duration, trace duration, then custom matchers in their
/// stored order. Parsing the result yields the same filter back, and text
/// that was produced here survives a round trip byte for byte. An empty
/// filter renders as `{}`.
pub fn serialize(filter: &Filter) -> String {
    let mut clauses: Vec<String> = Vec::new();

    push_group(&mut clauses, ATTRIBUTE_SERVICE_NAME, &filter.service_name);
    push_group(&mut clauses, ATTRIBUTE_SPAN_NAME, &filter.span_name);
    push_group(&mut clauses, ATTRIBUTE_NAMESPACE, &filter.namespace);
    push_status(&mut clauses, &filter.status);
    push_duration(&mut clauses, ATTRIBUTE_SPAN_DURATION, &filter.span_duration);
    push_duration(&mut clauses, ATTRIBUTE_TRACE_DURATION, &filter.trace_duration);
    clauses.extend(filter.custom_matchers.iter().cloned());

    if clauses.is_empty() {
        return "{}".to_string();
    }
    format!("{{ {} }}", clauses.join(" && "))
}

/// Render an OR-combined string group: `key = "v"` for a single value,
/// `key =~ "v1|v2"` for several. A single value is escaped; alternation
/// values are joined verbatim, mirroring how parse splits them.
fn push_group(clauses: &mut Vec<String>, attribute: &str, values: &[String]) {
    match values {
        [] => {}
        [value] => clauses.push(format!("{attribute} = \"{}\"", escape_value(value))),
        _ => clauses.push(format!("{attribute} =~ \"{}\"", values.join("|"))),
    }
}

/// Status values render unquoted: `status = ok` for a single value, the
/// parenthesized `(status = ok || status = error)` form for several.
fn push_status(clauses: &mut Vec<String>, values: &[String]) {
    match values {
        [] => {}
        [value] => clauses.push(format!("{ATTRIBUTE_STATUS} = {value}")),
        _ => {
            let alternatives: Vec<String> = values
                .iter()
                .map(|value| format!("{ATTRIBUTE_STATUS} = {value}"))
                .collect();
            clauses.push(format!("({})", alternatives.join(" || ")));
        }
    }
}

fn push_duration(clauses: &mut Vec<String>, attribute: &str, field: &DurationField) {
    if let Some(min) = &field.min {
        clauses.push(format!("{attribute} >= {min}"));
    }
    if let Some(max) = &field.max {
        clauses.push(format!("{attribute} <= {max}"));
    }
}
