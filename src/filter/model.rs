use serde::{Deserialize, Serialize};

/// Attribute key for the service name of the resource a span belongs to.
pub const ATTRIBUTE_SERVICE_NAME: &str = "resource.service.name";
/// Attribute key for the span name (a top-level intrinsic).
pub const ATTRIBUTE_SPAN_NAME: &str = "name";
/// Attribute key for the service namespace.
pub const ATTRIBUTE_NAMESPACE: &str = "resource.service.namespace";
/// Attribute key for the span status.
pub const ATTRIBUTE_STATUS: &str = "status";
/// Attribute key for the duration of a single span.
pub const ATTRIBUTE_SPAN_DURATION: &str = "duration";
/// Attribute key for the total duration of a trace.
pub const ATTRIBUTE_TRACE_DURATION: &str = "traceDuration";

/// A filter over common tracing attributes.
///
/// Attributes are combined with AND; the values of one attribute are
/// combined with OR. Value order is preserved so that a filter converts
/// back to the exact query text it was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Filter {
    pub service_name: Vec<String>,
    pub span_name: Vec<String>,
    pub namespace: Vec<String>,
    /// Span status values, usually one of "ok", "error", "unset".
    pub status: Vec<String>,
    pub span_duration: DurationField,
    pub trace_duration: DurationField,
    /// Matcher expressions that are carried through verbatim.
    pub custom_matchers: Vec<String>,
}

/// Bounds on a duration attribute. The values are kept as written
/// (a number followed by a unit, e.g. "100ms").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

impl Filter {
    /// Check if this filter is empty (matches everything).
    pub fn is_empty(&self) -> bool {
        self.service_name.is_empty()
            && self.span_name.is_empty()
            && self.namespace.is_empty()
            && self.status.is_empty()
            && self.span_duration.is_empty()
            && self.trace_duration.is_empty()
            && self.custom_matchers.is_empty()
    }
}

impl DurationField {
    /// Check if neither bound is set.
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_filter() {
        assert!(Filter::default().is_empty());

        let filter = Filter {
            status: vec!["error".to_string()],
            ..Default::default()
        };
        assert!(!filter.is_empty());

        let filter = Filter {
            span_duration: DurationField {
                min: Some("100ms".to_string()),
                max: None,
            },
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let filter = Filter {
            service_name: vec!["shop".to_string()],
            span_duration: DurationField {
                min: Some("100ms".to_string()),
                max: None,
            },
            ..Default::default()
        };

        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            value,
            json!({
                "serviceName": ["shop"],
                "spanName": [],
                "namespace": [],
                "status": [],
                "spanDuration": { "min": "100ms" },
                "traceDuration": {},
                "customMatchers": [],
            })
        );
    }

    #[test]
    fn test_deserializes_missing_fields_to_defaults() {
        let filter: Filter = serde_json::from_value(json!({
            "serviceName": ["shop"],
        }))
        .unwrap();

        assert_eq!(filter.service_name, vec!["shop"]);
        assert!(filter.span_name.is_empty());
        assert!(filter.span_duration.is_empty());
        assert!(filter.custom_matchers.is_empty());
    }
}
