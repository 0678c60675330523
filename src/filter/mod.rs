//! Trace filter model and query text translation
//!
//! This module converts between a structured [`Filter`] over common tracing
//! attributes and the `{ ... }` query text form, in both directions. Text
//! produced by [`serialize`] parses back to the same filter, byte for byte.
//!
//! # Syntax
//!
//! ```text
//! { clause && clause && ... }   Clauses combine with AND
//! key = "value"                 Single value for a string attribute
//! key =~ "a|b|c"                Several values combine with OR
//! (status = ok || status = unset)
//! duration >= 100ms             Duration bounds (>=, <= and =)
//! ```
//!
//! # Attributes
//!
//! - `resource.service.name` - Service name
//! - `name` - Span name (the top-level attribute, not `span.name`)
//! - `resource.service.namespace` - Service namespace
//! - `status` - Span status, written unquoted
//! - `duration` / `traceDuration` - Span and trace duration bounds
//!
//! Every other clause passes through verbatim as a custom matcher, so a
//! valid query stays valid after a round trip even when the translator does
//! not understand it.
//!
//! # Examples
//!
//! ```text
//! {}                                                    # Matches everything
//! { status = error }                                    # Failed spans
//! { resource.service.name =~ "shop|billing" }           # Either service
//! { duration >= 100ms && duration <= 2s }               # Slow spans
//! { span.http.status_code>=500 }                        # Custom matcher
//! ```

pub mod model;
pub mod parse;
pub mod serialize;
pub mod tokenizer;

pub use model::{
    ATTRIBUTE_NAMESPACE, ATTRIBUTE_SERVICE_NAME, ATTRIBUTE_SPAN_DURATION, ATTRIBUTE_SPAN_NAME,
    ATTRIBUTE_STATUS, ATTRIBUTE_TRACE_DURATION, DurationField, Filter,
};
pub use parse::parse;
pub use serialize::serialize;
pub use tokenizer::split_unquoted_whitespace;
