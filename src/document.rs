//! Conversions between `serde_json::Value` and the AWS SDK `Document` type.
//!
//! Retrieval metadata and tool-use inputs arrive as smithy documents; the
//! rest of the crate works with `serde_json` values.

use std::collections::HashMap;

use aws_smithy_types::{Document, Number};
use serde_json::Value;

/// Converts a smithy document to a JSON value.
///
/// Non-finite floats become `null` since JSON cannot represent them.
#[must_use]
pub fn to_json(doc: &Document) -> Value {
    match doc {
        Document::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        Document::Array(items) => Value::Array(items.iter().map(to_json).collect()),
        Document::Number(Number::PosInt(n)) => Value::from(*n),
        Document::Number(Number::NegInt(n)) => Value::from(*n),
        Document::Number(Number::Float(f)) => {
            serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
        }
        Document::String(s) => Value::String(s.clone()),
        Document::Bool(b) => Value::Bool(*b),
        Document::Null => Value::Null,
    }
}

/// Converts a JSON value to a smithy document.
#[must_use]
pub fn from_json(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(from_json).collect()),
        Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// Converts a metadata map to a JSON object map.
#[must_use]
pub fn metadata_to_json(metadata: &HashMap<String, Document>) -> serde_json::Map<String, Value> {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), to_json(v)))
        .collect()
}
