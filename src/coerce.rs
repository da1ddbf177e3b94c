//! Coercion of raw string values into schema-typed JSON values.
//!
//! Path segments, headers and query parameters arrive as strings; the spec
//! declares them as typed schemas. Values are coerced by the declared type
//! before schema validation; a string that does not parse stays a string,
//! so the type mismatch surfaces as a normal schema violation.

use serde_json::Value;

use crate::spec::CollectionFormat;

/// Coerce a raw string against the schema's declared `type`.
pub(crate) fn coerce_from_string(raw: &str, schema: &Value) -> Value {
    match schema.get("type").and_then(Value::as_str) {
        Some("integer") => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(|v| serde_json::Number::from_f64(v).map(Value::Number))
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some("boolean") => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

/// Split a raw collection value on its format separator and coerce each item
/// against the array's `items` schema.
pub(crate) fn coerce_collection(raw: &str, format: CollectionFormat, schema: &Value) -> Value {
    let items_schema = schema.get("items").cloned().unwrap_or(Value::Null);
    let separator = match format {
        CollectionFormat::Csv => ',',
        CollectionFormat::Ssv => ' ',
        CollectionFormat::Tsv => '\t',
        CollectionFormat::Pipes => '|',
        // Multi-value parameters never reach here as a joined string; treat
        // a stray one as a single-item collection.
        CollectionFormat::Multi => {
            return Value::Array(vec![coerce_from_string(raw, &items_schema)])
        }
    };
    Value::Array(
        raw.split(separator)
            .map(|item| coerce_from_string(item, &items_schema))
            .collect(),
    )
}
