//! Schema preparation and response-schema transformation.
//!
//! Two rewrite passes over schema trees, both key-aware so that property
//! names like `required` or `format` inside `properties` maps are never
//! mistaken for keywords:
//!
//! - [`prepare_schema`] runs on every schema the engine will see. It moves
//!   Swagger numeric formats into the `x-numeric-format` keyword the engine
//!   registers, and modernizes draft-04 boolean `exclusiveMinimum` /
//!   `exclusiveMaximum` into their numeric forms.
//! - [`transform_response_schema`] runs on response bodies only. Outbound
//!   schemas are checked from the consumer's point of view: `required`
//!   constraints are stripped (a consumer may ignore fields the provider
//!   declares mandatory) and object schemas are closed against undeclared
//!   properties, with `allOf` treated as a union rather than a strict
//!   intersection. Both behaviours can be toggled via `ValidateOptions`.

use serde_json::{Map, Value};

use crate::engine::NUMERIC_FORMAT_KEYWORD;
use crate::types::ValidateOptions;

const NUMERIC_FORMATS: &[&str] = &["int32", "int64", "float", "double"];

/// Keys whose value is a single subschema.
const SUBSCHEMA_KEYS: &[&str] = &[
    "items",
    "additionalProperties",
    "not",
    "contains",
    "propertyNames",
];

/// Keys whose value is an array of subschemas.
const SUBSCHEMA_LIST_KEYS: &[&str] = &["allOf", "anyOf", "oneOf"];

/// Keys whose value is a map of subschemas.
const SUBSCHEMA_MAP_KEYS: &[&str] = &["properties", "definitions", "$defs", "patternProperties"];

/// Prepare a schema for the engine.
pub(crate) fn prepare_schema(schema: &mut Value) {
    walk_schemas(schema, &mut |map| {
        annotate_numeric_format(map);
        modernize_exclusive_bound(map, "exclusiveMinimum", "minimum");
        modernize_exclusive_bound(map, "exclusiveMaximum", "maximum");
    });
}

/// Transform an outbound (response) schema according to the run options.
pub(crate) fn transform_response_schema(schema: &mut Value, options: &ValidateOptions) {
    if !options.required_properties_in_response {
        walk_schemas(schema, &mut |map| {
            if map.get("required").is_some_and(Value::is_array) {
                map.remove("required");
            }
        });
    }
    if !options.additional_properties_in_response {
        close_schemas(schema, false);
    }
}

/// Apply `f` to every schema object in the tree, recursing only through
/// schema-bearing keys.
fn walk_schemas(schema: &mut Value, f: &mut impl FnMut(&mut Map<String, Value>)) {
    let Value::Object(map) = schema else {
        return;
    };
    f(map);

    for (key, child) in map.iter_mut() {
        if SUBSCHEMA_KEYS.contains(&key.as_str()) {
            walk_schemas(child, f);
        } else if SUBSCHEMA_LIST_KEYS.contains(&key.as_str()) {
            if let Value::Array(branches) = child {
                for branch in branches.iter_mut() {
                    walk_schemas(branch, f);
                }
            }
        } else if SUBSCHEMA_MAP_KEYS.contains(&key.as_str()) {
            if let Value::Object(children) = child {
                for grandchild in children.values_mut() {
                    walk_schemas(grandchild, f);
                }
            }
        }
    }
}

/// Move `format: int32|int64|float|double` into the engine's custom keyword.
fn annotate_numeric_format(map: &mut Map<String, Value>) {
    let is_numeric = map
        .get("format")
        .and_then(Value::as_str)
        .is_some_and(|format| NUMERIC_FORMATS.contains(&format));
    if is_numeric {
        if let Some(format) = map.remove("format") {
            map.insert(NUMERIC_FORMAT_KEYWORD.to_string(), format);
        }
    }
}

/// Rewrite draft-04 `exclusiveMinimum: true` + `minimum: n` into the modern
/// numeric `exclusiveMinimum: n` form (and likewise for maximum).
fn modernize_exclusive_bound(map: &mut Map<String, Value>, exclusive_key: &str, bound_key: &str) {
    match map.get(exclusive_key) {
        Some(Value::Bool(true)) => {
            if let Some(bound) = map.remove(bound_key) {
                map.insert(exclusive_key.to_string(), bound);
            } else {
                map.remove(exclusive_key);
            }
        }
        Some(Value::Bool(false)) => {
            map.remove(exclusive_key);
        }
        _ => {}
    }
}

/// Close object schemas against undeclared properties.
///
/// Plain object schemas get `additionalProperties: false` unless the author
/// set a value themselves. Schemas composed with `allOf` follow OpenAPI's
/// union reading instead: branch-level `additionalProperties` is dropped and
/// the parent gets `unevaluatedProperties: false`, so properties declared in
/// any branch are accepted while undeclared ones are still rejected.
fn close_schemas(value: &mut Value, is_all_of_branch: bool) {
    let Value::Object(map) = value else {
        return;
    };

    if map.get("allOf").is_some_and(Value::is_array) {
        if !map.contains_key("unevaluatedProperties") {
            map.insert("unevaluatedProperties".to_string(), Value::Bool(false));
        }
    } else if is_all_of_branch {
        map.remove("additionalProperties");
    } else {
        let is_object_schema = map
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t == "object")
            || map.contains_key("properties");
        if is_object_schema {
            match map.get("additionalProperties") {
                None | Some(Value::Bool(true)) => {
                    map.insert("additionalProperties".to_string(), Value::Bool(false));
                }
                _ => {}
            }
        }
    }

    for (key, child) in map.iter_mut() {
        if key == "allOf" {
            if let Value::Array(branches) = child {
                for branch in branches.iter_mut() {
                    close_schemas(branch, true);
                }
            }
        } else if SUBSCHEMA_KEYS.contains(&key.as_str()) {
            close_schemas(child, false);
        } else if SUBSCHEMA_LIST_KEYS.contains(&key.as_str()) {
            if let Value::Array(branches) = child {
                for branch in branches.iter_mut() {
                    close_schemas(branch, false);
                }
            }
        } else if SUBSCHEMA_MAP_KEYS.contains(&key.as_str()) {
            if let Value::Object(children) = child {
                for grandchild in children.values_mut() {
                    close_schemas(grandchild, false);
                }
            }
        }
    }
}
