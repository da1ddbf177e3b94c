//! Mock normalization.
//!
//! Consumes a parsed Pact document and produces a [`ParsedMock`]: one
//! [`ParsedMockInteraction`] per recorded exchange, with pre-split path
//! segments, lower-cased header maps, parsed query multimaps, and
//! JSON-Pointer-aware accessors that turn a schema error's instance path
//! back into a located sub-value of the original body.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::types::Located;

/// Provider state marker used when an interaction declares none.
const NO_STATE: &str = "[none]";

/// A normalized Pact mock.
#[derive(Debug, Clone)]
pub struct ParsedMock {
    pub interactions: Vec<ParsedMockInteraction>,
    /// Identifier of the mock source (path or URL).
    pub source: String,
}

/// One recorded request/response exchange.
#[derive(Debug, Clone)]
pub struct ParsedMockInteraction {
    pub description: Option<String>,
    /// Provider state, defaulted to a `[none]` marker.
    pub state: String,
    pub location: String,
    pub mock_file: String,
    /// Lower-cased HTTP method.
    pub request_method: Located<String>,
    pub request_path: Located<String>,
    /// Path split on `/` with empty segments discarded.
    pub request_path_segments: Vec<Located<String>>,
    /// Query parameters; repeated keys accumulate values in order.
    pub request_query: BTreeMap<String, Located<Vec<String>>>,
    /// Request headers keyed by lower-cased name.
    pub request_headers: BTreeMap<String, Located<String>>,
    pub request_body: Option<Located<Value>>,
    pub response_status: Located<u16>,
    /// Response headers keyed by lower-cased name.
    pub response_headers: BTreeMap<String, Located<String>>,
    pub response_body: Option<Located<Value>>,
}

impl ParsedMockInteraction {
    /// Resolve a schema error's instance path against the request body.
    pub fn request_body_path(&self, instance_path: &str) -> (String, Option<Value>) {
        resolve_body_path(
            format!("{}.request.body", self.location),
            self.request_body.as_ref().map(|body| &body.value),
            instance_path,
        )
    }

    /// Resolve a schema error's instance path against the response body.
    pub fn response_body_path(&self, instance_path: &str) -> (String, Option<Value>) {
        resolve_body_path(
            format!("{}.response.body", self.location),
            self.response_body.as_ref().map(|body| &body.value),
            instance_path,
        )
    }
}

/// Normalize a mock document into a [`ParsedMock`].
pub fn parse(document: &Value, source: &str) -> Result<ParsedMock, ParseError> {
    let interactions = document
        .get("interactions")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::InvalidMockDocument {
            source_name: source.to_string(),
            message: "missing required property: interactions".into(),
        })?;
    debug!(source, count = interactions.len(), "parsing mock interactions");

    interactions
        .iter()
        .enumerate()
        .map(|(index, interaction)| parse_interaction(interaction, index, source))
        .collect::<Result<Vec<_>, _>>()
        .map(|interactions| ParsedMock {
            interactions,
            source: source.to_string(),
        })
}

fn parse_interaction(
    interaction: &Value,
    index: usize,
    source: &str,
) -> Result<ParsedMockInteraction, ParseError> {
    let location = format!("[root].interactions[{index}]");
    let request = interaction.get("request").unwrap_or(&Value::Null);
    let response = interaction.get("response").unwrap_or(&Value::Null);

    let response_status = response
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|status| u16::try_from(status).ok())
        .ok_or_else(|| ParseError::InvalidMockDocument {
            source_name: source.to_string(),
            message: format!("interactions[{index}].response.status is missing or not a number"),
        })?;

    let request_path = request
        .get("path")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let path_location = format!("{location}.request.path");
    let request_path_segments = request_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| Located::new(path_location.clone(), segment.to_string()))
        .collect();

    Ok(ParsedMockInteraction {
        description: interaction
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        state: interaction
            .get("providerState")
            .or_else(|| interaction.get("provider_state"))
            .and_then(Value::as_str)
            .unwrap_or(NO_STATE)
            .to_string(),
        request_method: Located::new(
            format!("{location}.request.method"),
            request
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase(),
        ),
        request_path: Located::new(path_location, request_path),
        request_path_segments,
        request_query: parse_query(request.get("query"), &location),
        request_headers: parse_headers(request.get("headers"), &format!("{location}.request")),
        request_body: request
            .get("body")
            .map(|body| Located::new(format!("{location}.request.body"), body.clone())),
        response_status: Located::new(format!("{location}.response.status"), response_status),
        response_headers: parse_headers(response.get("headers"), &format!("{location}.response")),
        response_body: response
            .get("body")
            .map(|body| Located::new(format!("{location}.response.body"), body.clone())),
        mock_file: source.to_string(),
        location,
    })
}

/// Lower-case header names for case-insensitive lookups; locations keep the
/// name as written in the mock.
fn parse_headers(
    headers: Option<&Value>,
    parent_location: &str,
) -> BTreeMap<String, Located<String>> {
    let mut parsed = BTreeMap::new();
    let Some(headers) = headers.and_then(Value::as_object) else {
        return parsed;
    };
    for (name, value) in headers {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        parsed.insert(
            name.to_lowercase(),
            Located::new(format!("{parent_location}.headers.{name}"), value),
        );
    }
    parsed
}

/// Pact queries are either a raw query string or (v3) a map of name to
/// value-or-values. Both normalize to an ordered multimap.
fn parse_query(query: Option<&Value>, interaction_location: &str) -> BTreeMap<String, Located<Vec<String>>> {
    let mut parsed: BTreeMap<String, Located<Vec<String>>> = BTreeMap::new();
    let mut insert = |name: &str, value: String| {
        parsed
            .entry(name.to_string())
            .or_insert_with(|| {
                Located::new(
                    format!("{interaction_location}.request.query.{name}"),
                    Vec::new(),
                )
            })
            .value
            .push(value);
    };

    match query {
        Some(Value::String(raw)) => {
            for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
                match pair.split_once('=') {
                    Some((name, value)) => insert(name, value.to_string()),
                    None => insert(pair, String::new()),
                }
            }
        }
        Some(Value::Object(map)) => {
            for (name, value) in map {
                match value {
                    Value::Array(values) => {
                        for value in values {
                            insert(name, scalar_to_string(value));
                        }
                    }
                    other => insert(name, scalar_to_string(other)),
                }
            }
        }
        _ => {}
    }
    parsed
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Walk a JSON Pointer against a body, building the dotted/indexed location
/// breadcrumb as it goes. The location is built even when the value is
/// missing, so results can point at the place a value should have been.
fn resolve_body_path(
    mut location: String,
    body: Option<&Value>,
    instance_path: &str,
) -> (String, Option<Value>) {
    let mut current = body;
    for segment in instance_path.split('/').filter(|s| !s.is_empty()) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        let at_array = match current {
            Some(Value::Array(_)) => true,
            Some(_) => false,
            // The value is gone; guess from the segment shape.
            None => segment.parse::<usize>().is_ok(),
        };
        if at_array {
            location.push_str(&format!("[{segment}]"));
        } else {
            location.push_str(&format!(".{segment}"));
        }
        current = current.and_then(|value| match value {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        });
    }
    (location, current.cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interaction(request: Value, response: Value) -> Value {
        json!({
            "consumer": {"name": "consumer"},
            "provider": {"name": "provider"},
            "interactions": [{
                "description": "a request",
                "request": request,
                "response": response
            }]
        })
    }

    #[test]
    fn missing_interactions_is_a_parse_error() {
        let err = parse(&json!({"consumer": {}}), "pact.json").unwrap_err();
        assert!(matches!(err, ParseError::InvalidMockDocument { .. }));
    }

    #[test]
    fn missing_status_is_a_parse_error() {
        let document = interaction(json!({"method": "GET", "path": "/"}), json!({}));
        let err = parse(&document, "pact.json").unwrap_err();
        assert!(err
            .to_string()
            .contains("interactions[0].response.status is missing"));
    }

    #[test]
    fn path_splits_into_segments() {
        let document = interaction(
            json!({"method": "GET", "path": "/users//2/"}),
            json!({"status": 200}),
        );
        let mock = parse(&document, "pact.json").unwrap();
        let interaction = &mock.interactions[0];
        assert_eq!(interaction.request_method.value, "get");
        let segments: Vec<&str> = interaction
            .request_path_segments
            .iter()
            .map(|s| s.value.as_str())
            .collect();
        assert_eq!(segments, vec!["users", "2"]);
    }

    #[test]
    fn headers_are_lower_cased_with_original_locations() {
        let document = interaction(
            json!({"method": "GET", "path": "/", "headers": {"X-Version": "1"}}),
            json!({"status": 200, "headers": {"Content-Type": "application/json"}}),
        );
        let mock = parse(&document, "pact.json").unwrap();
        let interaction = &mock.interactions[0];
        let header = interaction.request_headers.get("x-version").unwrap();
        assert_eq!(header.value, "1");
        assert_eq!(
            header.location,
            "[root].interactions[0].request.headers.X-Version"
        );
        assert!(interaction.response_headers.contains_key("content-type"));
    }

    #[test]
    fn query_string_parses_with_repeated_keys() {
        let document = interaction(
            json!({"method": "GET", "path": "/", "query": "id=1&id=2&name=x&flag"}),
            json!({"status": 200}),
        );
        let mock = parse(&document, "pact.json").unwrap();
        let query = &mock.interactions[0].request_query;
        assert_eq!(query.get("id").unwrap().value, vec!["1", "2"]);
        assert_eq!(query.get("name").unwrap().value, vec!["x"]);
        assert_eq!(query.get("flag").unwrap().value, vec![""]);
    }

    #[test]
    fn query_map_form_normalizes_like_query_string() {
        let document = interaction(
            json!({"method": "GET", "path": "/", "query": {"id": ["1", "2"], "name": "x"}}),
            json!({"status": 200}),
        );
        let mock = parse(&document, "pact.json").unwrap();
        let query = &mock.interactions[0].request_query;
        assert_eq!(query.get("id").unwrap().value, vec!["1", "2"]);
        assert_eq!(query.get("name").unwrap().value, vec!["x"]);
    }

    #[test]
    fn state_defaults_to_none_marker() {
        let document = interaction(json!({"method": "GET", "path": "/"}), json!({"status": 200}));
        let mock = parse(&document, "pact.json").unwrap();
        assert_eq!(mock.interactions[0].state, "[none]");
    }

    #[test]
    fn body_path_resolves_nested_values() {
        let document = interaction(
            json!({
                "method": "POST", "path": "/",
                "body": {"child": {"id": "x"}}
            }),
            json!({"status": 200, "body": [{"name": 1}]}),
        );
        let mock = parse(&document, "pact.json").unwrap();
        let interaction = &mock.interactions[0];

        let (location, value) = interaction.request_body_path("/child/id");
        assert_eq!(location, "[root].interactions[0].request.body.child.id");
        assert_eq!(value, Some(json!("x")));

        let (location, value) = interaction.response_body_path("/0/name");
        assert_eq!(location, "[root].interactions[0].response.body[0].name");
        assert_eq!(value, Some(json!(1)));

        // Empty pointer addresses the whole body.
        let (location, value) = interaction.request_body_path("");
        assert_eq!(location, "[root].interactions[0].request.body");
        assert_eq!(value, Some(json!({"child": {"id": "x"}})));
    }
}
