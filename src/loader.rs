//! Document loading from files, strings and HTTP URLs.
//!
//! Specs and mocks both arrive as JSON or YAML text; parsing tries JSON
//! first and falls back to YAML, so `.json`, `.yaml` and extensionless
//! sources all work without declaring a format.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a spec or mock document from a file path.
///
/// # Errors
///
/// Returns `ParseError::FileNotFound` if the file doesn't exist,
/// `ParseError::ReadError` if it can't be read, or
/// `ParseError::UnparseableDocument` if it is neither valid JSON nor YAML.
pub fn load_document(path: &Path) -> Result<Value, ParseError> {
    if !path.exists() {
        return Err(ParseError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ParseError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content, &path.display().to_string())
}

/// Parse a document from in-memory text, trying JSON then YAML.
pub fn load_document_str(content: &str, source: &str) -> Result<Value, ParseError> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_error) => {
            debug!(source, %json_error, "not valid json, trying yaml");
            serde_yaml::from_str::<serde_yaml::Value>(content)
                .map(yaml_to_json)
                .map_err(|yaml_error| ParseError::UnparseableDocument {
                    source_name: source.to_string(),
                    message: yaml_error.to_string(),
                })
        }
    }
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ParseError::NetworkError` if the request fails, or
/// `ParseError::UnparseableDocument` if the response body is neither valid
/// JSON nor YAML.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, ParseError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| ParseError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| ParseError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let body = response.text().map_err(|source| ParseError::NetworkError {
        url: url.to_string(),
        source,
    })?;
    load_document_str(&body, url)
}

/// Load from a URL when the source looks like one, otherwise from a file.
pub fn load_document_auto(source: &str) -> Result<Value, ParseError> {
    #[cfg(feature = "remote")]
    if is_url(source) {
        return load_document_url(source);
    }
    load_document(Path::new(source))
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Convert a YAML tree into a JSON tree, stringifying non-string mapping
/// keys (YAML status codes like `200:` parse as integers).
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = serde_json::Map::new();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    _ => continue,
                };
                map.insert(key, yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_json_text() {
        let value = load_document_str(r#"{"swagger": "2.0"}"#, "spec.json").unwrap();
        assert_eq!(value, json!({"swagger": "2.0"}));
    }

    #[test]
    fn falls_back_to_yaml() {
        let content = "swagger: \"2.0\"\npaths:\n  /users:\n    get:\n      responses:\n        200:\n          description: ok\n";
        let value = load_document_str(content, "spec.yaml").unwrap();
        assert_eq!(value["swagger"], "2.0");
        // Integer status keys become strings.
        assert_eq!(
            value["paths"]["/users"]["get"]["responses"]["200"]["description"],
            "ok"
        );
    }

    #[test]
    fn unparseable_text_is_a_parse_error() {
        let err = load_document_str("{not: valid: json: or: yaml", "junk").unwrap_err();
        assert_eq!(err.kind(), "PARSE_ERROR");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_document(Path::new("does-not-exist.json")).unwrap_err();
        assert_eq!(err.kind(), "READ_ERROR");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/spec.json"));
        assert!(is_url("http://example.com/spec.json"));
        assert!(!is_url("specs/spec.json"));
    }
}
