//! Header and query parameter validators.
//!
//! Iteration is driven by the union of spec-declared and mock-provided
//! names (case-insensitively for headers). Declared parameters validate
//! through the engine by wrapping the coerced scalar in
//! `{"value": ...}` against `{"type": "object", "properties": {"value":
//! <schema>}}`, so `required`, `type`, `format` and `enum` constraints all
//! reuse the same machinery. Mock-only names warn unless they are standard
//! HTTP headers or the operation's own security credentials.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::coerce::{coerce_collection, coerce_from_string};
use crate::engine;
use crate::mock::ParsedMockInteraction;
use crate::result::{MockDetails, ResultCode, SpecDetails, ValidationResult};
use crate::spec::{
    CollectionFormat, CredentialLocation, ParsedSpecOperation, ParsedSpecResponse, SpecParameter,
};
use crate::types::Located;

/// Request headers that are part of ordinary HTTP plumbing; their presence
/// in a mock does not need a spec declaration.
const STANDARD_REQUEST_HEADERS: &[&str] = &[
    "accept",
    "accept-charset",
    "accept-datetime",
    "accept-encoding",
    "accept-language",
    "authorization",
    "cache-control",
    "connection",
    "content-length",
    "content-md5",
    "content-type",
    "cookie",
    "date",
    "dnt",
    "expect",
    "forwarded",
    "from",
    "host",
    "if-match",
    "if-modified-since",
    "if-none-match",
    "if-range",
    "if-unmodified-since",
    "max-forwards",
    "origin",
    "pragma",
    "proxy-authorization",
    "range",
    "referer",
    "te",
    "upgrade",
    "user-agent",
    "via",
    "warning",
    "x-correlation-id",
    "x-csrf-token",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
    "x-http-method-override",
    "x-request-id",
    "x-requested-with",
];

/// Response headers a provider commonly sets without declaring.
const STANDARD_RESPONSE_HEADERS: &[&str] = &[
    "access-control-allow-credentials",
    "access-control-allow-origin",
    "access-control-expose-headers",
    "age",
    "allow",
    "cache-control",
    "connection",
    "content-disposition",
    "content-encoding",
    "content-language",
    "content-length",
    "content-location",
    "content-md5",
    "content-range",
    "date",
    "etag",
    "expires",
    "last-modified",
    "location",
    "pragma",
    "proxy-authenticate",
    "retry-after",
    "server",
    "set-cookie",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "vary",
    "via",
    "warning",
    "www-authenticate",
];

/// Headers owned by the content negotiation and security validators.
const NEGOTIATED_REQUEST_HEADERS: &[&str] = &["accept", "content-type"];

pub(crate) fn validate_request_headers(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Vec<ValidationResult> {
    let mut results = Vec::new();
    let names: BTreeSet<&String> = operation
        .request_headers
        .keys()
        .chain(interaction.request_headers.keys())
        .collect();

    for name in names {
        if NEGOTIATED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let mock_header = interaction.request_headers.get(name);
        match operation.request_headers.get(name) {
            Some(parameter) => {
                results.extend(validate_parameter(
                    interaction,
                    operation,
                    parameter,
                    mock_header.map(|header| scalar_instance(parameter, &header.value)),
                    mock_header.map(|header| Located {
                        location: header.location.clone(),
                        value: Value::String(header.value.clone()),
                    }),
                    format!("{}.request.headers.{name}", interaction.location),
                    ResultCode::RequestHeaderIncompatible,
                ));
            }
            None => {
                let Some(header) = mock_header else { continue };
                if STANDARD_REQUEST_HEADERS.contains(&name.as_str())
                    || is_security_credential(operation, name, CredentialLocation::Header)
                {
                    continue;
                }
                results.push(ValidationResult::new(
                    ResultCode::RequestHeaderUnknown,
                    format!("Request header is not defined in the spec file: {name}"),
                    MockDetails::of(
                        interaction,
                        header.location.as_str(),
                        Some(header.value.clone().into()),
                    ),
                    SpecDetails::of(operation, operation.location.as_str(), None),
                ));
            }
        }
    }
    results
}

pub(crate) fn validate_request_query(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Vec<ValidationResult> {
    let mut results = Vec::new();
    let names: BTreeSet<&String> = operation
        .request_queries
        .keys()
        .chain(interaction.request_query.keys())
        .collect();

    for name in names {
        let mock_values = interaction.request_query.get(name);
        match operation.request_queries.get(name) {
            Some(parameter) => {
                results.extend(validate_parameter(
                    interaction,
                    operation,
                    parameter,
                    mock_values.map(|values| query_instance(parameter, &values.value)),
                    mock_values.map(|values| Located {
                        location: values.location.clone(),
                        value: json!(values.value),
                    }),
                    format!("{}.request.query.{name}", interaction.location),
                    ResultCode::RequestQueryIncompatible,
                ));
            }
            None => {
                let Some(values) = mock_values else { continue };
                if is_security_credential(operation, name, CredentialLocation::Query) {
                    continue;
                }
                results.push(ValidationResult::new(
                    ResultCode::RequestQueryUnknown,
                    format!("Query parameter is not defined in the spec file: {name}"),
                    MockDetails::of(
                        interaction,
                        values.location.as_str(),
                        Some(json!(values.value)),
                    ),
                    SpecDetails::of(operation, operation.location.as_str(), None),
                ));
            }
        }
    }
    results
}

pub(crate) fn validate_response_headers(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
    response: &ParsedSpecResponse,
) -> Vec<ValidationResult> {
    let mut results = Vec::new();
    let names: BTreeSet<&String> = response
        .headers
        .keys()
        .chain(interaction.response_headers.keys())
        .collect();

    for name in names {
        // The produces validator owns the response content type.
        if name.as_str() == "content-type" {
            continue;
        }
        let mock_header = interaction.response_headers.get(name);
        match response.headers.get(name) {
            Some(parameter) => {
                results.extend(validate_parameter(
                    interaction,
                    operation,
                    parameter,
                    mock_header.map(|header| scalar_instance(parameter, &header.value)),
                    mock_header.map(|header| Located {
                        location: header.location.clone(),
                        value: Value::String(header.value.clone()),
                    }),
                    format!("{}.response.headers.{name}", interaction.location),
                    ResultCode::ResponseHeaderIncompatible,
                ));
            }
            None => {
                let Some(header) = mock_header else { continue };
                let (code, message) = if STANDARD_RESPONSE_HEADERS.contains(&name.as_str()) {
                    (
                        ResultCode::ResponseHeaderUndefined,
                        format!("Standard http response header is not defined in the spec file: {name}"),
                    )
                } else {
                    (
                        ResultCode::ResponseHeaderUnknown,
                        format!("Response header is not defined in the spec file: {name}"),
                    )
                };
                results.push(ValidationResult::new(
                    code,
                    message,
                    MockDetails::of(
                        interaction,
                        header.location.as_str(),
                        Some(header.value.clone().into()),
                    ),
                    SpecDetails::of(operation, response.location.as_str(), None),
                ));
            }
        }
    }
    results
}

/// Validate one declared parameter against an optional mock value through
/// the `{"value": ...}` wrapping.
#[allow(clippy::too_many_arguments)]
fn validate_parameter(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
    parameter: &SpecParameter,
    instance: Option<Value>,
    mock_value: Option<Located<Value>>,
    absent_location: String,
    code: ResultCode,
) -> Vec<ValidationResult> {
    let mut schema = json!({
        "type": "object",
        "properties": {"value": parameter.schema.clone()}
    });
    if parameter.required {
        schema["required"] = json!(["value"]);
    }
    let wrapped = match instance {
        Some(value) => json!({"value": value}),
        None => json!({}),
    };

    engine::validate_json(&schema, &wrapped)
        .into_iter()
        .map(|violation| {
            let (location, value) = match &mock_value {
                Some(located) => (located.location.clone(), Some(located.value.clone())),
                None => (absent_location.clone(), None),
            };
            ValidationResult::new(
                code,
                format!(
                    "Value is incompatible with the parameter defined in the spec file: {}",
                    violation.message
                ),
                MockDetails::of(interaction, location, value),
                SpecDetails::of(
                    operation,
                    parameter.location.as_str(),
                    Some(parameter.schema.clone()),
                ),
            )
        })
        .collect()
}

fn is_security_credential(
    operation: &ParsedSpecOperation,
    name: &str,
    location: CredentialLocation,
) -> bool {
    operation
        .security_requirements
        .iter()
        .flat_map(|group| group.requirements.iter())
        .any(|requirement| {
            requirement.credential_location == location && requirement.credential_key == name
        })
}

/// Coerce a raw header string against the parameter schema, splitting
/// array-valued parameters on their collection format separator first.
fn scalar_instance(parameter: &SpecParameter, raw: &str) -> Value {
    if parameter.schema.get("type").and_then(Value::as_str) == Some("array") {
        coerce_collection(
            raw,
            parameter
                .collection_format
                .unwrap_or(CollectionFormat::Csv),
            &parameter.schema,
        )
    } else {
        coerce_from_string(raw, &parameter.schema)
    }
}

/// Coerce parsed query values. `multi` parameters take the repeated values
/// as-is; other formats split a single raw value on their separator.
fn query_instance(parameter: &SpecParameter, values: &[String]) -> Value {
    let first = values.first().map(String::as_str).unwrap_or_default();
    if parameter.schema.get("type").and_then(Value::as_str) == Some("array") {
        let items_schema = parameter
            .schema
            .get("items")
            .cloned()
            .unwrap_or(Value::Null);
        match parameter.collection_format.unwrap_or(CollectionFormat::Multi) {
            CollectionFormat::Multi => Value::Array(
                values
                    .iter()
                    .map(|value| coerce_from_string(value, &items_schema))
                    .collect(),
            ),
            format if values.len() == 1 => coerce_collection(first, format, &parameter.schema),
            // Repeated keys for a joined format: treat each occurrence as an
            // item rather than inventing a joined string.
            _ => Value::Array(
                values
                    .iter()
                    .map(|value| coerce_from_string(value, &items_schema))
                    .collect(),
            ),
        }
    } else {
        coerce_from_string(first, &parameter.schema)
    }
}
