//! Swagger 2.0 front-end of the spec normalizer.
//!
//! Swagger2 declares body schemas on a `body` parameter and types non-body
//! parameters inline on the parameter object, so parameter definitions are
//! rebuilt into plain value schemas here. `consumes`/`produces` resolve from
//! the operation, falling back to the document defaults.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::types::{Located, ValidateOptions};

use super::transform::{prepare_schema, transform_response_schema};
use super::{
    build_path_segments, merge_parameters, resolve_security, BodySchemas, CollectionFormat,
    CredentialLocation, ParsedSpec, ParsedSpecOperation, ParsedSpecResponse, SecurityGroup,
    SecurityRequirement, SpecBody, SpecParameter, HTTP_METHODS,
};

/// Schema-bearing keys copied from a non-body parameter or response header
/// into its value schema.
const INLINE_SCHEMA_KEYS: &[&str] = &[
    "type",
    "format",
    "items",
    "enum",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "maxItems",
    "minItems",
    "uniqueItems",
    "multipleOf",
];

pub(super) fn parse(document: &Value, source: &str, options: &ValidateOptions) -> ParsedSpec {
    let paths = document
        .get("paths")
        .cloned()
        .unwrap_or(Value::Object(Map::new()));
    let empty = Map::new();

    let mut operations = Vec::new();
    for (path_name, path_item) in paths.as_object().unwrap_or(&empty) {
        let path_location = format!("[root].paths.{path_name}");
        let base_parameters = value_array(path_item.get("parameters"));

        for &method in HTTP_METHODS {
            let Some(operation) = path_item.get(method) else {
                continue;
            };
            operations.push(parse_operation(
                document,
                source,
                options,
                path_name,
                &path_location,
                method,
                operation,
                &base_parameters,
            ));
        }
    }

    ParsedSpec {
        operations,
        paths: Located::new("[root].paths", paths),
        source: source.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn parse_operation(
    document: &Value,
    source: &str,
    options: &ValidateOptions,
    path_name: &str,
    path_location: &str,
    method: &str,
    operation: &Value,
    base_parameters: &[Value],
) -> ParsedSpecOperation {
    let location = format!("{path_location}.{method}");
    let parameters = merge_parameters(base_parameters, &value_array(operation.get("parameters")));

    let mut path_parameters = BTreeMap::new();
    let mut request_headers = BTreeMap::new();
    let mut request_queries = BTreeMap::new();
    let mut request_body = None;

    for (index, parameter) in parameters.iter().enumerate() {
        let parameter_location = format!("{location}.parameters[{index}]");
        let Some(name) = parameter.get("name").and_then(Value::as_str) else {
            continue;
        };
        match parameter.get("in").and_then(Value::as_str) {
            Some("path") => {
                path_parameters.insert(
                    name.to_string(),
                    parse_parameter(parameter, name, &parameter_location),
                );
            }
            Some("header") => {
                request_headers.insert(
                    name.to_lowercase(),
                    parse_parameter(parameter, name, &parameter_location),
                );
            }
            Some("query") => {
                request_queries.insert(
                    name.to_string(),
                    parse_parameter(parameter, name, &parameter_location),
                );
            }
            Some("body") => {
                let mut schema = parameter.get("schema").cloned().unwrap_or(Value::Null);
                prepare_schema(&mut schema);
                request_body = Some(SpecBody {
                    location: format!("{parameter_location}.schema"),
                    required: parameter
                        .get("required")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                    schemas: BodySchemas::Single(Located::new(
                        format!("{parameter_location}.schema"),
                        schema,
                    )),
                });
            }
            // formData and unknown locations carry no checkable obligation.
            _ => {}
        }
    }

    let consumes = resolve_media_types(operation, document, &location, "consumes");
    let produces = resolve_media_types(operation, document, &location, "produces");
    let responses = parse_responses(operation, &location, &produces, options);

    ParsedSpecOperation {
        method: method.to_string(),
        path_name: path_name.to_string(),
        path_segments: build_path_segments(path_name, path_location, &path_parameters),
        location: location.clone(),
        spec_file: source.to_string(),
        consumes,
        produces,
        request_body,
        request_headers,
        request_queries,
        responses,
        security_requirements: parse_security(operation, &location, document),
    }
}

/// Operation-level media types win when the key is present, otherwise the
/// document default applies.
fn resolve_media_types(
    operation: &Value,
    document: &Value,
    operation_location: &str,
    key: &str,
) -> Located<Vec<String>> {
    if operation.get(key).is_some() {
        Located::new(
            format!("{operation_location}.{key}"),
            string_array(operation.get(key)),
        )
    } else if document.get(key).is_some() {
        Located::new(format!("[root].{key}"), string_array(document.get(key)))
    } else {
        Located::new(format!("{operation_location}.{key}"), Vec::new())
    }
}

fn parse_responses(
    operation: &Value,
    operation_location: &str,
    produces: &Located<Vec<String>>,
    options: &ValidateOptions,
) -> BTreeMap<String, ParsedSpecResponse> {
    let empty = Map::new();
    let mut responses = BTreeMap::new();
    for (status, response) in operation
        .get("responses")
        .and_then(Value::as_object)
        .unwrap_or(&empty)
    {
        if status.starts_with("x-") {
            continue;
        }
        let response_location = format!("{operation_location}.responses.{status}");

        let mut headers = BTreeMap::new();
        if let Some(declared) = response.get("headers").and_then(Value::as_object) {
            for (name, header) in declared {
                headers.insert(
                    name.to_lowercase(),
                    parse_parameter(header, name, &format!("{response_location}.headers.{name}")),
                );
            }
        }

        let body = response.get("schema").map(|schema| {
            let mut schema = schema.clone();
            transform_response_schema(&mut schema, options);
            prepare_schema(&mut schema);
            SpecBody {
                location: format!("{response_location}.schema"),
                required: false,
                schemas: BodySchemas::Single(Located::new(
                    format!("{response_location}.schema"),
                    schema,
                )),
            }
        });

        responses.insert(
            status.clone(),
            ParsedSpecResponse {
                status: status.clone(),
                location: response_location,
                headers,
                produces: produces.clone(),
                body,
            },
        );
    }
    responses
}

fn parse_security(
    operation: &Value,
    operation_location: &str,
    document: &Value,
) -> Vec<SecurityGroup> {
    let (groups, base_location) = resolve_security(operation, operation_location, document);
    let empty = Map::new();
    let definitions = document
        .get("securityDefinitions")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let group_location = format!("{base_location}[{index}]");
            let requirements = group
                .as_object()
                .map(|schemes| {
                    schemes
                        .keys()
                        .filter_map(|scheme_name| {
                            parse_requirement(
                                definitions.get(scheme_name),
                                &format!("{group_location}.{scheme_name}"),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
            SecurityGroup {
                location: group_location,
                requirements,
            }
        })
        .collect()
}

/// Unsupported scheme types (oauth2, or anything unrecognized) carry no
/// checkable obligation and are dropped.
fn parse_requirement(definition: Option<&Value>, location: &str) -> Option<SecurityRequirement> {
    let definition = definition?;
    match definition.get("type").and_then(Value::as_str) {
        Some("basic") => Some(SecurityRequirement {
            credential_key: "authorization".to_string(),
            credential_location: CredentialLocation::Header,
            location: location.to_string(),
        }),
        Some("apiKey") => {
            let name = definition.get("name").and_then(Value::as_str)?;
            match definition.get("in").and_then(Value::as_str) {
                Some("header") => Some(SecurityRequirement {
                    credential_key: name.to_lowercase(),
                    credential_location: CredentialLocation::Header,
                    location: location.to_string(),
                }),
                Some("query") => Some(SecurityRequirement {
                    credential_key: name.to_string(),
                    credential_location: CredentialLocation::Query,
                    location: location.to_string(),
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Build a value schema for a non-body parameter or response header by
/// copying its inline schema keys.
fn parse_parameter(parameter: &Value, name: &str, location: &str) -> SpecParameter {
    let mut schema_map = Map::new();
    if let Some(parameter_map) = parameter.as_object() {
        for &key in INLINE_SCHEMA_KEYS {
            if let Some(value) = parameter_map.get(key) {
                schema_map.insert(key.to_string(), value.clone());
            }
        }
    }
    let mut schema = Value::Object(schema_map);
    prepare_schema(&mut schema);

    let is_array = schema.get("type").and_then(Value::as_str) == Some("array");
    let collection_format = parameter
        .get("collectionFormat")
        .and_then(Value::as_str)
        .and_then(CollectionFormat::parse)
        .or(if is_array {
            Some(CollectionFormat::Csv)
        } else {
            None
        });

    SpecParameter {
        name: name.to_string(),
        location: location.to_string(),
        required: parameter
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        schema,
        collection_format,
    }
}

fn value_array(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
