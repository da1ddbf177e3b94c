//! OpenAPI 3.x front-end of the spec normalizer.
//!
//! OpenAPI3 keys body schemas by media type under `requestBody.content` and
//! per-response `content`, which maps directly onto the negotiation tables:
//! an operation consumes its request body's media types and produces the
//! union of its responses' media types. Array parameters use
//! `style`/`explode` instead of Swagger2's `collectionFormat`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::types::{Located, ValidateOptions};

use super::transform::{prepare_schema, transform_response_schema};
use super::{
    build_path_segments, merge_parameters, resolve_security, BodySchemas, CollectionFormat,
    CredentialLocation, ParsedSpec, ParsedSpecOperation, ParsedSpecResponse, SecurityGroup,
    SecurityRequirement, SpecBody, SpecParameter, HTTP_METHODS,
};

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
            // Cookie parameters carry no checkable obligation for a pact.
            _ => {}
        }
    }

    let request_body = parse_request_body(operation.get("requestBody"), &location);
    let consumes = Located::new(
        format!("{location}.requestBody.content"),
        match &request_body {
            Some(SpecBody {
                schemas: BodySchemas::ByContentType(entries),
                ..
            }) => entries.iter().map(|(media, _)| media.clone()).collect(),
            _ => Vec::new(),
        },
    );

    let responses = parse_responses(operation, &location, options);
    let mut produced = Vec::new();
    for response in responses.values() {
        for media in &response.produces.value {
            if !produced.contains(media) {
                produced.push(media.clone());
            }
        }
    }
    let produces = Located::new(format!("{location}.responses"), produced);

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

fn parse_request_body(request_body: Option<&Value>, operation_location: &str) -> Option<SpecBody> {
    let request_body = request_body?;
    let content = request_body.get("content").and_then(Value::as_object)?;
    let body_location = format!("{operation_location}.requestBody");

    let entries = content_schemas(content, &body_location, None);
    Some(SpecBody {
        location: format!("{body_location}.content"),
        required: request_body
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        schemas: BodySchemas::ByContentType(entries),
    })
}

fn parse_responses(
    operation: &Value,
    operation_location: &str,
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

        let content = response.get("content").and_then(Value::as_object);
        let produced: Vec<String> = content
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        let body = content.filter(|entries| !entries.is_empty()).map(|entries| {
            SpecBody {
                location: format!("{response_location}.content"),
                required: false,
                schemas: BodySchemas::ByContentType(content_schemas(
                    entries,
                    &response_location,
                    Some(options),
                )),
            }
        });

        responses.insert(
            status.clone(),
            ParsedSpecResponse {
                status: status.clone(),
                location: response_location.clone(),
                headers,
                produces: Located::new(format!("{response_location}.content"), produced),
                body,
            },
        );
    }
    responses
}

/// Extract `(media type, schema)` pairs from a `content` map, preserving
/// declaration order. Response schemas additionally get the outbound
/// transformation.
fn content_schemas(
    content: &Map<String, Value>,
    parent_location: &str,
    response_options: Option<&ValidateOptions>,
) -> Vec<(String, Located<Value>)> {
    content
        .iter()
        .map(|(media_type, media_object)| {
            let mut schema = media_object.get("schema").cloned().unwrap_or(Value::Bool(true));
            if let Some(options) = response_options {
                transform_response_schema(&mut schema, options);
            }
            prepare_schema(&mut schema);
            (
                media_type.clone(),
                Located::new(
                    format!("{parent_location}.content.{media_type}.schema"),
                    schema,
                ),
            )
        })
        .collect()
}

fn parse_security(
    operation: &Value,
    operation_location: &str,
    document: &Value,
) -> Vec<SecurityGroup> {
    let (groups, base_location) = resolve_security(operation, operation_location, document);
    let empty = Map::new();
    let schemes = document
        .get("components")
        .and_then(|components| components.get("securitySchemes"))
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let group_location = format!("{base_location}[{index}]");
            let requirements = group
                .as_object()
                .map(|entries| {
                    entries
                        .keys()
                        .filter_map(|scheme_name| {
                            parse_requirement(
                                schemes.get(scheme_name),
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

/// `http` schemes use the Authorization header; `apiKey` schemes name their
/// own carrier. oauth2, openIdConnect and cookie-located keys have no
/// checkable obligation and are dropped.
fn parse_requirement(scheme: Option<&Value>, location: &str) -> Option<SecurityRequirement> {
    let scheme = scheme?;
    match scheme.get("type").and_then(Value::as_str) {
        Some("http") => Some(SecurityRequirement {
            credential_key: "authorization".to_string(),
            credential_location: CredentialLocation::Header,
            location: location.to_string(),
        }),
        Some("apiKey") => {
            let name = scheme.get("name").and_then(Value::as_str)?;
            match scheme.get("in").and_then(Value::as_str) {
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

/// Map OpenAPI3 `style`/`explode` onto the collection format conventions the
/// validators split on.
fn collection_format(parameter: &Value) -> Option<CollectionFormat> {
    let location = parameter.get("in").and_then(Value::as_str);
    match location {
        Some("query") => {
            let style = parameter
                .get("style")
                .and_then(Value::as_str)
                .unwrap_or("form");
            match style {
                "form" => {
                    let explode = parameter
                        .get("explode")
                        .and_then(Value::as_bool)
                        .unwrap_or(true);
                    if explode {
                        Some(CollectionFormat::Multi)
                    } else {
                        Some(CollectionFormat::Csv)
                    }
                }
                "spaceDelimited" => Some(CollectionFormat::Ssv),
                "pipeDelimited" => Some(CollectionFormat::Pipes),
                _ => None,
            }
        }
        // Headers and path segments serialize with the simple style.
        _ => Some(CollectionFormat::Csv),
    }
}

fn parse_parameter(parameter: &Value, name: &str, location: &str) -> SpecParameter {
    let mut schema = parameter
        .get("schema")
        .cloned()
        .unwrap_or(Value::Object(Map::new()));
    prepare_schema(&mut schema);

    let is_array = schema.get("type").and_then(Value::as_str) == Some("array");
    SpecParameter {
        name: name.to_string(),
        location: location.to_string(),
        required: parameter
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        schema,
        collection_format: if is_array {
            collection_format(parameter)
        } else {
            None
        },
    }
}

fn value_array(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
