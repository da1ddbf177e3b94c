//! Request and response body validators.
//!
//! The schema to validate against is selected by negotiating the mock's
//! content type against the spec's declared media types; a declared-but-
//! unmatched content type is its own error code, distinct from a schema
//! mismatch. Engine violations map one-to-one onto results, each located
//! through the mock's body-path resolver on one side and the spec's schema
//! path on the other.

use serde_json::Value;

use crate::engine;
use crate::mock::ParsedMockInteraction;
use crate::result::{MockDetails, ResultCode, SpecDetails, ValidationResult};
use crate::spec::{ParsedSpecOperation, ParsedSpecResponse, SchemaSelection};
use crate::types::Located;

use super::spec_schema_location;

pub(crate) fn validate_request_body(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Vec<ValidationResult> {
    let Some(spec_body) = &operation.request_body else {
        // The spec declares no request body; a mock body carries no
        // checkable obligation.
        return Vec::new();
    };

    if interaction.request_body.is_none() && !spec_body.required {
        return Vec::new();
    }

    let content_type = interaction
        .request_headers
        .get("content-type")
        .map(|header| header.value.as_str());

    match spec_body.select_schema(content_type) {
        SchemaSelection::NoMatch => vec![ValidationResult::new(
            ResultCode::RequestBodyUnknown,
            format!(
                "No matching schema found for request content type '{}'",
                content_type.unwrap_or_default()
            ),
            MockDetails::of(
                interaction,
                format!("{}.request.body", interaction.location),
                interaction.request_body.as_ref().map(|body| body.value.clone()),
            ),
            SpecDetails::of(operation, spec_body.location.as_str(), None),
        )],
        SchemaSelection::Found(schema) => validate_against_schema(
            interaction,
            operation,
            schema,
            interaction.request_body.as_ref().map(|body| &body.value),
            BodySide::Request,
        ),
    }
}

pub(crate) fn validate_response_body(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
    response: &ParsedSpecResponse,
) -> Vec<ValidationResult> {
    let mock_body = interaction.response_body.as_ref();
    let Some(spec_body) = &response.body else {
        // A mocked body the spec never describes cannot be checked, which
        // is itself a finding.
        return match mock_body {
            Some(_) => vec![ValidationResult::new(
                ResultCode::ResponseBodyUnknown,
                "No schema found for response body",
                MockDetails::of(
                    interaction,
                    format!("{}.response.body", interaction.location),
                    mock_body.map(|body| body.value.clone()),
                ),
                SpecDetails::of(operation, response.location.as_str(), None),
            )],
            None => Vec::new(),
        };
    };

    if mock_body.is_none() {
        return Vec::new();
    }

    let content_type = interaction
        .response_headers
        .get("content-type")
        .map(|header| header.value.as_str());

    match spec_body.select_schema(content_type) {
        SchemaSelection::NoMatch => vec![ValidationResult::new(
            ResultCode::ResponseBodyUnknown,
            format!(
                "No matching schema found for response content type '{}'",
                content_type.unwrap_or_default()
            ),
            MockDetails::of(
                interaction,
                format!("{}.response.body", interaction.location),
                mock_body.map(|body| body.value.clone()),
            ),
            SpecDetails::of(operation, spec_body.location.as_str(), None),
        )],
        SchemaSelection::Found(schema) => validate_against_schema(
            interaction,
            operation,
            schema,
            mock_body.map(|body| &body.value),
            BodySide::Response,
        ),
    }
}

#[derive(Clone, Copy)]
enum BodySide {
    Request,
    Response,
}

fn validate_against_schema(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
    schema: &Located<Value>,
    body: Option<&Value>,
    side: BodySide,
) -> Vec<ValidationResult> {
    // A required body that is missing is validated as null so the mismatch
    // surfaces through the ordinary schema machinery.
    let instance = body.cloned().unwrap_or(Value::Null);

    engine::validate_json(&schema.value, &instance)
        .into_iter()
        .map(|violation| {
            let (code, template, (mock_location, mock_value)) = match side {
                BodySide::Request => (
                    ResultCode::RequestBodyIncompatible,
                    "Request body is incompatible with the request body schema in the spec file",
                    interaction.request_body_path(&violation.instance_path),
                ),
                BodySide::Response => (
                    ResultCode::ResponseBodyIncompatible,
                    "Response body is incompatible with the response body schema in the spec file",
                    interaction.response_body_path(&violation.instance_path),
                ),
            };
            ValidationResult::new(
                code,
                format!("{template}: {}", violation.message),
                MockDetails::of(interaction, mock_location, mock_value),
                SpecDetails::of(
                    operation,
                    spec_schema_location(&schema.location, &violation.schema_path),
                    schema.value.pointer(&violation.schema_path).cloned(),
                ),
            )
        })
        .collect()
}
