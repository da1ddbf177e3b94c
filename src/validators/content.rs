//! Content-type and Accept header validators.
//!
//! The consumes validator checks the mock request's `Content-Type` header
//! against what the operation accepts; the produces validator mirrors it for
//! the `Accept` header and for the mocked response's actual `Content-Type`.
//! All three share the negotiation chain in [`crate::negotiation`].

use serde_json::json;

use crate::mock::ParsedMockInteraction;
use crate::negotiation::{find_matching_type, negotiate_accept};
use crate::result::{MockDetails, ResultCode, SpecDetails, ValidationResult};
use crate::spec::{ParsedSpecOperation, ParsedSpecResponse};

/// Check the request `Content-Type` header against the operation's
/// `consumes` table.
pub(crate) fn validate_request_content_type(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Vec<ValidationResult> {
    let content_type = interaction.request_headers.get("content-type");

    if operation.consumes.value.is_empty() {
        // A content type on the mock is suspicious when the spec is silent,
        // but not provably wrong.
        return match content_type {
            Some(header) => vec![ValidationResult::new(
                ResultCode::RequestContentTypeUnknown,
                "Request content-type header is defined but the spec does not specify any mime-types to consume",
                MockDetails::of(
                    interaction,
                    header.location.as_str(),
                    Some(header.value.clone().into()),
                ),
                SpecDetails::of(operation, operation.location.as_str(), None),
            )],
            None => Vec::new(),
        };
    }

    match content_type {
        None => {
            if interaction.request_body.is_some() {
                vec![ValidationResult::new(
                    ResultCode::RequestContentTypeMissing,
                    "Request content type header is not defined but spec specifies mime-types to consume",
                    MockDetails::of(interaction, interaction.location.as_str(), None),
                    SpecDetails::of(
                        operation,
                        operation.consumes.location.as_str(),
                        Some(json!(operation.consumes.value)),
                    ),
                )]
            } else {
                Vec::new()
            }
        }
        Some(header) => {
            if find_matching_type(&header.value, &operation.consumes.value).is_some() {
                Vec::new()
            } else {
                vec![ValidationResult::new(
                    ResultCode::RequestContentTypeIncompatible,
                    "Request Content-Type header is incompatible with the mime-types the spec accepts to consume",
                    MockDetails::of(
                        interaction,
                        header.location.as_str(),
                        Some(header.value.clone().into()),
                    ),
                    SpecDetails::of(
                        operation,
                        operation.consumes.location.as_str(),
                        Some(json!(operation.consumes.value)),
                    ),
                )]
            }
        }
    }
}

/// Check the request `Accept` header against the operation's `produces`
/// table.
pub(crate) fn validate_request_accept(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Vec<ValidationResult> {
    let Some(header) = interaction.request_headers.get("accept") else {
        return Vec::new();
    };

    if operation.produces.value.is_empty() {
        return vec![ValidationResult::new(
            ResultCode::RequestAcceptUnknown,
            "Request Accept header is defined but the spec does not specify any mime-types to produce",
            MockDetails::of(
                interaction,
                header.location.as_str(),
                Some(header.value.clone().into()),
            ),
            SpecDetails::of(operation, operation.location.as_str(), None),
        )];
    }

    if negotiate_accept(&header.value, &operation.produces.value).is_some() {
        Vec::new()
    } else {
        vec![ValidationResult::new(
            ResultCode::RequestAcceptIncompatible,
            "Request Accept header is incompatible with the mime-types the spec defines to produce",
            MockDetails::of(
                interaction,
                header.location.as_str(),
                Some(header.value.clone().into()),
            ),
            SpecDetails::of(
                operation,
                operation.produces.location.as_str(),
                Some(json!(operation.produces.value)),
            ),
        )]
    }
}

/// Check the mocked response's actual `Content-Type` header against what the
/// matched response can produce.
pub(crate) fn validate_response_content_type(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
    response: &ParsedSpecResponse,
) -> Vec<ValidationResult> {
    let Some(header) = interaction.response_headers.get("content-type") else {
        return Vec::new();
    };

    if response.produces.value.is_empty() {
        // HEAD responses have no body, so a missing produces section there
        // is expected rather than suspicious.
        if operation.method == "head" {
            return Vec::new();
        }
        return vec![ValidationResult::new(
            ResultCode::ResponseContentTypeUnknown,
            "Response Content-Type header is defined but the spec does not specify any mime-types to produce",
            MockDetails::of(
                interaction,
                header.location.as_str(),
                Some(header.value.clone().into()),
            ),
            SpecDetails::of(operation, response.location.as_str(), None),
        )];
    }

    if find_matching_type(&header.value, &response.produces.value).is_some() {
        Vec::new()
    } else {
        vec![ValidationResult::new(
            ResultCode::ResponseContentTypeIncompatible,
            "Response Content-Type header is incompatible with the mime-types the spec defines to produce",
            MockDetails::of(
                interaction,
                header.location.as_str(),
                Some(header.value.clone().into()),
            ),
            SpecDetails::of(
                operation,
                response.produces.location.as_str(),
                Some(json!(response.produces.value)),
            ),
        )]
    }
}
