//! The validation entry point.
//!
//! Normalizes both documents, walks every mock interaction against the
//! spec, runs the full validator battery and reduces the flat result list
//! to a [`ValidationOutcome`]. Everything here is a pure, synchronous
//! transformation; iteration order is deterministic, so repeated runs over
//! identical inputs produce identical result lists.

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::matcher;
use crate::mock::{self, ParsedMock};
use crate::result::{ValidationOutcome, ValidationResult};
use crate::spec::{self, ParsedSpec};
use crate::types::ValidateOptions;
use crate::validators::{body, content, params, security};

/// Validate a mock document against a spec document.
///
/// Both documents must already be parsed (and, for specs, dereferenced);
/// `spec_source` and `mock_source` identify them in result details. Returns
/// a [`ParseError`] only for structural failures; compatibility findings
/// always come back inside the outcome.
///
/// # Errors
///
/// Returns `ParseError` when either document lacks the structure the
/// normalizers require.
pub fn validate(
    spec_document: &Value,
    spec_source: &str,
    mock_document: &Value,
    mock_source: &str,
    options: &ValidateOptions,
) -> Result<ValidationOutcome, ParseError> {
    let parsed_spec = spec::parse(spec_document, spec_source, options)?;
    let parsed_mock = mock::parse(mock_document, mock_source)?;
    Ok(validate_parsed(&parsed_spec, &parsed_mock))
}

/// Validate already-normalized documents.
pub fn validate_parsed(spec: &ParsedSpec, mock: &ParsedMock) -> ValidationOutcome {
    let mut results: Vec<ValidationResult> = Vec::new();

    for interaction in &mock.interactions {
        debug!(
            description = interaction.description.as_deref().unwrap_or(""),
            location = %interaction.location,
            "validating interaction"
        );
        let operation = match matcher::match_operation(interaction, spec) {
            Ok(operation) => operation,
            Err(result) => {
                // Without an operation there is nothing further to check.
                results.push(result);
                continue;
            }
        };

        results.extend(content::validate_request_content_type(interaction, operation));
        results.extend(content::validate_request_accept(interaction, operation));
        results.extend(security::validate_security(interaction, operation));
        results.extend(body::validate_request_body(interaction, operation));
        results.extend(params::validate_request_headers(interaction, operation));
        results.extend(params::validate_request_query(interaction, operation));

        let (response, status_results) = matcher::match_response(interaction, operation);
        results.extend(status_results);
        if let Some(response) = response {
            results.extend(content::validate_response_content_type(
                interaction,
                operation,
                response,
            ));
            results.extend(body::validate_response_body(interaction, operation, response));
            results.extend(params::validate_response_headers(
                interaction,
                operation,
                response,
            ));
        }
    }

    ValidationOutcome::from_results(results, &mock.source, &spec.source)
}
