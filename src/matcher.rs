//! Locating the spec operation and response for a mock interaction.
//!
//! Both lookups are pure functions over the normalized spec. Operation
//! matching iterates operations in their normalized order (literal paths
//! before parameterized ones), so the first full match is also the most
//! specific one.

use tracing::debug;

use crate::coerce::coerce_from_string;
use crate::engine;
use crate::mock::ParsedMockInteraction;
use crate::result::{MockDetails, ResultCode, SpecDetails, ValidationResult};
use crate::spec::{ParsedSpec, ParsedSpecOperation, ParsedSpecResponse, PathSegment, SegmentMatcher};
use crate::types::Located;

/// Find the operation a mock request exercises.
///
/// A miss produces the single `request.path-or-method.unknown` error,
/// located at the mock's request path on one side and the whole `paths`
/// object on the other, since no specific operation was identified.
pub(crate) fn match_operation<'a>(
    interaction: &ParsedMockInteraction,
    spec: &'a ParsedSpec,
) -> Result<&'a ParsedSpecOperation, ValidationResult> {
    let found = spec.operations.iter().find(|operation| {
        interaction.request_method.value == operation.method
            && segments_match(&interaction.request_path_segments, &operation.path_segments)
    });
    match found {
        Some(operation) => {
            debug!(
                method = %operation.method,
                path = %operation.path_name,
                "matched operation"
            );
            Ok(operation)
        }
        None => Err(ValidationResult::new(
            ResultCode::RequestPathOrMethodUnknown,
            format!(
                "Path or method not defined in spec file: {} {}",
                interaction.request_method.value.to_uppercase(),
                interaction.request_path.value
            ),
            MockDetails::of(
                interaction,
                interaction.request_path.location.as_str(),
                Some(interaction.request_path.value.clone().into()),
            ),
            SpecDetails::of_paths(spec),
        )),
    }
}

fn segments_match(mock_segments: &[Located<String>], spec_segments: &[PathSegment]) -> bool {
    mock_segments.len() == spec_segments.len()
        && mock_segments
            .iter()
            .zip(spec_segments)
            .all(|(mock_segment, spec_segment)| match &spec_segment.matcher {
                SegmentMatcher::Equal => mock_segment.value == spec_segment.value,
                SegmentMatcher::JsonSchema(parameter) => engine::is_valid(
                    &parameter.schema,
                    &coerce_from_string(&mock_segment.value, &parameter.schema),
                ),
            })
}

/// Find the spec response for a mocked status code.
///
/// An exact match is silent; falling back to the spec's `default` response
/// is a warning, because defaults are a legitimate authoring pattern rather
/// than a contract violation; no match at all is an error.
pub(crate) fn match_response<'a>(
    interaction: &ParsedMockInteraction,
    operation: &'a ParsedSpecOperation,
) -> (Option<&'a ParsedSpecResponse>, Vec<ValidationResult>) {
    let status = interaction.response_status.value;
    if let Some(response) = operation.response(status) {
        return (Some(response), Vec::new());
    }

    let mock_details = MockDetails::of(
        interaction,
        interaction.response_status.location.as_str(),
        Some(status.into()),
    );
    match operation.default_response() {
        Some(response) => (
            Some(response),
            vec![ValidationResult::new(
                ResultCode::ResponseStatusDefault,
                format!("Response status code matched default response in spec file: {status}"),
                mock_details,
                SpecDetails::of(operation, format!("{}.responses", operation.location), None),
            )],
        ),
        None => (
            None,
            vec![ValidationResult::new(
                ResultCode::ResponseStatusUnknown,
                format!("Response status code not defined in spec file: {status}"),
                mock_details,
                SpecDetails::of(operation, format!("{}.responses", operation.location), None),
            )],
        ),
    }
}
