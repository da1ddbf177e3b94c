//! Validation results and the run outcome.
//!
//! Each finding is a [`ValidationResult`]: a stable machine-readable code, a
//! human-readable message, and the mock-side and spec-side locations it was
//! derived from. Results are created once, collected into flat lists, and
//! partitioned into errors and warnings at the end of the run, never merged
//! or deduplicated.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::mock::ParsedMockInteraction;
use crate::spec::{ParsedSpec, ParsedSpecOperation};

/// The fixed vocabulary of result codes.
///
/// Downstream tooling (CI gating, dashboards) matches on the dotted rendering
/// of these codes, not on message text, so the set and its spelling are a
/// public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    RequestPathOrMethodUnknown,
    RequestAcceptIncompatible,
    RequestAcceptUnknown,
    RequestAuthorizationMissing,
    RequestBodyIncompatible,
    RequestBodyUnknown,
    RequestContentTypeIncompatible,
    RequestContentTypeMissing,
    RequestContentTypeUnknown,
    RequestHeaderIncompatible,
    RequestHeaderUnknown,
    RequestQueryIncompatible,
    RequestQueryUnknown,
    ResponseBodyIncompatible,
    ResponseBodyUnknown,
    ResponseContentTypeIncompatible,
    ResponseContentTypeUnknown,
    ResponseHeaderIncompatible,
    ResponseHeaderUndefined,
    ResponseHeaderUnknown,
    ResponseStatusDefault,
    ResponseStatusUnknown,
}

impl ResultCode {
    /// Dotted wire form of the code, e.g. `request.path-or-method.unknown`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::RequestPathOrMethodUnknown => "request.path-or-method.unknown",
            ResultCode::RequestAcceptIncompatible => "request.accept.incompatible",
            ResultCode::RequestAcceptUnknown => "request.accept.unknown",
            ResultCode::RequestAuthorizationMissing => "request.authorization.missing",
            ResultCode::RequestBodyIncompatible => "request.body.incompatible",
            ResultCode::RequestBodyUnknown => "request.body.unknown",
            ResultCode::RequestContentTypeIncompatible => "request.content-type.incompatible",
            ResultCode::RequestContentTypeMissing => "request.content-type.missing",
            ResultCode::RequestContentTypeUnknown => "request.content-type.unknown",
            ResultCode::RequestHeaderIncompatible => "request.header.incompatible",
            ResultCode::RequestHeaderUnknown => "request.header.unknown",
            ResultCode::RequestQueryIncompatible => "request.query.incompatible",
            ResultCode::RequestQueryUnknown => "request.query.unknown",
            ResultCode::ResponseBodyIncompatible => "response.body.incompatible",
            ResultCode::ResponseBodyUnknown => "response.body.unknown",
            ResultCode::ResponseContentTypeIncompatible => "response.content-type.incompatible",
            ResultCode::ResponseContentTypeUnknown => "response.content-type.unknown",
            ResultCode::ResponseHeaderIncompatible => "response.header.incompatible",
            ResultCode::ResponseHeaderUndefined => "response.header.undefined",
            ResultCode::ResponseHeaderUnknown => "response.header.unknown",
            ResultCode::ResponseStatusDefault => "response.status.default",
            ResultCode::ResponseStatusUnknown => "response.status.unknown",
        }
    }

    /// Whether a code is an error or a warning.
    ///
    /// Membership in the error set is fixed; every other code is a warning.
    pub fn result_type(&self) -> ResultType {
        match self {
            ResultCode::RequestPathOrMethodUnknown
            | ResultCode::RequestAcceptIncompatible
            | ResultCode::RequestAuthorizationMissing
            | ResultCode::RequestBodyIncompatible
            | ResultCode::RequestBodyUnknown
            | ResultCode::RequestContentTypeIncompatible
            | ResultCode::RequestHeaderIncompatible
            | ResultCode::RequestQueryIncompatible
            | ResultCode::ResponseBodyIncompatible
            | ResultCode::ResponseBodyUnknown
            | ResultCode::ResponseContentTypeIncompatible
            | ResultCode::ResponseHeaderIncompatible
            | ResultCode::ResponseStatusUnknown => ResultType::Error,
            _ => ResultType::Warning,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResultCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Severity of a result, derived from its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Error,
    Warning,
}

/// Mock-side provenance of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockDetails {
    pub interaction_description: Option<String>,
    pub interaction_state: String,
    pub location: String,
    pub mock_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Spec-side provenance of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDetails {
    pub location: String,
    pub path_method: Option<String>,
    pub path_name: Option<String>,
    pub spec_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl MockDetails {
    /// Mock-side provenance for a location inside `interaction`.
    pub(crate) fn of(
        interaction: &ParsedMockInteraction,
        location: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        Self {
            interaction_description: interaction.description.clone(),
            interaction_state: interaction.state.clone(),
            location: location.into(),
            mock_file: interaction.mock_file.clone(),
            value,
        }
    }
}

impl SpecDetails {
    /// Spec-side provenance for a location inside `operation`.
    pub(crate) fn of(
        operation: &ParsedSpecOperation,
        location: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        Self {
            location: location.into(),
            path_method: Some(operation.method.clone()),
            path_name: Some(operation.path_name.clone()),
            spec_file: operation.spec_file.clone(),
            value,
        }
    }

    /// Spec-side provenance when no operation was identified: the whole
    /// `paths` object.
    pub(crate) fn of_paths(spec: &ParsedSpec) -> Self {
        Self {
            location: spec.paths.location.clone(),
            path_method: None,
            path_name: None,
            spec_file: spec.source.clone(),
            value: Some(spec.paths.value.clone()),
        }
    }
}

/// One compatibility finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub code: ResultCode,
    pub message: String,
    #[serde(rename = "type")]
    pub result_type: ResultType,
    pub source: &'static str,
    pub mock_details: MockDetails,
    pub spec_details: SpecDetails,
}

impl ValidationResult {
    /// The single result-building function. Severity is derived from the
    /// code here and nowhere else.
    pub fn new(
        code: ResultCode,
        message: impl Into<String>,
        mock_details: MockDetails,
        spec_details: SpecDetails,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            result_type: code.result_type(),
            source: "spec-mock-validation",
            mock_details,
            spec_details,
        }
    }
}

/// The reduced outcome of a validation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub success: bool,
    pub errors: Vec<ValidationResult>,
    pub warnings: Vec<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ValidationOutcome {
    /// Partition a flat result list into the final outcome, preserving the
    /// order results were produced in.
    pub(crate) fn from_results(
        results: Vec<ValidationResult>,
        mock_source: &str,
        spec_source: &str,
    ) -> Self {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            match result.result_type {
                ResultType::Error => errors.push(result),
                ResultType::Warning => warnings.push(result),
            }
        }

        let success = errors.is_empty();
        let failure_reason = if success {
            None
        } else {
            Some(format!(
                "Mock file \"{mock_source}\" is not compatible with spec file \"{spec_source}\""
            ))
        };

        Self {
            success,
            errors,
            warnings,
            failure_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_details() -> MockDetails {
        MockDetails {
            interaction_description: Some("a request for a user".into()),
            interaction_state: "[none]".into(),
            location: "[root].interactions[0].request.path".into(),
            mock_file: "pact.json".into(),
            value: Some(Value::String("/users/2".into())),
        }
    }

    fn spec_details() -> SpecDetails {
        SpecDetails {
            location: "[root].paths".into(),
            path_method: None,
            path_name: None,
            spec_file: "spec.json".into(),
            value: None,
        }
    }

    #[test]
    fn code_renders_dotted_form() {
        assert_eq!(
            ResultCode::RequestPathOrMethodUnknown.to_string(),
            "request.path-or-method.unknown"
        );
        assert_eq!(
            ResultCode::ResponseHeaderUndefined.to_string(),
            "response.header.undefined"
        );
    }

    #[test]
    fn severity_is_derived_from_code() {
        assert_eq!(
            ResultCode::RequestBodyIncompatible.result_type(),
            ResultType::Error
        );
        assert_eq!(
            ResultCode::ResponseStatusDefault.result_type(),
            ResultType::Warning
        );
        assert_eq!(
            ResultCode::RequestHeaderUnknown.result_type(),
            ResultType::Warning
        );

        let result = ValidationResult::new(
            ResultCode::ResponseStatusUnknown,
            "Response status code not defined in spec file: 202",
            mock_details(),
            spec_details(),
        );
        assert_eq!(result.result_type, ResultType::Error);
        assert_eq!(result.source, "spec-mock-validation");
    }

    #[test]
    fn outcome_partition_is_complete() {
        let error = ValidationResult::new(
            ResultCode::RequestBodyIncompatible,
            "bad body",
            mock_details(),
            spec_details(),
        );
        let warning = ValidationResult::new(
            ResultCode::RequestHeaderUnknown,
            "unknown header",
            mock_details(),
            spec_details(),
        );

        let outcome = ValidationOutcome::from_results(
            vec![error.clone(), warning.clone(), error.clone()],
            "pact.json",
            "spec.json",
        );
        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(
            outcome.failure_reason.as_deref(),
            Some("Mock file \"pact.json\" is not compatible with spec file \"spec.json\"")
        );
    }

    #[test]
    fn outcome_with_only_warnings_is_success() {
        let warning = ValidationResult::new(
            ResultCode::ResponseStatusDefault,
            "matched default",
            mock_details(),
            spec_details(),
        );
        let outcome = ValidationOutcome::from_results(vec![warning], "pact.json", "spec.json");
        assert!(outcome.success);
        assert!(outcome.failure_reason.is_none());
    }

    #[test]
    fn result_serializes_with_wire_field_names() {
        let result = ValidationResult::new(
            ResultCode::RequestHeaderIncompatible,
            "bad header",
            mock_details(),
            spec_details(),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["code"], "request.header.incompatible");
        assert_eq!(json["type"], "error");
        assert_eq!(json["mockDetails"]["mockFile"], "pact.json");
        assert_eq!(json["specDetails"]["specFile"], "spec.json");
    }
}
