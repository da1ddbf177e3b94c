//! Security requirement validator.
//!
//! Requirements are an ordered OR of AND-groups: the first group whose
//! credentials are all present satisfies the operation. When no group is
//! satisfied, only the first declared group's missing credentials are
//! reported; later alternatives are treated as fallbacks rather than
//! additional obligations.

use tracing::debug;

use crate::mock::ParsedMockInteraction;
use crate::result::{MockDetails, ResultCode, SpecDetails, ValidationResult};
use crate::spec::{CredentialLocation, ParsedSpecOperation, SecurityGroup, SecurityRequirement};

pub(crate) fn validate_security(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
) -> Vec<ValidationResult> {
    // Mocks that exercise the auth-rejection path are exempt from carrying
    // credentials themselves.
    if interaction.response_status.value >= 400 {
        debug!(
            status = interaction.response_status.value,
            "skipping security validation for error response"
        );
        return Vec::new();
    }

    let groups = &operation.security_requirements;
    if groups.is_empty() || groups.iter().any(|group| group_satisfied(interaction, group)) {
        return Vec::new();
    }

    // No group satisfied: report the first declared group only.
    groups
        .first()
        .map(|group| {
            group
                .requirements
                .iter()
                .filter(|requirement| !requirement_satisfied(interaction, requirement))
                .map(|requirement| missing_credential(interaction, operation, requirement))
                .collect()
        })
        .unwrap_or_default()
}

fn group_satisfied(interaction: &ParsedMockInteraction, group: &SecurityGroup) -> bool {
    group
        .requirements
        .iter()
        .all(|requirement| requirement_satisfied(interaction, requirement))
}

fn requirement_satisfied(
    interaction: &ParsedMockInteraction,
    requirement: &SecurityRequirement,
) -> bool {
    match requirement.credential_location {
        CredentialLocation::Header => interaction
            .request_headers
            .contains_key(&requirement.credential_key),
        CredentialLocation::Query => interaction
            .request_query
            .contains_key(&requirement.credential_key),
    }
}

fn missing_credential(
    interaction: &ParsedMockInteraction,
    operation: &ParsedSpecOperation,
    requirement: &SecurityRequirement,
) -> ValidationResult {
    let mock_location = match requirement.credential_location {
        CredentialLocation::Header => format!(
            "{}.request.headers.{}",
            interaction.location, requirement.credential_key
        ),
        CredentialLocation::Query => format!(
            "{}.request.query.{}",
            interaction.location, requirement.credential_key
        ),
    };
    ValidationResult::new(
        ResultCode::RequestAuthorizationMissing,
        "Request Authorization header is missing but is required by the spec file",
        MockDetails::of(interaction, mock_location, None),
        SpecDetails::of(operation, requirement.location.as_str(), None),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{interaction, interaction_from, operation_from};
    use serde_json::{json, Value};

    fn secured_operation(security: Value) -> ParsedSpecOperation {
        operation_from(json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "securityDefinitions": {
                "basicAuth": {"type": "basic"},
                "apiToken": {"type": "apiKey", "in": "query", "name": "token"},
                "apiHeader": {"type": "apiKey", "in": "header", "name": "X-Api-Key"}
            },
            "paths": {
                "/a": {
                    "get": {
                        "security": security,
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        }))
    }

    #[test]
    fn satisfied_first_group_passes() {
        let operation = secured_operation(json!([{"basicAuth": []}]));
        let interaction = interaction_from(json!({
            "method": "GET", "path": "/a",
            "headers": {"Authorization": "Basic abc"}
        }));
        assert!(validate_security(&interaction, &operation).is_empty());
    }

    #[test]
    fn any_satisfied_group_short_circuits() {
        let operation = secured_operation(json!([{"basicAuth": []}, {"apiToken": []}]));
        let interaction = interaction_from(json!({
            "method": "GET", "path": "/a", "query": "token=secret"
        }));
        assert!(validate_security(&interaction, &operation).is_empty());
    }

    #[test]
    fn unsatisfied_groups_report_first_group_only() {
        let operation = secured_operation(json!([
            {"basicAuth": [], "apiHeader": []},
            {"apiToken": []}
        ]));
        let interaction = interaction_from(json!({"method": "GET", "path": "/a"}));
        let results = validate_security(&interaction, &operation);
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.code == ResultCode::RequestAuthorizationMissing));
        assert_eq!(
            results[0].mock_details.location,
            "[root].interactions[0].request.headers.authorization"
        );
        assert_eq!(
            results[1].mock_details.location,
            "[root].interactions[0].request.headers.x-api-key"
        );
    }

    #[test]
    fn partially_satisfied_group_reports_missing_member() {
        let operation = secured_operation(json!([{"basicAuth": [], "apiHeader": []}]));
        let interaction = interaction_from(json!({
            "method": "GET", "path": "/a",
            "headers": {"Authorization": "Basic abc"}
        }));
        let results = validate_security(&interaction, &operation);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].mock_details.location,
            "[root].interactions[0].request.headers.x-api-key"
        );
    }

    #[test]
    fn error_responses_are_exempt() {
        let operation = secured_operation(json!([{"basicAuth": []}]));
        let interaction = interaction(
            json!({"method": "GET", "path": "/a"}),
            json!({"status": 401}),
        );
        assert!(validate_security(&interaction, &operation).is_empty());
    }

    #[test]
    fn operations_without_security_pass() {
        let operation = operation_from(json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "paths": {"/a": {"get": {"responses": {"200": {"description": "ok"}}}}}
        }));
        let interaction = interaction_from(json!({"method": "GET", "path": "/a"}));
        assert!(validate_security(&interaction, &operation).is_empty());
    }
}
