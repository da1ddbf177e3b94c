//! End-to-end validation scenarios.

use serde_json::{json, Value};
use specmock::{find_matching_type, validate, ResultCode, ResultType, ValidateOptions};

fn run(spec: &Value, mock: &Value) -> specmock::ValidationOutcome {
    validate(spec, "spec.json", mock, "pact.json", &ValidateOptions::default()).unwrap()
}

fn swagger(paths: Value) -> Value {
    json!({
        "swagger": "2.0",
        "info": {"title": "t", "version": "1"},
        "paths": paths
    })
}

fn pact(interactions: Value) -> Value {
    json!({
        "consumer": {"name": "consumer"},
        "provider": {"name": "provider"},
        "interactions": interactions
    })
}

mod matching {
    use super::*;

    #[test]
    fn literal_path_is_preferred_over_parameterized() {
        let spec = swagger(json!({
            "/users/{id}": {
                "get": {
                    "parameters": [
                        {"in": "path", "name": "id", "required": true, "type": "string"},
                        {"in": "header", "name": "x-token", "required": true, "type": "string"}
                    ],
                    "responses": {"200": {"description": "one user"}}
                }
            },
            "/users/static": {
                "get": {"responses": {"200": {"description": "static listing"}}}
            }
        }));
        // The parameterized operation would demand the x-token header; a
        // clean outcome proves the literal operation won the match.
        let mock = pact(json!([{
            "description": "static request",
            "request": {"method": "GET", "path": "/users/static"},
            "response": {"status": 200}
        }]));

        let outcome = run(&spec, &mock);
        assert!(outcome.success, "unexpected: {:?}", outcome.errors);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn unknown_path_produces_a_single_located_error() {
        let spec = swagger(json!({
            "/users": {"get": {"responses": {"200": {"description": "ok"}}}}
        }));
        let mock = pact(json!([{
            "description": "bad path",
            "providerState": "users exist",
            "request": {"method": "DELETE", "path": "/users/2"},
            "response": {"status": 200}
        }]));

        let outcome = run(&spec, &mock);
        assert_eq!(outcome.errors.len(), 1);
        let error = &outcome.errors[0];
        assert_eq!(error.code, ResultCode::RequestPathOrMethodUnknown);
        assert_eq!(
            error.message,
            "Path or method not defined in spec file: DELETE /users/2"
        );
        assert_eq!(
            error.mock_details.location,
            "[root].interactions[0].request.path"
        );
        assert_eq!(error.mock_details.interaction_state, "users exist");
        assert_eq!(error.spec_details.location, "[root].paths");
    }
}

mod negotiation {
    use super::*;

    #[test]
    fn quality_values_order_accept_preference() {
        let available = vec!["text/html".to_string()];
        assert_eq!(
            specmock::negotiate_accept("application/json;q=0.9, text/html", &available),
            Some("text/html")
        );
    }

    #[test]
    fn vendor_extension_matches_via_suffix_stage() {
        let available = vec!["application/json".to_string()];
        assert_eq!(
            find_matching_type("application/vnd.api+json", &available),
            Some("application/json")
        );
    }
}

mod security {
    use super::*;

    fn secured_spec() -> Value {
        json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "securityDefinitions": {
                "basicAuth": {"type": "basic"},
                "apiToken": {"type": "apiKey", "in": "query", "name": "token"}
            },
            "paths": {
                "/secure": {
                    "get": {
                        "security": [{"basicAuth": []}, {"apiToken": []}],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        })
    }

    #[test]
    fn satisfying_the_second_group_yields_zero_results() {
        let mock = pact(json!([{
            "description": "token auth",
            "request": {"method": "GET", "path": "/secure", "query": "token=abc"},
            "response": {"status": 200}
        }]));
        let outcome = run(&secured_spec(), &mock);
        assert!(outcome.success);
        assert!(outcome.errors.is_empty());
        // The token is a declared credential, so no unknown-query warning
        // either.
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn no_satisfied_group_reports_the_first_group() {
        let mock = pact(json!([{
            "description": "no auth",
            "request": {"method": "GET", "path": "/secure"},
            "response": {"status": 200}
        }]));
        let outcome = run(&secured_spec(), &mock);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, ResultCode::RequestAuthorizationMissing);
        assert_eq!(
            outcome.errors[0].mock_details.location,
            "[root].interactions[0].request.headers.authorization"
        );
    }
}

mod responses {
    use super::*;

    fn spec_with_default() -> Value {
        swagger(json!({
            "/health": {
                "get": {
                    "responses": {
                        "200": {"description": "ok"},
                        "default": {
                            "description": "anything else",
                            "schema": {
                                "type": "object",
                                "properties": {"message": {"type": "string"}}
                            }
                        }
                    }
                }
            }
        }))
    }

    #[test]
    fn default_response_degrades_to_a_single_warning() {
        let mock = pact(json!([{
            "description": "service down",
            "request": {"method": "GET", "path": "/health"},
            "response": {"status": 503, "body": {"message": "down"}}
        }]));
        let outcome = run(&spec_with_default(), &mock);
        assert!(outcome.success);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].code, ResultCode::ResponseStatusDefault);
    }

    #[test]
    fn default_response_body_is_still_validated() {
        let mock = pact(json!([{
            "description": "service down",
            "request": {"method": "GET", "path": "/health"},
            "response": {"status": 503, "body": {"message": 42}}
        }]));
        let outcome = run(&spec_with_default(), &mock);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, ResultCode::ResponseBodyIncompatible);
        assert_eq!(
            outcome.errors[0].mock_details.location,
            "[root].interactions[0].response.body.message"
        );
    }

    #[test]
    fn unknown_status_without_default_is_an_error() {
        let spec = swagger(json!({
            "/health": {"get": {"responses": {"200": {"description": "ok"}}}}
        }));
        let mock = pact(json!([{
            "description": "unexpected status",
            "request": {"method": "GET", "path": "/health"},
            "response": {"status": 418}
        }]));
        let outcome = run(&spec, &mock);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, ResultCode::ResponseStatusUnknown);
    }
}

mod bodies {
    use super::*;

    #[test]
    fn request_body_errors_are_located_at_the_offending_value() {
        let spec = swagger(json!({
            "/things": {
                "post": {
                    "parameters": [{
                        "in": "body", "name": "body", "required": true,
                        "schema": {
                            "type": "object",
                            "properties": {
                                "child": {
                                    "type": "object",
                                    "properties": {"id": {"type": "number"}}
                                }
                            }
                        }
                    }],
                    "responses": {"201": {"description": "created"}}
                }
            }
        }));
        let mock = pact(json!([{
            "description": "create a thing",
            "request": {
                "method": "POST", "path": "/things",
                "body": {"child": {"id": "x"}}
            },
            "response": {"status": 201}
        }]));

        let outcome = run(&spec, &mock);
        assert_eq!(outcome.errors.len(), 1);
        let error = &outcome.errors[0];
        assert_eq!(error.code, ResultCode::RequestBodyIncompatible);
        assert_eq!(
            error.mock_details.location,
            "[root].interactions[0].request.body.child.id"
        );
        assert_eq!(error.mock_details.value, Some(json!("x")));
    }

    #[test]
    fn openapi3_selects_request_schema_by_content_type() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/things": {
                    "post": {
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "required": ["name"],
                                        "properties": {"name": {"type": "string"}}
                                    }
                                }
                            }
                        },
                        "responses": {"201": {"description": "created"}}
                    }
                }
            }
        });
        let mock = pact(json!([{
            "description": "create a thing",
            "request": {
                "method": "POST", "path": "/things",
                "headers": {"Content-Type": "application/json"},
                "body": {"name": "widget"}
            },
            "response": {"status": 201}
        }]));
        let outcome = run(&spec, &mock);
        assert!(outcome.success, "unexpected: {:?}", outcome.errors);
    }

    #[test]
    fn numeric_formats_are_enforced() {
        let spec = swagger(json!({
            "/counters": {
                "post": {
                    "parameters": [{
                        "in": "body", "name": "body",
                        "schema": {
                            "type": "object",
                            "properties": {
                                "count": {"type": "integer", "format": "int32"}
                            }
                        }
                    }],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }));
        let mock = pact(json!([{
            "description": "counter overflow",
            "request": {
                "method": "POST", "path": "/counters",
                "body": {"count": 3000000000i64}
            },
            "response": {"status": 200}
        }]));
        let outcome = run(&spec, &mock);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, ResultCode::RequestBodyIncompatible);
    }

    #[test]
    fn response_extra_properties_allowed_when_opted_in() {
        let spec = swagger(json!({
            "/things": {
                "get": {
                    "responses": {
                        "200": {
                            "description": "ok",
                            "schema": {
                                "type": "object",
                                "properties": {"id": {"type": "string"}}
                            }
                        }
                    }
                }
            }
        }));
        let mock = pact(json!([{
            "description": "get a thing",
            "request": {"method": "GET", "path": "/things"},
            "response": {"status": 200, "body": {"id": "x", "extra": true}}
        }]));

        let strict = run(&spec, &mock);
        assert_eq!(strict.errors.len(), 1);
        assert_eq!(strict.errors[0].code, ResultCode::ResponseBodyIncompatible);

        let permissive = validate(
            &spec,
            "spec.json",
            &mock,
            "pact.json",
            &ValidateOptions {
                additional_properties_in_response: true,
                ..ValidateOptions::default()
            },
        )
        .unwrap();
        assert!(permissive.success);
    }
}

mod headers {
    use super::*;

    #[test]
    fn incompatible_request_header_end_to_end() {
        let spec = swagger(json!({
            "/one/users/{id}": {
                "get": {
                    "parameters": [
                        {"in": "path", "name": "id", "required": true, "type": "integer"},
                        {"in": "header", "name": "x-version", "type": "number"}
                    ],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }));
        let mock = pact(json!([{
            "description": "versioned request",
            "request": {
                "method": "GET", "path": "/one/users/2",
                "headers": {"x-version": "abc"}
            },
            "response": {"status": 200}
        }]));

        let outcome = run(&spec, &mock);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.warnings.is_empty());
        let error = &outcome.errors[0];
        assert_eq!(error.code, ResultCode::RequestHeaderIncompatible);
        assert_eq!(
            error.mock_details.location,
            "[root].interactions[0].request.headers.x-version"
        );
    }

    #[test]
    fn spec_header_matches_mock_header_case_insensitively() {
        let spec = swagger(json!({
            "/things": {
                "get": {
                    "parameters": [
                        {"in": "header", "name": "X-Request-Id", "required": true, "type": "string"}
                    ],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }));
        let mock = pact(json!([{
            "description": "lower-cased header",
            "request": {
                "method": "GET", "path": "/things",
                "headers": {"x-request-id": "abc-123"}
            },
            "response": {"status": 200}
        }]));
        let outcome = run(&spec, &mock);
        assert!(outcome.success);
        assert!(outcome.warnings.is_empty());
    }
}

mod properties {
    use super::*;

    fn mixed_scenario() -> (Value, Value) {
        let spec = swagger(json!({
            "/users": {
                "get": {"responses": {"200": {"description": "ok"}}}
            }
        }));
        let mock = pact(json!([
            {
                "description": "unknown header and status",
                "request": {
                    "method": "GET", "path": "/users",
                    "headers": {"x-custom": "1"}
                },
                "response": {"status": 404}
            },
            {
                "description": "fine",
                "request": {"method": "GET", "path": "/users"},
                "response": {"status": 200}
            }
        ]));
        (spec, mock)
    }

    #[test]
    fn partition_is_complete_and_success_tracks_errors() {
        let (spec, mock) = mixed_scenario();
        let outcome = run(&spec, &mock);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.errors[0].code, ResultCode::ResponseStatusUnknown);
        assert_eq!(outcome.warnings[0].code, ResultCode::RequestHeaderUnknown);
        assert!(outcome
            .errors
            .iter()
            .all(|result| result.result_type == ResultType::Error));
        assert!(!outcome.success);
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let (spec, mock) = mixed_scenario();
        let first = serde_json::to_string(&run(&spec, &mock)).unwrap();
        let second = serde_json::to_string(&run(&spec, &mock)).unwrap();
        assert_eq!(first, second);
    }
}
