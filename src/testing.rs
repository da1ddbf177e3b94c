//! Shared fixtures for validator unit tests.

use serde_json::{json, Value};

use crate::mock::{self, ParsedMockInteraction};
use crate::spec::{self, ParsedSpecOperation};
use crate::types::ValidateOptions;

/// Parse a spec document and return its first operation.
pub(crate) fn operation_from(document: Value) -> ParsedSpecOperation {
    spec::parse(&document, "spec.json", &ValidateOptions::default())
        .unwrap()
        .operations
        .remove(0)
}

/// Build an interaction with the given request and a plain 200 response.
pub(crate) fn interaction_from(request: Value) -> ParsedMockInteraction {
    interaction(request, json!({"status": 200}))
}

/// Build an interaction from request and response fragments.
pub(crate) fn interaction(request: Value, response: Value) -> ParsedMockInteraction {
    let document = json!({
        "interactions": [{
            "description": "d",
            "request": request,
            "response": response
        }]
    });
    mock::parse(&document, "pact.json")
        .unwrap()
        .interactions
        .remove(0)
}
