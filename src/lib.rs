//! specmock
//!
//! Checks that consumer-generated Pact mock interactions are compatible with
//! a provider's Swagger 2.0 or OpenAPI 3.x specification.
//!
//! Both documents are normalized into uniform internal representations, then
//! every mock interaction is matched against the spec's operations and run
//! through a battery of independent rule validators: path and method
//! resolution, content-type negotiation, security requirements, and
//! schema-level validation of bodies, headers and query parameters. Findings
//! come back as typed results with precise locations on both sides, reduced
//! to a single [`ValidationOutcome`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use specmock::{validate, ValidateOptions};
//!
//! let spec = json!({
//!     "swagger": "2.0",
//!     "info": {"title": "Users", "version": "1.0.0"},
//!     "paths": {
//!         "/users/{id}": {
//!             "get": {
//!                 "parameters": [
//!                     {"in": "path", "name": "id", "required": true, "type": "integer"}
//!                 ],
//!                 "responses": {"200": {"description": "a user"}}
//!             }
//!         }
//!     }
//! });
//! let mock = json!({
//!     "interactions": [{
//!         "description": "get a user",
//!         "request": {"method": "GET", "path": "/users/2"},
//!         "response": {"status": 200}
//!     }]
//! });
//!
//! let outcome = validate(&spec, "spec.json", &mock, "pact.json", &ValidateOptions::default())?;
//! assert!(outcome.success);
//! # Ok::<(), specmock::ParseError>(())
//! ```
//!
//! # Results
//!
//! Each finding carries a stable dotted code (for example
//! `request.path-or-method.unknown` or `response.body.incompatible`) whose
//! severity is fixed by the code itself. Downstream tooling should match on
//! codes, never on message text.

mod coerce;
mod engine;
mod error;
mod loader;
mod matcher;
mod mock;
mod negotiation;
mod result;
mod spec;
#[cfg(test)]
mod testing;
mod types;
mod validate;
mod validators;

pub use error::ParseError;
pub use loader::{is_url, load_document, load_document_auto, load_document_str};
pub use mock::{parse as parse_mock, ParsedMock, ParsedMockInteraction};
pub use negotiation::{find_matching_type, negotiate_accept, parse_accept, MediaRange};
pub use result::{
    MockDetails, ResultCode, ResultType, SpecDetails, ValidationOutcome, ValidationResult,
};
pub use spec::{
    parse as parse_spec, BodySchemas, CollectionFormat, CredentialLocation, ParsedSpec,
    ParsedSpecOperation, ParsedSpecResponse, PathSegment, SecurityGroup, SecurityRequirement,
    SegmentMatcher, SpecBody, SpecParameter,
};
pub use types::{Located, ValidateOptions};
pub use validate::{validate, validate_parsed};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
