//! Spec normalization.
//!
//! Consumes an already-parsed, already-dereferenced OpenAPI3 or Swagger2
//! document tree and produces a [`ParsedSpec`]: a flat list of operations
//! with pre-resolved parameters, content-type negotiation tables, security
//! requirements and per-response schema accessors. Structural and schema
//! validity of the document is the loader's problem; this module only
//! requires the shape it reads from.

mod openapi3;
mod swagger2;
pub(crate) mod transform;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::negotiation::find_matching_type;
use crate::types::{Located, ValidateOptions};

pub(crate) const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A normalized spec: every operation the provider declares.
#[derive(Debug, Clone)]
pub struct ParsedSpec {
    /// Operations in matching order: derived once, immutable after
    /// construction. Operations without path parameters sort before
    /// operations with them, so literal paths win over parameterized ones.
    pub operations: Vec<ParsedSpecOperation>,
    /// The whole `paths` object, for locating unknown-path results.
    pub paths: Located<Value>,
    /// Identifier of the spec source (path or URL).
    pub source: String,
}

/// One (path, HTTP method) pair of the spec.
#[derive(Debug, Clone)]
pub struct ParsedSpecOperation {
    /// Lower-cased HTTP method.
    pub method: String,
    pub path_name: String,
    pub path_segments: Vec<PathSegment>,
    pub location: String,
    pub spec_file: String,
    /// Media types the operation accepts in request bodies.
    pub consumes: Located<Vec<String>>,
    /// Media types the operation can produce across its responses.
    pub produces: Located<Vec<String>>,
    pub request_body: Option<SpecBody>,
    /// Request header parameters keyed by lower-cased name.
    pub request_headers: BTreeMap<String, SpecParameter>,
    /// Query parameters keyed by name.
    pub request_queries: BTreeMap<String, SpecParameter>,
    /// Responses keyed by status-code string, plus optionally `default`.
    pub responses: BTreeMap<String, ParsedSpecResponse>,
    /// Ordered-OR list of AND-groups of credentials.
    pub security_requirements: Vec<SecurityGroup>,
}

impl ParsedSpecOperation {
    /// Exact status-code lookup.
    pub fn response(&self, status: u16) -> Option<&ParsedSpecResponse> {
        self.responses.get(status.to_string().as_str())
    }

    /// The `default` response entry, when declared.
    pub fn default_response(&self) -> Option<&ParsedSpecResponse> {
        self.responses.get("default")
    }

    pub fn has_path_parameters(&self) -> bool {
        self.path_segments
            .iter()
            .any(|segment| matches!(segment.matcher, SegmentMatcher::JsonSchema(_)))
    }

    /// Credential keys from every security group, used to exempt
    /// security-carrying headers and query parameters from unknown-name
    /// warnings.
    pub fn security_credential_keys(&self) -> impl Iterator<Item = &str> {
        self.security_requirements
            .iter()
            .flat_map(|group| group.requirements.iter())
            .map(|requirement| requirement.credential_key.as_str())
    }
}

/// One segment of a templated path.
#[derive(Debug, Clone)]
pub struct PathSegment {
    /// Literal text, or the parameter name for parameter segments.
    pub value: String,
    pub matcher: SegmentMatcher,
    pub location: String,
}

/// How a path segment matches: literal equality or schema validation of the
/// coerced segment string.
#[derive(Debug, Clone)]
pub enum SegmentMatcher {
    Equal,
    JsonSchema(Box<SpecParameter>),
}

/// A non-body parameter definition (header, query, or path).
#[derive(Debug, Clone)]
pub struct SpecParameter {
    pub name: String,
    pub location: String,
    pub required: bool,
    /// The value schema, already prepared for the engine.
    pub schema: Value,
    /// Separator convention for array-valued parameters.
    pub collection_format: Option<CollectionFormat>,
}

/// Array-parameter serialization conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionFormat {
    Csv,
    Ssv,
    Tsv,
    Pipes,
    Multi,
}

impl CollectionFormat {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "csv" => Some(CollectionFormat::Csv),
            "ssv" => Some(CollectionFormat::Ssv),
            "tsv" => Some(CollectionFormat::Tsv),
            "pipes" => Some(CollectionFormat::Pipes),
            "multi" => Some(CollectionFormat::Multi),
            _ => None,
        }
    }
}

/// Schemas for a request or response body.
#[derive(Debug, Clone)]
pub struct SpecBody {
    pub location: String,
    pub required: bool,
    pub schemas: BodySchemas,
}

/// Swagger2 declares one schema per body; OpenAPI3 declares one per media
/// type.
#[derive(Debug, Clone)]
pub enum BodySchemas {
    Single(Located<Value>),
    ByContentType(Vec<(String, Located<Value>)>),
}

/// Result of selecting a body schema by negotiated content type.
#[derive(Debug, Clone)]
pub(crate) enum SchemaSelection<'a> {
    Found(&'a Located<Value>),
    /// Media types are declared but none matches the mock's content type.
    NoMatch,
}

impl SpecBody {
    /// Select the schema to validate a body against, negotiating the mock's
    /// content type against declared media types. A mock without a content
    /// type gets the first declared media type's schema.
    pub(crate) fn select_schema(&self, content_type: Option<&str>) -> SchemaSelection<'_> {
        match &self.schemas {
            BodySchemas::Single(schema) => SchemaSelection::Found(schema),
            BodySchemas::ByContentType(entries) => {
                let Some(content_type) = content_type else {
                    return match entries.first() {
                        Some((_, schema)) => SchemaSelection::Found(schema),
                        None => SchemaSelection::NoMatch,
                    };
                };
                let media_types: Vec<String> =
                    entries.iter().map(|(media, _)| media.clone()).collect();
                match find_matching_type(content_type, &media_types) {
                    Some(matched) => entries
                        .iter()
                        .find(|(media, _)| media == matched)
                        .map(|(_, schema)| SchemaSelection::Found(schema))
                        .unwrap_or(SchemaSelection::NoMatch),
                    None => SchemaSelection::NoMatch,
                }
            }
        }
    }
}

/// A response entry of an operation.
#[derive(Debug, Clone)]
pub struct ParsedSpecResponse {
    /// Status-code string, or `default`.
    pub status: String,
    pub location: String,
    /// Response header definitions keyed by lower-cased name.
    pub headers: BTreeMap<String, SpecParameter>,
    /// Media types this response can produce.
    pub produces: Located<Vec<String>>,
    pub body: Option<SpecBody>,
}

/// An AND-group of credentials; satisfying any one group satisfies the
/// operation.
#[derive(Debug, Clone)]
pub struct SecurityGroup {
    pub location: String,
    pub requirements: Vec<SecurityRequirement>,
}

/// One credential the mock request must carry.
#[derive(Debug, Clone)]
pub struct SecurityRequirement {
    /// Lower-cased header name, or the query parameter name.
    pub credential_key: String,
    pub credential_location: CredentialLocation,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialLocation {
    Header,
    Query,
}

/// Normalize a spec document into a [`ParsedSpec`].
///
/// Dispatches on the document's declared format. The document must carry
/// `info` and `paths`; everything deeper is read leniently because the
/// loader has already validated the document against the OpenAPI meta
/// schema.
pub fn parse(
    document: &Value,
    source: &str,
    options: &ValidateOptions,
) -> Result<ParsedSpec, ParseError> {
    let mut spec = if document.get("swagger").and_then(Value::as_str) == Some("2.0") {
        debug!(source, "parsing spec as swagger2");
        check_root(document, source)?;
        swagger2::parse(document, source, options)
    } else if document
        .get("openapi")
        .and_then(Value::as_str)
        .is_some_and(|version| version.starts_with('3'))
    {
        debug!(source, "parsing spec as openapi3");
        check_root(document, source)?;
        openapi3::parse(document, source, options)
    } else {
        return Err(ParseError::InvalidSpecDocument {
            source_name: source.to_string(),
            message: "expected a \"swagger\": \"2.0\" or \"openapi\": \"3.x\" document".into(),
        });
    };

    // Literal paths must win over parameterized ones when both match; a
    // stable sort keeps document order within each group.
    spec.operations
        .sort_by_key(ParsedSpecOperation::has_path_parameters);
    Ok(spec)
}

fn check_root(document: &Value, source: &str) -> Result<(), ParseError> {
    for property in ["info", "paths"] {
        if document.get(property).is_none() {
            return Err(ParseError::InvalidSpecDocument {
                source_name: source.to_string(),
                message: format!("missing required property: {property}"),
            });
        }
    }
    Ok(())
}

/// Merge path-item-level parameters with operation-level ones. An
/// operation parameter with the same `(in, name)` pair replaces the base
/// definition rather than appending to it.
pub(crate) fn merge_parameters(base: &[Value], overriding: &[Value]) -> Vec<Value> {
    let mut merged: Vec<Value> = base.to_vec();
    for param in overriding {
        let key = parameter_key(param);
        match merged.iter_mut().find(|existing| parameter_key(existing) == key) {
            Some(existing) => *existing = param.clone(),
            None => merged.push(param.clone()),
        }
    }
    merged
}

fn parameter_key(param: &Value) -> (Option<&str>, Option<&str>) {
    (
        param.get("in").and_then(Value::as_str),
        param.get("name").and_then(Value::as_str),
    )
}

/// Build the segment list for a templated path. `{name}` segments become
/// schema matchers when a matching path parameter is defined; without one
/// the segment degrades to a literal match on the raw template text.
pub(crate) fn build_path_segments(
    path_name: &str,
    path_location: &str,
    path_parameters: &BTreeMap<String, SpecParameter>,
) -> Vec<PathSegment> {
    path_name
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let parameter_name = segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'));
            match parameter_name.and_then(|name| path_parameters.get(name)) {
                Some(parameter) => PathSegment {
                    value: parameter.name.clone(),
                    matcher: SegmentMatcher::JsonSchema(Box::new(parameter.clone())),
                    location: parameter.location.clone(),
                },
                None => PathSegment {
                    value: segment.to_string(),
                    matcher: SegmentMatcher::Equal,
                    location: path_location.to_string(),
                },
            }
        })
        .collect()
}

/// Resolve the effective security declaration: a non-empty operation-level
/// array wins, anything else falls back to the document default.
pub(crate) fn resolve_security<'a>(
    operation: &'a Value,
    operation_location: &str,
    document: &'a Value,
) -> (Vec<&'a Value>, String) {
    let operation_security = operation.get("security").and_then(Value::as_array);
    match operation_security {
        Some(groups) if !groups.is_empty() => (
            groups.iter().collect(),
            format!("{operation_location}.security"),
        ),
        _ => (
            document
                .get("security")
                .and_then(Value::as_array)
                .map(|groups| groups.iter().collect())
                .unwrap_or_default(),
            "[root].security".to_string(),
        ),
    }
}
