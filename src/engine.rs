//! The delegated JSON-Schema engine.
//!
//! Validation mechanics belong to the `jsonschema` crate; this module only
//! configures it with Swagger's format semantics and converts its errors
//! into path+message pairs the validators can locate against the original
//! documents.
//!
//! String formats (`byte`, `binary`, `password`) register as format
//! checkers. Numeric formats (`int32`, `int64`, `float`, `double`) cannot,
//! since format checkers only see strings, so the spec normalizer rewrites them
//! into an `x-numeric-format` annotation and this module registers the
//! matching custom keyword.

use serde_json::{Map, Value};
use tracing::debug;

use jsonschema::paths::{LazyLocation, Location};
use jsonschema::{Keyword, ValidationError, Validator};

/// Schema annotation produced by the normalizer for Swagger numeric formats.
pub(crate) const NUMERIC_FORMAT_KEYWORD: &str = "x-numeric-format";

/// A single schema violation with instance and schema path context.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    /// JSON Pointer (RFC 6901) to the offending value, e.g. `/child/id`.
    pub instance_path: String,
    /// JSON Pointer to the violated schema node.
    pub schema_path: String,
    /// Human-readable error message.
    pub message: String,
}

/// Validate `instance` against `schema`, collecting every violation.
///
/// An uncompilable schema yields a single violation rather than a panic; a
/// structurally-valid spec should never hit that path.
pub fn validate_json(schema: &Value, instance: &Value) -> Vec<SchemaViolation> {
    match build_validator(schema) {
        Ok(validator) => validator
            .iter_errors(instance)
            .map(|e| SchemaViolation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect(),
        Err(message) => {
            debug!(%message, "schema failed to compile");
            vec![SchemaViolation {
                instance_path: String::new(),
                schema_path: String::new(),
                message: format!("invalid schema: {message}"),
            }]
        }
    }
}

/// Validate without collecting error details.
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    build_validator(schema)
        .map(|validator| validator.is_valid(instance))
        .unwrap_or(false)
}

fn build_validator(schema: &Value) -> Result<Validator, String> {
    jsonschema::options()
        .should_validate_formats(true)
        .with_format("byte", is_base64)
        .with_format("binary", |_| true)
        .with_format("password", |_| true)
        .with_keyword(NUMERIC_FORMAT_KEYWORD, numeric_format_factory)
        .build(schema)
        .map_err(|e| e.to_string())
}

/// Base64 alphabet with optional `=` padding to a multiple of four.
fn is_base64(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if value.len() % 4 != 0 {
        return false;
    }
    let padding = value.chars().rev().take_while(|&c| c == '=').count();
    if padding > 2 {
        return false;
    }
    value[..value.len() - padding]
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericFormat {
    Int32,
    Int64,
    Float,
    Double,
}

impl NumericFormat {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "int32" => Some(NumericFormat::Int32),
            "int64" => Some(NumericFormat::Int64),
            "float" => Some(NumericFormat::Float),
            "double" => Some(NumericFormat::Double),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            NumericFormat::Int32 => "an int32 (integer within \u{b1}2^31-1)",
            NumericFormat::Int64 => "an int64 (integer within \u{b1}2^63-1)",
            NumericFormat::Float => "a float (single precision number)",
            NumericFormat::Double => "a double (number)",
        }
    }

    /// Checks numbers only; other instance types are left to the `type`
    /// keyword.
    fn accepts(&self, value: &Value) -> bool {
        let Value::Number(number) = value else {
            return true;
        };
        match self {
            NumericFormat::Int32 => number
                .as_i64()
                .is_some_and(|v| (-(2i64.pow(31) - 1)..=2i64.pow(31) - 1).contains(&v)),
            NumericFormat::Int64 => number.as_i64().is_some_and(|v| v != i64::MIN),
            NumericFormat::Float => number
                .as_f64()
                .is_some_and(|v| v.is_finite() && f64::from(v as f32) == v),
            NumericFormat::Double => number.as_f64().is_some(),
        }
    }
}

struct NumericFormatValidator {
    format: NumericFormat,
}

impl Keyword for NumericFormatValidator {
    fn validate<'instance>(
        &self,
        instance: &'instance Value,
        location: &LazyLocation,
    ) -> Result<(), ValidationError<'instance>> {
        if self.format.accepts(instance) {
            Ok(())
        } else {
            Err(ValidationError::custom(
                Location::new(),
                location.into(),
                instance,
                format!("{instance} is not {}", self.format.describe()),
            ))
        }
    }

    fn is_valid(&self, instance: &Value) -> bool {
        self.format.accepts(instance)
    }
}

fn numeric_format_factory<'a>(
    _parent: &'a Map<String, Value>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    value
        .as_str()
        .and_then(NumericFormat::parse)
        .map(|format| Box::new(NumericFormatValidator { format }) as Box<dyn Keyword>)
        .ok_or_else(|| {
            ValidationError::custom(
                Location::new(),
                path,
                value,
                "x-numeric-format must be one of int32, int64, float, double",
            )
        })
}
