//! Check model-supplied tool arguments against a tool's parameter schema.
//!
//! Only the top level is checked: the object shape, required fields and
//! declared property types. Handlers deserialize into typed structs and
//! catch anything deeper.

use serde_json::{Map, Value};
use thiserror::Error;

/// Why a set of arguments was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("expected object arguments, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' expected type '{expected}', got {found}")]
    WrongType {
        field: String,
        expected: String,
        found: &'static str,
    },
}

/// Arguments that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checked {
    /// Fields a strict schema does not declare, in argument order.
    pub undeclared: Vec<String>,
}

/// Validate `args` against `schema`.
///
/// `null` counts as absent: it fails a required field and is accepted for an
/// optional one. Undeclared fields are reported, not rejected, and only when
/// the schema sets `"additionalProperties": false`.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<Checked, ArgumentError> {
    let obj = match args {
        Value::Object(obj) => obj,
        other if schema.get("type").and_then(Value::as_str) == Some("object") => {
            return Err(ArgumentError::NotAnObject(kind(other)));
        }
        _ => return Ok(Checked::default()),
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for name in required {
        if obj.get(name).map_or(true, Value::is_null) {
            return Err(ArgumentError::MissingField(name.to_string()));
        }
    }

    let empty = Map::new();
    let properties = schema.get("properties").and_then(Value::as_object).unwrap_or(&empty);
    let strict = schema.get("additionalProperties") == Some(&Value::Bool(false));

    let mut checked = Checked::default();
    for (field, value) in obj {
        let Some(declared) = properties.get(field) else {
            if strict {
                checked.undeclared.push(field.clone());
            }
            continue;
        };
        if value.is_null() {
            continue;
        }
        if let Some(expected) = declared.get("type").and_then(Value::as_str) {
            if !has_type(value, expected) {
                return Err(ArgumentError::WrongType {
                    field: field.clone(),
                    expected: expected.to_string(),
                    found: kind(value),
                });
            }
        }
    }
    Ok(checked)
}

fn has_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
