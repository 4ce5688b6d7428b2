//! Shape validation of decoded payloads.
//!
//! Only the first element of the array is checked against the schema. Shape
//! drift upstream is source-wide (a renamed column renames it for every
//! record), so one representative element is enough to catch it, and a
//! single concrete field name is reported instead of the full error list.

use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationReason};
use crate::schema::{self, Schema, Violation};

/// Discriminated view of a decoded JSON value.
#[derive(Debug, Clone, Copy)]
pub enum ValueKind<'a> {
    Null,
    Scalar,
    Array(&'a [Value]),
    Object(&'a Map<String, Value>),
}

impl<'a> ValueKind<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => ValueKind::Scalar,
            Value::Array(items) => ValueKind::Array(items),
            Value::Object(map) => ValueKind::Object(map),
        }
    }
}

/// Checks that `value` is a non-empty array whose first element conforms to
/// `schema`. Returns the first failing check.
pub fn validate_shape(value: &Value, schema: &Schema, source_name: &str) -> Result<(), ValidationError> {
    let items = match ValueKind::of(value) {
        ValueKind::Array(items) => items,
        ValueKind::Null | ValueKind::Scalar | ValueKind::Object(_) => {
            return Err(ValidationError::generic(source_name, "expected a JSON array"));
        }
    };

    let first = match items.first() {
        Some(first) => first,
        None => return Err(ValidationError::generic(source_name, "JSON array is empty")),
    };

    let record = match ValueKind::of(first) {
        ValueKind::Object(record) => record,
        ValueKind::Null | ValueKind::Scalar | ValueKind::Array(_) => {
            return Err(ValidationError::generic(
                source_name,
                "first element must be an object",
            ));
        }
    };

    let violations = schema::check(schema, record);
    if violations.is_empty() {
        return Ok(());
    }

    Err(ValidationError {
        source_name: source_name.to_string(),
        reason: select_reason(&violations),
    })
}

/// Missing fields win over unexpected ones; anything else is generic.
fn select_reason(violations: &[Violation]) -> ValidationReason {
    let missing = violations.iter().find_map(|v| match v {
        Violation::MissingField(field) => Some(field),
        _ => None,
    });
    if let Some(field) = missing {
        return ValidationReason::Missing(field.clone());
    }

    let unexpected = violations.iter().find_map(|v| match v {
        Violation::UnexpectedField(field) => Some(field),
        _ => None,
    });
    if let Some(field) = unexpected {
        return ValidationReason::Unexpected(field.clone());
    }

    ValidationReason::Generic(schema::errors_text(violations))
}
