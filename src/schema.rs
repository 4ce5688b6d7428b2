/// Structural contracts for upstream records.
///
/// A schema is plain data: an ordered list of declared fields and a flag
/// saying whether undeclared fields are allowed. `check` runs one record
/// through a schema and reports every rule it breaks; deciding which single
/// violation to surface is left to `validate`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Schema types
// ---------------------------------------------------------------------------

/// Expected JSON type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Any value, including null.
    #[default]
    Any,
    Text,
    Number,
    Object,
    Array,
    Boolean,
}

impl FieldType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Any => true,
            FieldType::Text => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
            FieldType::Boolean => value.is_boolean(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldType::Any => "any",
            FieldType::Text => "string",
            FieldType::Number => "number",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Boolean => "boolean",
        }
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    /// When set, fields not listed in `fields` are violations.
    #[serde(default = "default_closed")]
    pub closed: bool,
    pub fields: Vec<Property>,
}

fn default_closed() -> bool {
    true
}

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingField(String),
    UnexpectedField(String),
    WrongType {
        field: String,
        expected: FieldType,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingField(field) => write!(f, "must have required property '{}'", field),
            Violation::UnexpectedField(field) => write!(f, "must NOT have additional property '{}'", field),
            Violation::WrongType { field, expected } => {
                write!(f, "/{} must be {}", field, expected.describe())
            }
        }
    }
}

impl Schema {
    pub fn new(name: &str, closed: bool, fields: Vec<Property>) -> Self {
        Schema {
            name: name.to_string(),
            closed,
            fields,
        }
    }

    /// Required field names in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|p| p.required).map(|p| p.name.as_str())
    }

    pub fn declares(&self, field: &str) -> bool {
        self.fields.iter().any(|p| p.name == field)
    }

    /// Same fields, but undeclared fields are tolerated.
    pub fn opened(mut self) -> Self {
        self.closed = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Structural check
// ---------------------------------------------------------------------------

/// Runs `record` through `schema`, collecting every violation.
///
/// Order of the result: missing fields in declaration order, then type
/// mismatches in declaration order, then unexpected fields in document order.
pub fn check(schema: &Schema, record: &Map<String, Value>) -> Vec<Violation> {
    let mut violations = Vec::new();

    for property in &schema.fields {
        match record.get(&property.name) {
            None if property.required => {
                violations.push(Violation::MissingField(property.name.clone()));
            }
            None => {}
            Some(value) => {
                // An optional field explicitly set to null counts as absent.
                if !property.required && value.is_null() {
                    continue;
                }
                if !property.field_type.accepts(value) {
                    violations.push(Violation::WrongType {
                        field: property.name.clone(),
                        expected: property.field_type,
                    });
                }
            }
        }
    }

    if schema.closed {
        for field in record.keys() {
            if !schema.declares(field) {
                violations.push(Violation::UnexpectedField(field.clone()));
            }
        }
    }

    violations
}

/// Joins violations the way they are embedded in a generic failure message.
pub fn errors_text(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Built-in schemas
// ---------------------------------------------------------------------------

pub const DAILY_STATISTICS_SCHEMA: &str = "daily-operational-statistics";
pub const RESERVOIR_CONDITION_SCHEMA: &str = "reservoir-condition-data";

const DAILY_TEXT_FIELDS: &[&str] = &["reservoiridentifier", "reservoirname", "recordtime"];

const DAILY_NUMERIC_FIELDS: &[&str] = &[
    "catchmentarearainfall",
    "inflowvolume",
    "outflow",
    "outflowdischarge",
    "outflowtotal",
    "crossflow",
    "regulatorydischarge",
    "deadstoragelevel",
    "fullwaterlevel",
    "effectivecapacity",
];

const CONDITION_TEXT_FIELDS: &[&str] = &["reservoiridentifier", "observationtime", "statustype"];

const CONDITION_NUMERIC_FIELDS: &[&str] = &[
    "waterlevel",
    "effectivewaterstoragecapacity",
    "inflowdischarge",
    "totaloutflow",
    "accumulaterainfallincatchment",
    "spillwayoutflow",
    "poweroutletoutflow",
    "desiltingtunneloutflow",
    "drainagetunneloutflow",
    "othersoutflow",
];

fn required(names: &[&str], field_type: FieldType) -> impl Iterator<Item = Property> {
    names.iter().map(move |name| Property {
        name: name.to_string(),
        field_type,
        required: true,
    })
}

/// Upstream numbers arrive either as JSON numbers or numeric strings, so
/// measurements are typed `Any` and coerced by the mapper.
pub fn daily_operational_statistics() -> Schema {
    let mut fields: Vec<Property> = required(DAILY_TEXT_FIELDS, FieldType::Text)
        .chain(required(DAILY_NUMERIC_FIELDS, FieldType::Any))
        .collect();
    fields.push(Property {
        name: "latestwaterdata".to_string(),
        field_type: FieldType::Object,
        required: false,
    });
    Schema::new(DAILY_STATISTICS_SCHEMA, true, fields)
}

pub fn reservoir_condition_data() -> Schema {
    let fields = required(CONDITION_TEXT_FIELDS, FieldType::Text)
        .chain(required(CONDITION_NUMERIC_FIELDS, FieldType::Any))
        .collect();
    Schema::new(RESERVOIR_CONDITION_SCHEMA, true, fields)
}

/// Looks up a built-in schema by name.
pub fn builtin(name: &str) -> Option<Schema> {
    match name {
        DAILY_STATISTICS_SCHEMA => Some(daily_operational_statistics()),
        RESERVOIR_CONDITION_SCHEMA => Some(reservoir_condition_data()),
        _ => None,
    }
}
