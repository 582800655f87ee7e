//! Options-schema validation.
//!
//! Plugins declare a JSON-Schema-like options schema in their manifest; the
//! host validates configured options against it before a widget is built.
//! Validation never fails hard: it always returns a [`ValidationReport`] and
//! the lifecycle treats a non-empty error list as an initialization failure.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared type of a single option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// UTF-8 string.
    String,
    /// Whole number.
    Integer,
    /// Any JSON number.
    Number,
    /// True or false.
    Boolean,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Schema for one declared option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Declared value type.
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value filled in when the option is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Inclusive lower bound for numeric values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound for numeric values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Closed set of allowed values.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Regex the full string value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl PropertySchema {
    fn of(kind: PropertyKind) -> Self {
        Self {
            kind,
            description: None,
            default: None,
            minimum: None,
            maximum: None,
            enum_values: None,
            pattern: None,
        }
    }

    /// A string property.
    #[must_use]
    pub fn string() -> Self {
        Self::of(PropertyKind::String)
    }

    /// An integer property.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(PropertyKind::Integer)
    }

    /// A number property.
    #[must_use]
    pub fn number() -> Self {
        Self::of(PropertyKind::Number)
    }

    /// A boolean property.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(PropertyKind::Boolean)
    }

    /// Set the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default value.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the inclusive minimum.
    #[must_use]
    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    /// Set the inclusive maximum.
    #[must_use]
    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    /// Restrict the value to a closed set.
    #[must_use]
    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    /// Require string values to match a regex.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Declared options schema for a plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsSchema {
    /// Declared properties by name.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    /// Names that must be present (or have a default).
    #[serde(default)]
    pub required: Vec<String>,
}

impl OptionsSchema {
    /// An empty schema accepting anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Mark a property as required.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Name of the offending property.
    pub path: String,
    /// What went wrong.
    pub message: String,
    /// The offending value, when one was supplied.
    pub value: Option<Value>,
}

impl Violation {
    /// Create a violation entry.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            value,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Result of validating options against a schema.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// True when no violations were recorded.
    pub valid: bool,
    /// Supplied options with schema defaults filled in.
    pub normalized: Map<String, Value>,
    /// One entry per violated constraint.
    pub errors: Vec<Violation>,
}

/// Validate `options` against `schema`, filling defaults.
///
/// Unknown keys pass through to `normalized` untouched. Never panics and
/// never returns an error value; inspect [`ValidationReport::valid`].
#[must_use]
pub fn validate(options: &Map<String, Value>, schema: &OptionsSchema) -> ValidationReport {
    let mut normalized = options.clone();
    let mut errors = Vec::new();

    for (name, property) in &schema.properties {
        match options.get(name) {
            None => {
                if let Some(default) = &property.default {
                    normalized.insert(name.clone(), default.clone());
                } else if schema.required.iter().any(|r| r == name) {
                    errors.push(Violation::new(name, "required option is missing", None));
                }
            }
            Some(value) => check_value(name, value, property, &mut errors),
        }
    }

    // Required names that are not declared at all still count as missing.
    for name in &schema.required {
        if !schema.properties.contains_key(name) && !options.contains_key(name) {
            errors.push(Violation::new(name, "required option is missing", None));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        normalized,
        errors,
    }
}

fn check_value(name: &str, value: &Value, property: &PropertySchema, errors: &mut Vec<Violation>) {
    let type_ok = match property.kind {
        PropertyKind::String => value.is_string(),
        PropertyKind::Integer => value.is_i64() || value.is_u64(),
        PropertyKind::Number => value.is_number(),
        PropertyKind::Boolean => value.is_boolean(),
    };
    if !type_ok {
        errors.push(Violation::new(
            name,
            format!("expected {}, got {}", property.kind, value_kind(value)),
            Some(value.clone()),
        ));
        return;
    }

    if let (Some(min), Some(number)) = (property.minimum, value.as_f64()) {
        if number < min {
            errors.push(Violation::new(
                name,
                format!("value {number} is below minimum {min}"),
                Some(value.clone()),
            ));
        }
    }
    if let (Some(max), Some(number)) = (property.maximum, value.as_f64()) {
        if number > max {
            errors.push(Violation::new(
                name,
                format!("value {number} exceeds maximum {max}"),
                Some(value.clone()),
            ));
        }
    }
    if let Some(allowed) = &property.enum_values {
        if !allowed.contains(value) {
            errors.push(Violation::new(
                name,
                format!("value is not one of the {} allowed values", allowed.len()),
                Some(value.clone()),
            ));
        }
    }
    if let (Some(pattern), Some(text)) = (&property.pattern, value.as_str()) {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(text) {
                    errors.push(Violation::new(
                        name,
                        format!("value does not match pattern '{pattern}'"),
                        Some(value.clone()),
                    ));
                }
            }
            Err(_) => errors.push(Violation::new(
                name,
                format!("schema pattern '{pattern}' is not a valid regex"),
                None,
            )),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
