use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A respondent-entered value, tagged by shape.
///
/// Text fields and choice fields carry `Text`, the rating family carries
/// `Number`, and legal consent carries `Toggle`. The untagged serde form
/// keeps the JSON wire shape natural (`"Jane"`, `4`, `true`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Toggle(bool),
    Number(f64),
    Text(String),
}

/// Current answers, keyed by field id. Owned exclusively by the active
/// session and mutated only through `set_value`.
pub type ValueMap = BTreeMap<String, FieldValue>;

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric view with lenient coercion: numeric strings parse, toggles
    /// never coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(value) => value.trim().parse().ok(),
            FieldValue::Toggle(_) => None,
        }
    }

    pub fn as_toggle(&self) -> Option<bool> {
        match self {
            FieldValue::Toggle(value) => Some(*value),
            _ => None,
        }
    }

    /// Canonical string rendering used for loose comparisons and display.
    /// Whole numbers drop their fractional part (`5`, not `5.0`).
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(value) => value.clone(),
            FieldValue::Toggle(value) => value.to_string(),
            FieldValue::Number(value) => format_number(*value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Toggle(value)
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
