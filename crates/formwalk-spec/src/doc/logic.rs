use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators available to conditional rules.
///
/// A tag outside the known set deserializes to `Unknown`, which never
/// matches — a misconfigured schema must not take down a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    #[serde(other)]
    Unknown,
}

/// A single `{fieldId, operator, value}` comparison against the value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field_id: String,
    pub operator: ConditionOperator,
    pub value: Value,
}

impl Condition {
    pub fn new(field_id: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field_id: field_id.into(),
            operator,
            value,
        }
    }
}

/// Conditional visibility rules attached to a field.
///
/// `show_when` conditions are OR-ed; `hide_when` is evaluated afterwards and
/// any match hides the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalLogic {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub show_when: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hide_when: Vec<Condition>,
}
