use std::collections::BTreeMap;

use serde_json::Value;

use crate::doc::{Condition, ConditionOperator};
use crate::normalize::{Field, Form};
use crate::value::{FieldValue, ValueMap, format_number};

pub type VisibilityMap = BTreeMap<String, bool>;

/// Whether a field currently participates in validation and rendering.
///
/// Pure function of the value map: re-evaluated on every use, never
/// memoized, so any upstream change can flip visibility. Show conditions
/// are OR-ed and evaluated first; hide conditions are evaluated afterwards
/// and win.
pub fn is_visible(field: &Field, values: &ValueMap) -> bool {
    let Some(logic) = &field.logic else {
        return true;
    };
    if !logic.show_when.is_empty()
        && !logic
            .show_when
            .iter()
            .any(|condition| condition_met(condition, values))
    {
        return false;
    }
    if logic
        .hide_when
        .iter()
        .any(|condition| condition_met(condition, values))
    {
        return false;
    }
    true
}

/// Full visibility map for rendering and schema emission.
pub fn resolve_visibility(form: &Form, values: &ValueMap) -> VisibilityMap {
    form.fields
        .iter()
        .map(|field| (field.id.clone(), is_visible(field, values)))
        .collect()
}

fn condition_met(condition: &Condition, values: &ValueMap) -> bool {
    let actual = values.get(&condition.field_id);
    match condition.operator {
        ConditionOperator::Equals => {
            actual.is_some_and(|value| loose_eq(value, &condition.value))
        }
        ConditionOperator::NotEquals => {
            actual.is_none_or(|value| !loose_eq(value, &condition.value))
        }
        ConditionOperator::Contains => actual.is_some_and(|value| {
            value.display().contains(&literal_text(&condition.value))
        }),
        ConditionOperator::GreaterThan => numeric(actual, &condition.value, |a, b| a > b),
        ConditionOperator::LessThan => numeric(actual, &condition.value, |a, b| a < b),
        ConditionOperator::Unknown => false,
    }
}

fn loose_eq(actual: &FieldValue, expected: &Value) -> bool {
    actual.display() == literal_text(expected)
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        other => other.to_string(),
    }
}

fn numeric(
    actual: Option<&FieldValue>,
    expected: &Value,
    compare: impl Fn(f64, f64) -> bool,
) -> bool {
    let Some(actual) = actual.and_then(|value| value.as_number()) else {
        return false;
    };
    let Some(expected) = literal_number(expected) else {
        return false;
    };
    compare(actual, expected)
}

fn literal_number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
}
