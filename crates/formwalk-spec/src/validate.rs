use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::doc::FieldType;
use crate::normalize::{Field, Form};
use crate::value::{FieldValue, ValueMap};
use crate::visibility::is_visible;

/// Field-level error classes. All recoverable; none is ever thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    Format,
    Range,
    Custom,
}

/// One validation failure, produced in field-declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub field_id: String,
    pub message: String,
    pub kind: ErrorKind,
}

/// Whole-map validation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_fields: Vec<String>,
}

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email shape compiles"));
static URL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://\S+\.\S+$").expect("url shape compiles"));
static PHONE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s()\-]{7,}$").expect("phone shape compiles"));

/// Whether a value counts as empty for this field. Missing entries, blank
/// text, and an unaccepted consent toggle are all empty.
pub fn is_blank(field: &Field, value: Option<&FieldValue>) -> bool {
    match value {
        None => true,
        Some(FieldValue::Text(text)) => text.trim().is_empty(),
        Some(FieldValue::Toggle(accepted)) => {
            matches!(field.kind, FieldType::LegalConsent) && !accepted
        }
        Some(FieldValue::Number(_)) => false,
    }
}

/// Evaluates one field against its constraints, short-circuiting at the
/// first failing rule: required, then the type-specific check for non-empty
/// values. At most one error per field per call.
pub fn validate_field(field: &Field, value: Option<&FieldValue>) -> Option<ValidationError> {
    if is_blank(field, value) {
        if field.required {
            return Some(error(
                field,
                ErrorKind::Required,
                format!("{} is required", field.label),
            ));
        }
        return None;
    }
    let Some(value) = value else {
        return None;
    };

    match field.kind {
        FieldType::Email => shape_rule(
            field,
            value,
            &EMAIL_SHAPE,
            "Please enter a valid email address",
        ),
        FieldType::Url => shape_rule(field, value, &URL_SHAPE, "Please enter a valid URL"),
        FieldType::Phone => shape_rule(
            field,
            value,
            &PHONE_SHAPE,
            "Please enter a valid phone number",
        ),
        FieldType::ShortText | FieldType::LongText | FieldType::FileUpload | FieldType::Unknown => {
            text_rules(field, value)
        }
        FieldType::SingleChoice | FieldType::MultiSelectDropdown | FieldType::BooleanChoice => {
            choice_rule(field, value)
        }
        FieldType::NumericRating | FieldType::OpinionScale => rating_rule(field, value),
        FieldType::LegalConsent => consent_rule(field, value),
        FieldType::Statement | FieldType::PageBreak | FieldType::StartPage | FieldType::EndPage => {
            None
        }
    }
}

/// Validates a field list against the value map. Fields hidden by
/// conditional logic are excluded even when required; result order follows
/// the order of `fields`, not touch order.
pub fn validate_many<'a>(
    fields: impl IntoIterator<Item = &'a Field>,
    values: &ValueMap,
) -> Vec<ValidationError> {
    fields
        .into_iter()
        .filter(|field| is_visible(field, values))
        .filter_map(|field| validate_field(field, values.get(&field.id)))
        .collect()
}

/// Whole-form variant that additionally reports value keys matching no
/// schema field. Unknown keys never block a session; they only surface in
/// the explicit validation report.
pub fn validate_all(form: &Form, values: &ValueMap) -> ValidationReport {
    let errors = validate_many(&form.fields, values);
    let known: BTreeSet<&str> = form.fields.iter().map(|field| field.id.as_str()).collect();
    let unknown_fields: Vec<String> = values
        .keys()
        .filter(|key| !known.contains(key.as_str()))
        .cloned()
        .collect();
    ValidationReport {
        valid: errors.is_empty() && unknown_fields.is_empty(),
        errors,
        unknown_fields,
    }
}

fn shape_rule(
    field: &Field,
    value: &FieldValue,
    shape: &Regex,
    message: &str,
) -> Option<ValidationError> {
    let text = value.display();
    if shape.is_match(text.trim()) {
        None
    } else {
        Some(error(field, ErrorKind::Format, message.to_string()))
    }
}

fn text_rules(field: &Field, value: &FieldValue) -> Option<ValidationError> {
    let text = value.display();
    let trimmed = text.trim();

    if let Some(pattern) = &field.pattern {
        if pattern.is_match(trimmed) {
            return None;
        }
        return Some(match &field.custom_message {
            Some(message) => error(field, ErrorKind::Custom, message.clone()),
            None => error(
                field,
                ErrorKind::Format,
                "Value does not match the expected format".to_string(),
            ),
        });
    }

    let length = trimmed.chars().count();
    if let Some(min) = field.min_length
        && length < min
    {
        return Some(error(
            field,
            ErrorKind::Format,
            format!("Minimum {min} characters"),
        ));
    }
    if let Some(max) = field.max_length
        && length > max
    {
        return Some(error(
            field,
            ErrorKind::Format,
            format!("Maximum {max} characters"),
        ));
    }
    None
}

fn choice_rule(field: &Field, value: &FieldValue) -> Option<ValidationError> {
    let text = value.display();
    if field.options.iter().any(|option| option == text.trim()) {
        None
    } else {
        Some(error(
            field,
            ErrorKind::Format,
            "Please select one of the provided options".to_string(),
        ))
    }
}

fn rating_rule(field: &Field, value: &FieldValue) -> Option<ValidationError> {
    let (min, max) = field.rating_bounds.unwrap_or((1, 5));
    match value.as_number() {
        Some(number) if number >= min as f64 && number <= max as f64 => None,
        _ => Some(error(
            field,
            ErrorKind::Range,
            format!("Please choose a value between {min} and {max}"),
        )),
    }
}

// Scroll-to-accept is a presentation concern; the engine only re-validates
// the boolean.
fn consent_rule(field: &Field, value: &FieldValue) -> Option<ValidationError> {
    if value.as_toggle() == Some(true) {
        None
    } else {
        Some(error(
            field,
            ErrorKind::Format,
            format!("{} must be accepted", field.label),
        ))
    }
}

fn error(field: &Field, kind: ErrorKind, message: String) -> ValidationError {
    ValidationError {
        field_id: field.id.clone(),
        message,
        kind,
    }
}
