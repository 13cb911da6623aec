use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::doc::logic::ConditionalLogic;

/// Closed set of field type tags accepted in a form document.
///
/// Unrecognized tags deserialize to [`FieldType::Unknown`] and degrade to a
/// free-text profile instead of failing the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    ShortText,
    LongText,
    Email,
    Phone,
    Url,
    SingleChoice,
    MultiSelectDropdown,
    BooleanChoice,
    NumericRating,
    OpinionScale,
    Statement,
    LegalConsent,
    FileUpload,
    PageBreak,
    StartPage,
    EndPage,
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// Wire tag for the type, matching the document serialization.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::ShortText => "short-text",
            FieldType::LongText => "long-text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::SingleChoice => "single-choice",
            FieldType::MultiSelectDropdown => "multi-select-dropdown",
            FieldType::BooleanChoice => "boolean-choice",
            FieldType::NumericRating => "numeric-rating",
            FieldType::OpinionScale => "opinion-scale",
            FieldType::Statement => "statement",
            FieldType::LegalConsent => "legal-consent",
            FieldType::FileUpload => "file-upload",
            FieldType::PageBreak => "page-break",
            FieldType::StartPage => "start-page",
            FieldType::EndPage => "end-page",
            FieldType::Unknown => "unknown",
        }
    }
}

/// Author-supplied validation rules for text fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    #[serde(default)]
    pub require_scroll_to_accept: bool,
}

/// A single field as it appears in the form document, pre-normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDoc {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<ConditionalLogic>,
}

impl FieldDoc {
    /// Minimal document field with everything else left to defaults.
    pub fn new(id: impl Into<String>, kind: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            required: None,
            options: None,
            min_rating: None,
            max_rating: None,
            min_length: None,
            max_length: None,
            validation_rules: None,
            conditional_logic: None,
        }
    }
}
