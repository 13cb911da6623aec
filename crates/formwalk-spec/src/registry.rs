use crate::doc::FieldType;

/// Value shape expected for a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Free text (also file references and unknown fallbacks).
    Text,
    /// A single option drawn from the field's option list.
    Choice,
    /// A numeric value from the rating family.
    Number,
    /// A boolean acceptance toggle.
    Toggle,
    /// Display-only content that never carries a value.
    Display,
}

/// Constraint profile resolved from a field type tag.
#[derive(Debug, Clone, Copy)]
pub struct TypeProfile {
    pub required_default: bool,
    pub shape: ValueShape,
    pub default_options: Option<&'static [&'static str]>,
    pub default_range: Option<(i64, i64)>,
    /// Render-only marker for unknown tags, consumed by the presentation
    /// layer to pick a fallback widget.
    pub fallback: bool,
}

impl TypeProfile {
    /// Whether fields of this profile participate in validation at all.
    pub fn is_input(&self) -> bool {
        !matches!(self.shape, ValueShape::Display)
    }
}

const GENERIC_OPTIONS: &[&str] = &["Option 1", "Option 2", "Option 3"];
const YES_NO: &[&str] = &["Yes", "No"];

/// Pure lookup from a type tag to its constraint profile. No failure modes:
/// unknown tags resolve to the free-text profile with the fallback marker.
pub fn defaults_for(kind: FieldType) -> TypeProfile {
    let text = TypeProfile {
        required_default: false,
        shape: ValueShape::Text,
        default_options: None,
        default_range: None,
        fallback: false,
    };
    match kind {
        FieldType::ShortText
        | FieldType::LongText
        | FieldType::Email
        | FieldType::Phone
        | FieldType::Url
        | FieldType::FileUpload => text,
        FieldType::Unknown => TypeProfile {
            fallback: true,
            ..text
        },
        FieldType::SingleChoice | FieldType::MultiSelectDropdown => TypeProfile {
            shape: ValueShape::Choice,
            default_options: Some(GENERIC_OPTIONS),
            ..text
        },
        FieldType::BooleanChoice => TypeProfile {
            shape: ValueShape::Choice,
            default_options: Some(YES_NO),
            ..text
        },
        FieldType::NumericRating => TypeProfile {
            shape: ValueShape::Number,
            default_range: Some((1, 5)),
            ..text
        },
        FieldType::OpinionScale => TypeProfile {
            shape: ValueShape::Number,
            default_range: Some((1, 10)),
            ..text
        },
        FieldType::LegalConsent => TypeProfile {
            required_default: true,
            shape: ValueShape::Toggle,
            ..text
        },
        FieldType::Statement
        | FieldType::PageBreak
        | FieldType::StartPage
        | FieldType::EndPage => TypeProfile {
            shape: ValueShape::Display,
            ..text
        },
    }
}
