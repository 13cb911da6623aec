use serde_json::{Map, Value, json};

use crate::doc::FormDoc;
use crate::normalize::{Field, Form};
use crate::registry::ValueShape;
use crate::visibility::VisibilityMap;

/// JSON Schema describing the value map for the currently-visible fields.
/// Hidden fields are omitted entirely; visible required fields land in
/// `required`.
pub fn answers_schema(form: &Form, visibility: &VisibilityMap) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &form.fields {
        if !field.is_input() || !visibility.get(&field.id).copied().unwrap_or(true) {
            continue;
        }
        properties.insert(field.id.clone(), field_schema(field));
        if field.required {
            required.push(Value::String(field.id.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": format!("{} answers", form.title),
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Schema of the form document itself, derived from the model types.
pub fn document_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(FormDoc)).unwrap_or(Value::Null)
}

fn field_schema(field: &Field) -> Value {
    match field.shape {
        ValueShape::Choice => json!({
            "type": "string",
            "title": field.label,
            "enum": field.options,
        }),
        ValueShape::Number => {
            let (min, max) = field.rating_bounds.unwrap_or((1, 5));
            json!({
                "type": "number",
                "title": field.label,
                "minimum": min,
                "maximum": max,
            })
        }
        ValueShape::Toggle => json!({
            "type": "boolean",
            "title": field.label,
        }),
        ValueShape::Text | ValueShape::Display => {
            let mut schema = Map::new();
            schema.insert("type".into(), Value::String("string".into()));
            schema.insert("title".into(), Value::String(field.label.clone()));
            if let Some(min) = field.min_length {
                schema.insert("minLength".into(), Value::from(min));
            }
            if let Some(max) = field.max_length {
                schema.insert("maxLength".into(), Value::from(max));
            }
            if let Some(pattern) = &field.pattern {
                schema.insert("pattern".into(), Value::String(pattern.as_str().to_string()));
            }
            Value::Object(schema)
        }
    }
}
