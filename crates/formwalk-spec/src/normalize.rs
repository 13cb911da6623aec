use std::collections::BTreeMap;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::doc::{ConditionalLogic, FieldDoc, FieldType, FormDoc, FormSettings};
use crate::registry::{ValueShape, defaults_for};

/// Schema defects rejected before a session exists.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate field id '{0}'")]
    DuplicateFieldId(String),
    #[error("duplicate group id '{0}'")]
    DuplicateGroupId(String),
    #[error("group '{group}' references unknown field '{field}'")]
    UnknownGroupField { group: String, field: String },
    #[error("field '{0}' appears in more than one group")]
    FieldInMultipleGroups(String),
    #[error("form '{0}' declares no fields")]
    EmptyForm(String),
}

/// Fixed for the lifetime of a form instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// One implicit group per field; one question at a time.
    Flat,
    /// Explicit ordered groups; one step at a time.
    Grouped,
}

/// The unit of navigation: a single field in flat mode, a group in grouped
/// mode. Indices point into [`Form::fields`].
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: String,
    pub title: Option<String>,
    pub field_indices: Vec<usize>,
}

/// A fully-populated field: every registry default resolved, the author
/// pattern compiled. Produced once by [`normalize`], immutable afterwards.
#[derive(Debug, Clone)]
pub struct Field {
    pub id: String,
    pub kind: FieldType,
    pub label: String,
    pub required: bool,
    pub shape: ValueShape,
    /// Non-empty exactly for choice-shaped fields.
    pub options: Vec<String>,
    /// Concrete bounds exactly for the rating family.
    pub rating_bounds: Option<(i64, i64)>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub custom_message: Option<String>,
    pub require_scroll_to_accept: bool,
    pub logic: Option<ConditionalLogic>,
    /// Render-only marker carried through from the registry for unknown tags.
    pub fallback: bool,
}

impl Field {
    pub fn is_input(&self) -> bool {
        !matches!(self.shape, ValueShape::Display)
    }
}

/// Normalized, immutable form. All navigation and validation run against
/// this, never against the raw document.
#[derive(Debug, Clone)]
pub struct Form {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub scopes: Vec<Scope>,
    pub mode: NavigationMode,
    pub settings: FormSettings,
    index: BTreeMap<String, usize>,
}

impl Form {
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.index.get(id).map(|&i| &self.fields[i])
    }

    pub fn field_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Fields of a scope in declaration order.
    pub fn scope_fields(&self, scope: usize) -> impl Iterator<Item = &Field> {
        self.scopes[scope]
            .field_indices
            .iter()
            .map(|&i| &self.fields[i])
    }
}

/// Expands a raw document into a [`Form`], filling registry defaults and
/// rejecting identity defects. Runs once per session, before any navigation
/// state is constructed.
pub fn normalize(doc: &FormDoc) -> Result<Form, SchemaError> {
    if doc.fields.is_empty() {
        return Err(SchemaError::EmptyForm(doc.id.clone()));
    }

    let mut index = BTreeMap::new();
    for (position, field) in doc.fields.iter().enumerate() {
        if index.insert(field.id.clone(), position).is_some() {
            return Err(SchemaError::DuplicateFieldId(field.id.clone()));
        }
    }

    let fields: Vec<Field> = doc.fields.iter().map(normalize_field).collect();
    let (scopes, mode) = build_scopes(doc, &index)?;

    Ok(Form {
        id: doc.id.clone(),
        title: doc.title.clone(),
        description: doc.description.clone(),
        fields,
        scopes,
        mode,
        settings: doc.settings.clone(),
        index,
    })
}

fn normalize_field(doc: &FieldDoc) -> Field {
    let profile = defaults_for(doc.kind);

    let required = if profile.is_input() {
        doc.required.unwrap_or(profile.required_default)
    } else {
        false
    };

    let options = match profile.shape {
        ValueShape::Choice => doc
            .options
            .clone()
            .filter(|options| !options.is_empty())
            .unwrap_or_else(|| {
                profile
                    .default_options
                    .unwrap_or_default()
                    .iter()
                    .map(|option| (*option).to_string())
                    .collect()
            }),
        _ => Vec::new(),
    };

    let rating_bounds = profile.default_range.map(|(default_min, default_max)| {
        let min = doc.min_rating.unwrap_or(default_min);
        let max = doc.max_rating.unwrap_or(default_max);
        if min > max {
            warn!(field = %doc.id, min, max, "rating bounds reversed; swapping");
            (max, min)
        } else {
            (min, max)
        }
    });

    let rules = doc.validation_rules.as_ref();
    let pattern = rules
        .and_then(|rules| rules.pattern.as_deref())
        .and_then(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(error) => {
                warn!(field = %doc.id, %error, "dropping uncompilable pattern");
                None
            }
        });

    Field {
        id: doc.id.clone(),
        kind: doc.kind,
        label: doc.label.clone(),
        required,
        shape: profile.shape,
        options,
        rating_bounds,
        min_length: doc.min_length,
        max_length: doc.max_length,
        pattern,
        custom_message: rules.and_then(|rules| rules.custom_message.clone()),
        require_scroll_to_accept: rules.is_some_and(|rules| rules.require_scroll_to_accept),
        logic: doc.conditional_logic.clone(),
        fallback: profile.fallback,
    }
}

fn build_scopes(
    doc: &FormDoc,
    index: &BTreeMap<String, usize>,
) -> Result<(Vec<Scope>, NavigationMode), SchemaError> {
    if doc.field_groups.is_empty() {
        let scopes = doc
            .fields
            .iter()
            .enumerate()
            .map(|(position, field)| Scope {
                id: field.id.clone(),
                title: None,
                field_indices: vec![position],
            })
            .collect();
        return Ok((scopes, NavigationMode::Flat));
    }

    let mut seen_groups = BTreeMap::new();
    let mut assigned: BTreeMap<usize, &str> = BTreeMap::new();
    let mut scopes = Vec::with_capacity(doc.field_groups.len());

    for group in &doc.field_groups {
        if seen_groups.insert(group.id.as_str(), ()).is_some() {
            return Err(SchemaError::DuplicateGroupId(group.id.clone()));
        }
        let mut field_indices = Vec::with_capacity(group.field_ids.len());
        for field_id in &group.field_ids {
            let &position = index
                .get(field_id)
                .ok_or_else(|| SchemaError::UnknownGroupField {
                    group: group.id.clone(),
                    field: field_id.clone(),
                })?;
            if assigned.insert(position, group.id.as_str()).is_some() {
                return Err(SchemaError::FieldInMultipleGroups(field_id.clone()));
            }
            field_indices.push(position);
        }
        scopes.push(Scope {
            id: group.id.clone(),
            title: group.title.clone(),
            field_indices,
        });
    }

    // A misconfigured schema stays fillable: leftovers become a trailing step.
    let leftovers: Vec<usize> = (0..doc.fields.len())
        .filter(|position| !assigned.contains_key(position))
        .collect();
    if !leftovers.is_empty() {
        warn!(
            count = leftovers.len(),
            "fields outside every group collected into a trailing step"
        );
        scopes.push(Scope {
            id: "ungrouped".to_string(),
            title: None,
            field_indices: leftovers,
        });
    }

    Ok((scopes, NavigationMode::Grouped))
}
