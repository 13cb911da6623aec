use std::collections::BTreeMap;

use serde::Serialize;

use formwalk_spec::{ValidationError, is_blank, is_visible};

use crate::session::{Direction, FormSession, Phase};

/// Read-only view for the presentation layer: everything it needs to render
/// the active scope, route focus, and draw progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: Phase,
    pub position: usize,
    pub direction: Direction,
    pub scope_count: usize,
    pub scope_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_title: Option<String>,
    /// Visible fields of the active scope, in declaration order.
    pub visible_fields: Vec<String>,
    /// Error snapshot from the last transition attempt, declaration order.
    pub errors: Vec<ValidationError>,
    /// First error per field, for focus/scroll routing.
    pub errors_by_field: BTreeMap<String, ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid: Option<String>,
    pub completed_steps: Vec<usize>,
    /// Answered visible input fields across the whole form.
    pub answered: usize,
    /// Visible input fields across the whole form.
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
}

impl FormSession {
    pub fn snapshot(&self) -> Snapshot {
        let form = self.form();
        let values = self.values();
        let scope = &form.scopes[self.position()];

        let visible_fields: Vec<String> = scope
            .field_indices
            .iter()
            .map(|&index| &form.fields[index])
            .filter(|field| is_visible(field, values))
            .map(|field| field.id.clone())
            .collect();

        let mut answered = 0;
        let mut total = 0;
        for field in &form.fields {
            if !field.is_input() || !is_visible(field, values) {
                continue;
            }
            total += 1;
            if !is_blank(field, values.get(&field.id)) {
                answered += 1;
            }
        }

        let errors = self.errors().to_vec();
        let mut errors_by_field = BTreeMap::new();
        for error in &errors {
            errors_by_field
                .entry(error.field_id.clone())
                .or_insert_with(|| error.clone());
        }
        let first_invalid = errors.first().map(|error| error.field_id.clone());

        Snapshot {
            phase: self.phase(),
            position: self.position(),
            direction: self.direction(),
            scope_count: form.scopes.len(),
            scope_id: scope.id.clone(),
            scope_title: scope.title.clone(),
            visible_fields,
            errors,
            errors_by_field,
            first_invalid,
            completed_steps: self.completed_steps().iter().copied().collect(),
            answered,
            total,
            submission_error: self.submission_error().map(str::to_string),
        }
    }
}
