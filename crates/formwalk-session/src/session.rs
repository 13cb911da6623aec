use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use formwalk_spec::{
    FieldValue, Form, NavigationMode, ResponseSet, ValidationError, ValueMap, is_visible,
    validate_many,
};

use crate::submit::{SubmitFailure, SubmitReport, SubmitSink};

/// Lifecycle phase of a session. `Submitted` is terminal: no further
/// mutation of the value map is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InProgress,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// Notifications for the presentation layer, drained via
/// [`FormSession::take_events`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    FieldChanged { field_id: String, value: FieldValue },
    StepChanged { index: usize },
    PhaseChanged { phase: Phase },
}

/// Result of a navigation attempt. Blocking on the active scope's
/// validation is the only blocking condition in the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum NavOutcome {
    /// Moved to the given scope index.
    Moved(usize),
    /// Stayed in place; the active scope's error set, in declaration order.
    Blocked(Vec<ValidationError>),
    /// Whole form validated clean; the session is now `Submitting` and the
    /// value map should be handed to the submit collaborator.
    SubmitReady,
    /// Operation not applicable in the current phase (or a no-op edge).
    Ignored,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown field id '{0}'")]
    UnknownField(String),
    #[error("session state is corrupt: {0}")]
    CorruptState(String),
}

/// A respondent's pass through one form. Owns the value map; every public
/// operation runs to completion before the next is accepted.
pub struct FormSession {
    pub(crate) form: Form,
    pub(crate) values: ValueMap,
    pub(crate) position: usize,
    pub(crate) direction: Direction,
    pub(crate) touched: BTreeSet<String>,
    pub(crate) completed: BTreeSet<usize>,
    pub(crate) errors: Vec<ValidationError>,
    pub(crate) submission_error: Option<String>,
    pub(crate) phase: Phase,
    pub(crate) events: VecDeque<SessionEvent>,
}

impl FormSession {
    /// Opens a session at scope 0 with an empty value map.
    pub fn new(form: Form) -> Self {
        Self {
            form,
            values: ValueMap::new(),
            position: 0,
            direction: Direction::Forward,
            touched: BTreeSet::new(),
            completed: BTreeSet::new(),
            errors: Vec::new(),
            submission_error: None,
            phase: Phase::InProgress,
            events: VecDeque::new(),
        }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn touched(&self) -> &BTreeSet<String> {
        &self.touched
    }

    /// Error snapshot from the most recent transition attempt.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Stable field-keyed lookup used to route focus to the first invalid
    /// field after a blocked transition.
    pub fn error_for(&self, field_id: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|error| error.field_id == field_id)
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    /// Drains pending presentation events in emission order.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// Records a value and marks the field touched. A no-op while
    /// submitting or after submission; unknown ids are a host defect.
    pub fn set_value(
        &mut self,
        field_id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), SessionError> {
        if self.phase != Phase::InProgress {
            debug!(field_id, phase = ?self.phase, "set_value ignored");
            return Ok(());
        }
        if !self.form.contains(field_id) {
            return Err(SessionError::UnknownField(field_id.to_string()));
        }
        let value = value.into();
        self.values.insert(field_id.to_string(), value.clone());
        self.touched.insert(field_id.to_string());
        self.events.push_back(SessionEvent::FieldChanged {
            field_id: field_id.to_string(),
            value,
        });
        Ok(())
    }

    /// Validates the active scope and advances on success. On the final
    /// scope a clean pass enters the submission path instead.
    pub fn go_next(&mut self) -> NavOutcome {
        if self.phase != Phase::InProgress {
            return NavOutcome::Ignored;
        }
        let scope = self.position;
        let errors = self.validate_scope(scope);
        self.errors = errors.clone();
        if !errors.is_empty() {
            debug!(scope, count = errors.len(), "advance blocked");
            return NavOutcome::Blocked(errors);
        }
        self.completed.insert(scope);
        if scope + 1 >= self.form.scopes.len() {
            return self.begin_submission();
        }
        self.position = scope + 1;
        self.direction = Direction::Forward;
        self.events.push_back(SessionEvent::StepChanged {
            index: self.position,
        });
        NavOutcome::Moved(self.position)
    }

    /// Always permitted without validation; entered answers are preserved.
    /// A no-op below index 0.
    pub fn go_previous(&mut self) -> NavOutcome {
        if self.phase != Phase::InProgress || self.position == 0 {
            return NavOutcome::Ignored;
        }
        self.position -= 1;
        self.direction = Direction::Backward;
        self.errors.clear();
        self.events.push_back(SessionEvent::StepChanged {
            index: self.position,
        });
        NavOutcome::Moved(self.position)
    }

    /// Direct jump (step-indicator click). Every scope strictly before the
    /// target must have passed validation at least once; not-yet-completed
    /// scopes are validated now with the current values, and the first
    /// failure blocks exactly like [`go_next`](Self::go_next).
    pub fn jump_to(&mut self, target: usize) -> NavOutcome {
        if self.phase != Phase::InProgress {
            return NavOutcome::Ignored;
        }
        if target >= self.form.scopes.len() {
            warn!(target, scopes = self.form.scopes.len(), "jump out of range");
            return NavOutcome::Ignored;
        }
        if target == self.position {
            return NavOutcome::Ignored;
        }
        for scope in 0..target {
            if self.completed.contains(&scope) {
                continue;
            }
            let errors = self.validate_scope(scope);
            if !errors.is_empty() {
                self.errors = errors.clone();
                return NavOutcome::Blocked(errors);
            }
            self.completed.insert(scope);
        }
        self.direction = if target > self.position {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.position = target;
        self.errors.clear();
        self.events
            .push_back(SessionEvent::StepChanged { index: target });
        NavOutcome::Moved(target)
    }

    /// Explicit submit action. Runs the same whole-form safety net as the
    /// final scope's `go_next`.
    pub fn submit(&mut self) -> NavOutcome {
        if self.phase != Phase::InProgress {
            return NavOutcome::Ignored;
        }
        self.begin_submission()
    }

    /// Resolves the outstanding submit hand-off. Success is terminal;
    /// failure returns to the last scope with all values preserved and a
    /// submission-level error surfaced.
    pub fn resolve_submit(&mut self, outcome: Result<(), SubmitFailure>) -> Phase {
        if self.phase != Phase::Submitting {
            debug!(phase = ?self.phase, "resolve_submit ignored");
            return self.phase;
        }
        match outcome {
            Ok(()) => self.set_phase(Phase::Submitted),
            Err(failure) => {
                warn!(reason = %failure, "submission failed");
                self.submission_error = Some(failure.to_string());
                self.set_phase(Phase::InProgress);
            }
        }
        self.phase
    }

    /// Runs the whole submit hand-off against a synchronous sink in one
    /// call: validate, deliver, resolve.
    pub fn submit_with<S: SubmitSink + ?Sized>(&mut self, sink: &mut S) -> SubmitReport {
        match self.submit() {
            NavOutcome::SubmitReady => {
                let response = self.response();
                match sink.submit(&response) {
                    Ok(()) => {
                        self.resolve_submit(Ok(()));
                        SubmitReport::Completed
                    }
                    Err(failure) => {
                        let reason = failure.to_string();
                        self.resolve_submit(Err(failure));
                        SubmitReport::Failed(reason)
                    }
                }
            }
            NavOutcome::Blocked(errors) => SubmitReport::Blocked(errors),
            _ => SubmitReport::Ignored,
        }
    }

    /// The value map packaged for the submit collaborator.
    pub fn response(&self) -> ResponseSet {
        ResponseSet::new(self.form.id.clone(), self.values.clone())
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.events.push_back(SessionEvent::PhaseChanged { phase });
    }

    /// Validates the visible fields of a scope, sweeping them touched.
    fn validate_scope(&mut self, scope: usize) -> Vec<ValidationError> {
        let Self {
            form,
            values,
            touched,
            ..
        } = self;
        let mut visible = Vec::new();
        for &index in &form.scopes[scope].field_indices {
            let field = &form.fields[index];
            if is_visible(field, values) {
                touched.insert(field.id.clone());
                visible.push(field);
            }
        }
        validate_many(visible, values)
    }

    /// Terminal transition: touch everything, validate the whole visible
    /// field set, and either revert to the errored scope or hand off.
    fn begin_submission(&mut self) -> NavOutcome {
        {
            let Self { form, touched, .. } = self;
            for field in &form.fields {
                touched.insert(field.id.clone());
            }
        }
        let errors = validate_many(&self.form.fields, &self.values);
        if !errors.is_empty() {
            if self.form.mode == NavigationMode::Grouped
                && let Some(scope) = self.last_scope_with_error(&errors)
                && scope != self.position
            {
                self.position = scope;
                self.direction = Direction::Backward;
                self.events
                    .push_back(SessionEvent::StepChanged { index: scope });
            }
            self.errors = errors.clone();
            return NavOutcome::Blocked(errors);
        }
        self.errors.clear();
        self.submission_error = None;
        self.completed.insert(self.position);
        self.set_phase(Phase::Submitting);
        NavOutcome::SubmitReady
    }

    fn last_scope_with_error(&self, errors: &[ValidationError]) -> Option<usize> {
        let errored: BTreeSet<&str> = errors.iter().map(|error| error.field_id.as_str()).collect();
        self.form
            .scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, scope)| {
                scope
                    .field_indices
                    .iter()
                    .any(|&field| errored.contains(self.form.fields[field].id.as_str()))
                    .then_some(index)
            })
    }
}
