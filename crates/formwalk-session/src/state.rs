use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use formwalk_spec::{Form, ValueMap};

use crate::session::{Direction, FormSession, Phase, SessionError};

/// Serializable projection of a session, so an external collaborator can
/// park and resume a fill. The engine itself never persists anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub values: ValueMap,
    pub position: usize,
    pub direction: Direction,
    #[serde(default)]
    pub touched: BTreeSet<String>,
    #[serde(default)]
    pub completed: BTreeSet<usize>,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
}

impl FormSession {
    /// Current state for hand-off to an external store.
    pub fn state(&self) -> SessionState {
        SessionState {
            values: self.values.clone(),
            position: self.position,
            direction: self.direction,
            touched: self.touched.clone(),
            completed: self.completed.clone(),
            phase: self.phase,
            submission_error: self.submission_error.clone(),
        }
    }

    /// Rebuilds a session from a stored state. Index invariants are checked
    /// here, before the session is usable, never mid-fill.
    pub fn resume(form: Form, state: SessionState) -> Result<FormSession, SessionError> {
        if state.position >= form.scopes.len() {
            return Err(SessionError::CorruptState(format!(
                "position {} outside {} scopes",
                state.position,
                form.scopes.len()
            )));
        }
        if let Some(&scope) = state.completed.iter().next_back()
            && scope >= form.scopes.len()
        {
            return Err(SessionError::CorruptState(format!(
                "completed step {} outside {} scopes",
                scope,
                form.scopes.len()
            )));
        }
        Ok(FormSession {
            form,
            values: state.values,
            position: state.position,
            direction: state.direction,
            touched: state.touched,
            completed: state.completed,
            errors: Vec::new(),
            submission_error: state.submission_error,
            phase: state.phase,
            events: VecDeque::new(),
        })
    }
}
