use thiserror::Error;

use formwalk_spec::{ResponseSet, ValidationError};

/// Failure reported by the submit collaborator. Scope-level, surfaced as a
/// banner; retry is re-triggering the submit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct SubmitFailure {
    pub reason: String,
}

impl SubmitFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The external submit collaborator. Called exactly once per successful
/// full-form validation; never invoked twice concurrently.
pub trait SubmitSink {
    fn submit(&mut self, response: &ResponseSet) -> Result<(), SubmitFailure>;
}

impl<F> SubmitSink for F
where
    F: FnMut(&ResponseSet) -> Result<(), SubmitFailure>,
{
    fn submit(&mut self, response: &ResponseSet) -> Result<(), SubmitFailure> {
        self(response)
    }
}

/// Outcome of a one-call [`submit_with`](crate::FormSession::submit_with).
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitReport {
    /// Delivered and acknowledged; the session is terminal.
    Completed,
    /// Full-form validation failed; no submission attempt was made.
    Blocked(Vec<ValidationError>),
    /// The collaborator rejected the hand-off; values are preserved.
    Failed(String),
    /// The session was not accepting a submission.
    Ignored,
}
