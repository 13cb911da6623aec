//! String-in/string-out facade for presentation hosts.
//!
//! Every entry point takes the form document JSON plus (where applicable)
//! the current session state JSON, and returns the updated state, a
//! snapshot, drained events, and the operation outcome. Malformed input or
//! schema defects come back as `{"error": "..."}` payloads, never panics.

use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use formwalk_session::{FormSession, NavOutcome, SessionState, SubmitFailure};
use formwalk_spec::{FieldValue, Form, FormDoc, ValueMap, normalize, resolve_visibility};

#[derive(Debug, Error)]
enum HostError {
    #[error("failed to parse form document: {0}")]
    DocParse(#[source] serde_json::Error),
    #[error("invalid form schema: {0}")]
    Schema(#[from] formwalk_spec::SchemaError),
    #[error("failed to parse session state: {0}")]
    StateParse(#[source] serde_json::Error),
    #[error("failed to parse value: {0}")]
    ValueParse(#[source] serde_json::Error),
    #[error(transparent)]
    Session(#[from] formwalk_session::SessionError),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

fn load_form(form_json: &str) -> Result<Form, HostError> {
    let doc: FormDoc = serde_json::from_str(form_json).map_err(HostError::DocParse)?;
    Ok(normalize(&doc)?)
}

fn resume_session(form_json: &str, state_json: &str) -> Result<FormSession, HostError> {
    let form = load_form(form_json)?;
    let state: SessionState = serde_json::from_str(state_json).map_err(HostError::StateParse)?;
    Ok(FormSession::resume(form, state)?)
}

fn encode(value: impl serde::Serialize) -> Result<Value, HostError> {
    serde_json::to_value(value).map_err(HostError::JsonEncode)
}

fn session_payload(
    session: &mut FormSession,
    outcome: Option<NavOutcome>,
) -> Result<Value, HostError> {
    let events = encode(session.take_events())?;
    let outcome = match outcome {
        Some(outcome) => Some(outcome_value(&outcome, session)?),
        None => None,
    };
    let mut payload = json!({
        "state": encode(session.state())?,
        "snapshot": encode(session.snapshot())?,
        "events": events,
    });
    if let Some(outcome) = outcome {
        payload["outcome"] = outcome;
    }
    Ok(payload)
}

fn outcome_value(outcome: &NavOutcome, session: &FormSession) -> Result<Value, HostError> {
    Ok(match outcome {
        NavOutcome::Moved(index) => json!({ "kind": "moved", "index": index }),
        NavOutcome::Blocked(errors) => json!({ "kind": "blocked", "errors": encode(errors)? }),
        NavOutcome::SubmitReady => {
            json!({ "kind": "submit_ready", "response": encode(session.response())? })
        }
        NavOutcome::Ignored => json!({ "kind": "ignored" }),
    })
}

fn respond(result: Result<Value, HostError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value)
            .unwrap_or_else(|error| json!({ "error": format!("json encode: {error}") }).to_string()),
        Err(error) => json!({ "error": error.to_string() }).to_string(),
    }
}

/// Normalized form summary: id, title, mode, and the scope layout.
pub fn describe(form_json: &str) -> String {
    respond(load_form(form_json).and_then(|form| {
        let scopes: Vec<Value> = form
            .scopes
            .iter()
            .map(|scope| {
                json!({
                    "id": scope.id,
                    "title": scope.title,
                    "fields": scope
                        .field_indices
                        .iter()
                        .map(|&index| form.fields[index].id.clone())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        Ok(json!({
            "id": form.id,
            "title": form.title,
            "description": form.description,
            "mode": match form.mode {
                formwalk_spec::NavigationMode::Flat => "flat",
                formwalk_spec::NavigationMode::Grouped => "grouped",
            },
            "fieldCount": form.fields.len(),
            "scopes": scopes,
        }))
    }))
}

/// Opens a session at scope 0 and returns its initial state and snapshot.
pub fn start(form_json: &str) -> String {
    respond(load_form(form_json).and_then(|form| {
        let mut session = FormSession::new(form);
        session_payload(&mut session, None)
    }))
}

/// Records one value. `value_json` is the raw JSON value (`"Jane"`, `4`,
/// `true`).
pub fn set_value(form_json: &str, state_json: &str, field_id: &str, value_json: &str) -> String {
    respond(resume_session(form_json, state_json).and_then(|mut session| {
        let value: FieldValue =
            serde_json::from_str(value_json).map_err(HostError::ValueParse)?;
        session.set_value(field_id, value)?;
        session_payload(&mut session, None)
    }))
}

/// `go_next` over the facade.
pub fn advance(form_json: &str, state_json: &str) -> String {
    respond(resume_session(form_json, state_json).and_then(|mut session| {
        let outcome = session.go_next();
        debug!(?outcome, "advance");
        session_payload(&mut session, Some(outcome))
    }))
}

/// `go_previous` over the facade.
pub fn retreat(form_json: &str, state_json: &str) -> String {
    respond(resume_session(form_json, state_json).and_then(|mut session| {
        let outcome = session.go_previous();
        session_payload(&mut session, Some(outcome))
    }))
}

/// Direct jump to a scope index.
pub fn jump(form_json: &str, state_json: &str, target: usize) -> String {
    respond(resume_session(form_json, state_json).and_then(|mut session| {
        let outcome = session.jump_to(target);
        session_payload(&mut session, Some(outcome))
    }))
}

/// Explicit submit action: whole-form safety net, then hand-off readiness.
pub fn submit(form_json: &str, state_json: &str) -> String {
    respond(resume_session(form_json, state_json).and_then(|mut session| {
        let outcome = session.submit();
        session_payload(&mut session, Some(outcome))
    }))
}

/// Reports the submit collaborator's verdict back into the session.
pub fn resolve(form_json: &str, state_json: &str, ok: bool, reason: &str) -> String {
    respond(resume_session(form_json, state_json).and_then(|mut session| {
        let outcome = if ok {
            Ok(())
        } else {
            Err(SubmitFailure::new(reason))
        };
        let phase = session.resolve_submit(outcome);
        let mut payload = session_payload(&mut session, None)?;
        payload["outcome"] = json!({ "kind": "resolved", "phase": encode(phase)? });
        Ok(payload)
    }))
}

/// Stateless whole-map validation report.
pub fn validate_answers(form_json: &str, values_json: &str) -> String {
    respond(load_form(form_json).and_then(|form| {
        let values: ValueMap =
            serde_json::from_str(values_json).map_err(HostError::ValueParse)?;
        encode(formwalk_spec::validate_all(&form, &values))
    }))
}

/// JSON Schema of the value map for the currently-visible fields.
pub fn answers_schema(form_json: &str, values_json: &str) -> String {
    respond(load_form(form_json).and_then(|form| {
        let values: ValueMap =
            serde_json::from_str(values_json).map_err(HostError::ValueParse)?;
        let visibility = resolve_visibility(&form, &values);
        Ok(formwalk_spec::answers_schema(&form, &visibility))
    }))
}
