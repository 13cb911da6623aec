use serde_json::json;

use formwalk_session::{FormSession, NavOutcome, Phase, SessionEvent};
use formwalk_spec::{
    Condition, ConditionOperator, ConditionalLogic, ErrorKind, FieldDoc, FieldType, FieldValue,
    Form, FormDoc, GroupDoc, normalize,
};

fn flat_form(fields: Vec<FieldDoc>) -> Form {
    normalize(&FormDoc {
        id: "flat".into(),
        title: "Flat".into(),
        description: None,
        fields,
        field_groups: vec![],
        theme: None,
        settings: Default::default(),
    })
    .expect("normalizes")
}

fn grouped_form(fields: Vec<FieldDoc>, groups: Vec<(&str, Vec<&str>)>) -> Form {
    normalize(&FormDoc {
        id: "grouped".into(),
        title: "Grouped".into(),
        description: None,
        fields,
        field_groups: groups
            .into_iter()
            .map(|(id, field_ids)| GroupDoc {
                id: id.into(),
                title: None,
                field_ids: field_ids.into_iter().map(String::from).collect(),
            })
            .collect(),
        theme: None,
        settings: Default::default(),
    })
    .expect("normalizes")
}

fn required(mut field: FieldDoc) -> FieldDoc {
    field.required = Some(true);
    field
}

fn contact_session() -> FormSession {
    FormSession::new(flat_form(vec![
        required(FieldDoc::new("name", FieldType::ShortText, "Your name")),
        required(FieldDoc::new("email", FieldType::Email, "Work email")),
    ]))
}

#[test]
fn blocked_until_required_field_is_filled() {
    let mut session = contact_session();

    let outcome = session.go_next();
    let NavOutcome::Blocked(errors) = outcome else {
        panic!("expected a blocked advance, got {outcome:?}");
    };
    assert_eq!(session.position(), 0);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field_id, "name");
    assert_eq!(errors[0].kind, ErrorKind::Required);

    session.set_value("name", FieldValue::text("Test User")).unwrap();
    assert_eq!(session.go_next(), NavOutcome::Moved(1));
    assert_eq!(session.position(), 1);
}

#[test]
fn flat_scenario_runs_to_submission() {
    let mut session = contact_session();

    // Both empty: flat mode validates one field per scope, so exactly the
    // first field reports.
    let NavOutcome::Blocked(errors) = session.go_next() else {
        panic!("expected block");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field_id, "name");

    session.set_value("name", FieldValue::text("Test User")).unwrap();
    assert_eq!(session.go_next(), NavOutcome::Moved(1));

    session.set_value("email", FieldValue::text("bad")).unwrap();
    let NavOutcome::Blocked(errors) = session.go_next() else {
        panic!("expected block on email");
    };
    assert_eq!(errors[0].kind, ErrorKind::Format);

    session.set_value("email", FieldValue::text("a@b.com")).unwrap();
    assert_eq!(session.go_next(), NavOutcome::SubmitReady);
    assert_eq!(session.phase(), Phase::Submitting);

    session.resolve_submit(Ok(()));
    assert_eq!(session.phase(), Phase::Submitted);

    let response = session.response();
    assert_eq!(
        serde_json::to_value(&response.values).unwrap(),
        json!({ "name": "Test User", "email": "a@b.com" })
    );
}

#[test]
fn go_previous_never_validates_and_preserves_values() {
    let mut session = contact_session();
    session.set_value("name", FieldValue::text("Test User")).unwrap();
    assert_eq!(session.go_next(), NavOutcome::Moved(1));

    // Previous works with the email scope in an invalid state.
    session.set_value("email", FieldValue::text("bad")).unwrap();
    assert_eq!(session.go_previous(), NavOutcome::Moved(0));
    assert!(session.errors().is_empty());
    assert_eq!(
        session.values().get("name"),
        Some(&FieldValue::text("Test User"))
    );

    // And it is a no-op below index 0.
    assert_eq!(session.go_previous(), NavOutcome::Ignored);
    assert_eq!(session.position(), 0);
}

#[test]
fn jump_requires_every_prior_scope_to_validate() {
    let mut session = FormSession::new(grouped_form(
        vec![
            required(FieldDoc::new("name", FieldType::ShortText, "Name")),
            FieldDoc::new("note", FieldType::LongText, "Note"),
            FieldDoc::new("extra", FieldType::ShortText, "Extra"),
        ],
        vec![
            ("one", vec!["name"]),
            ("two", vec!["note"]),
            ("three", vec!["extra"]),
        ],
    ));

    // Jumping forward past the unvalidated first step blocks with its
    // error set, exactly like go_next.
    let NavOutcome::Blocked(errors) = session.jump_to(2) else {
        panic!("expected jump to block");
    };
    assert_eq!(errors[0].field_id, "name");
    assert_eq!(session.position(), 0);

    session.set_value("name", FieldValue::text("Jo")).unwrap();
    assert_eq!(session.jump_to(2), NavOutcome::Moved(2));
    assert_eq!(
        session.completed_steps().iter().copied().collect::<Vec<_>>(),
        vec![0, 1]
    );

    // Backward jumps over completed steps are always fine.
    assert_eq!(session.jump_to(0), NavOutcome::Moved(0));

    // Out-of-range targets are a host defect and are ignored.
    assert_eq!(session.jump_to(9), NavOutcome::Ignored);
}

#[test]
fn hidden_scope_field_does_not_block_advance() {
    let mut details = required(FieldDoc::new("details", FieldType::ShortText, "Details"));
    details.conditional_logic = Some(ConditionalLogic {
        show_when: vec![Condition::new(
            "role",
            ConditionOperator::Equals,
            json!("Other"),
        )],
        hide_when: vec![],
    });
    let mut session = FormSession::new(grouped_form(
        vec![
            required(FieldDoc::new("role", FieldType::ShortText, "Role")),
            details,
            FieldDoc::new("done", FieldType::Statement, "Done"),
        ],
        vec![("main", vec!["role", "details"]), ("end", vec!["done"])],
    ));

    session.set_value("role", FieldValue::text("Engineering")).unwrap();
    // "details" is required but hidden, so the step validates clean.
    assert_eq!(session.go_next(), NavOutcome::Moved(1));

    // Flipping the upstream answer re-reveals it on the next attempt.
    session.set_value("role", FieldValue::text("Other")).unwrap();
    session.go_previous();
    let NavOutcome::Blocked(errors) = session.go_next() else {
        panic!("revealed field must now validate");
    };
    assert_eq!(errors[0].field_id, "details");
}

#[test]
fn events_fire_on_changes_and_moves() {
    let mut session = contact_session();
    session.set_value("name", FieldValue::text("Jo")).unwrap();
    session.go_next();

    let events = session.take_events();
    assert!(matches!(
        &events[0],
        SessionEvent::FieldChanged { field_id, .. } if field_id == "name"
    ));
    assert!(events
        .iter()
        .any(|event| matches!(event, SessionEvent::StepChanged { index: 1 })));

    // Drained: a second take returns nothing new.
    assert!(session.take_events().is_empty());

    // A blocked advance fires no step change.
    session.go_next();
    assert!(session
        .take_events()
        .iter()
        .all(|event| !matches!(event, SessionEvent::StepChanged { .. })));
}

#[test]
fn snapshot_reflects_active_scope() {
    let mut session = contact_session();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.position, 0);
    assert_eq!(snapshot.scope_count, 2);
    assert_eq!(snapshot.visible_fields, vec!["name".to_string()]);
    assert_eq!(snapshot.total, 2);
    assert_eq!(snapshot.answered, 0);

    session.set_value("name", FieldValue::text("Jo")).unwrap();
    session.go_next();
    session.set_value("email", FieldValue::text("bad")).unwrap();
    session.go_next();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.answered, 2);
    assert_eq!(snapshot.first_invalid.as_deref(), Some("email"));
    assert!(snapshot.errors_by_field.contains_key("email"));
}

#[test]
fn unknown_field_is_a_host_error() {
    let mut session = contact_session();
    assert!(session.set_value("nope", FieldValue::text("x")).is_err());
}
