use serde_json::{Value, json};

const CONTACT_FORM: &str = r#"{
    "id": "contact",
    "title": "Contact us",
    "fields": [
        { "id": "name", "type": "short-text", "label": "Your name", "required": true },
        { "id": "email", "type": "email", "label": "Work email", "required": true }
    ]
}"#;

fn parse(response: &str) -> Value {
    let value: Value = serde_json::from_str(response).expect("facade returns JSON");
    assert!(
        value.get("error").is_none(),
        "unexpected facade error: {value}"
    );
    value
}

fn state_of(payload: &Value) -> String {
    payload["state"].to_string()
}

#[test]
fn start_opens_at_scope_zero() {
    let payload = parse(&formwalk_host::start(CONTACT_FORM));
    assert_eq!(payload["state"]["position"], 0);
    assert_eq!(payload["snapshot"]["phase"], "in_progress");
    assert_eq!(payload["snapshot"]["visibleFields"], json!(["name"]));
    assert_eq!(payload["snapshot"]["total"], 2);
}

#[test]
fn full_flow_round_trips_through_json() {
    let payload = parse(&formwalk_host::start(CONTACT_FORM));
    let state = state_of(&payload);

    // Blocked advance: required name missing.
    let payload = parse(&formwalk_host::advance(CONTACT_FORM, &state));
    assert_eq!(payload["outcome"]["kind"], "blocked");
    assert_eq!(payload["outcome"]["errors"][0]["fieldId"], "name");
    assert_eq!(payload["state"]["position"], 0);
    let state = state_of(&payload);

    // Fill and advance.
    let payload = parse(&formwalk_host::set_value(
        CONTACT_FORM,
        &state,
        "name",
        "\"Test User\"",
    ));
    assert!(payload["events"]
        .as_array()
        .unwrap()
        .iter()
        .any(|event| event["kind"] == "field_changed"));
    let state = state_of(&payload);

    let payload = parse(&formwalk_host::advance(CONTACT_FORM, &state));
    assert_eq!(payload["outcome"]["kind"], "moved");
    assert_eq!(payload["outcome"]["index"], 1);
    let state = state_of(&payload);

    // Bad email blocks with a format error.
    let payload = parse(&formwalk_host::set_value(
        CONTACT_FORM,
        &state,
        "email",
        "\"bad\"",
    ));
    let state = state_of(&payload);
    let payload = parse(&formwalk_host::advance(CONTACT_FORM, &state));
    assert_eq!(payload["outcome"]["kind"], "blocked");
    assert_eq!(payload["outcome"]["errors"][0]["kind"], "format");
    let state = state_of(&payload);

    // Valid email reaches the hand-off.
    let payload = parse(&formwalk_host::set_value(
        CONTACT_FORM,
        &state,
        "email",
        "\"a@b.com\"",
    ));
    let state = state_of(&payload);
    let payload = parse(&formwalk_host::advance(CONTACT_FORM, &state));
    assert_eq!(payload["outcome"]["kind"], "submit_ready");
    assert_eq!(
        payload["outcome"]["response"]["values"],
        json!({ "name": "Test User", "email": "a@b.com" })
    );
    assert_eq!(payload["snapshot"]["phase"], "submitting");
    let state = state_of(&payload);

    // Collaborator failure returns to the form with the banner error.
    let payload = parse(&formwalk_host::resolve(
        CONTACT_FORM,
        &state,
        false,
        "store unreachable",
    ));
    assert_eq!(payload["snapshot"]["phase"], "in_progress");
    assert_eq!(payload["snapshot"]["submissionError"], "store unreachable");
    let state = state_of(&payload);

    // Retry: explicit submit, then success.
    let payload = parse(&formwalk_host::submit(CONTACT_FORM, &state));
    assert_eq!(payload["outcome"]["kind"], "submit_ready");
    let state = state_of(&payload);
    let payload = parse(&formwalk_host::resolve(CONTACT_FORM, &state, true, ""));
    assert_eq!(payload["snapshot"]["phase"], "submitted");
}

#[test]
fn retreat_and_jump_round_trip() {
    let payload = parse(&formwalk_host::start(CONTACT_FORM));
    let state = state_of(&payload);
    let payload = parse(&formwalk_host::set_value(
        CONTACT_FORM,
        &state,
        "name",
        "\"Jo\"",
    ));
    let state = state_of(&payload);
    let payload = parse(&formwalk_host::advance(CONTACT_FORM, &state));
    let state = state_of(&payload);

    let payload = parse(&formwalk_host::retreat(CONTACT_FORM, &state));
    assert_eq!(payload["outcome"]["kind"], "moved");
    assert_eq!(payload["state"]["position"], 0);
    let state = state_of(&payload);

    let payload = parse(&formwalk_host::jump(CONTACT_FORM, &state, 1));
    assert_eq!(payload["outcome"]["kind"], "moved");
    assert_eq!(payload["state"]["position"], 1);
}

#[test]
fn malformed_documents_come_back_as_error_payloads() {
    let value: Value = serde_json::from_str(&formwalk_host::start("{ not json")).unwrap();
    assert!(value["error"].as_str().is_some());

    let duplicate = r#"{
        "id": "dup", "title": "Dup",
        "fields": [
            { "id": "a", "type": "short-text", "label": "A" },
            { "id": "a", "type": "short-text", "label": "A again" }
        ]
    }"#;
    let value: Value = serde_json::from_str(&formwalk_host::start(duplicate)).unwrap();
    assert!(value["error"].as_str().unwrap().contains("duplicate field id"));
}

#[test]
fn stateless_validation_and_schema() {
    let report: Value = serde_json::from_str(&formwalk_host::validate_answers(
        CONTACT_FORM,
        r#"{ "name": "Jo", "email": "a@b.com", "stray": 1 }"#,
    ))
    .unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["unknownFields"], json!(["stray"]));

    let schema: Value =
        serde_json::from_str(&formwalk_host::answers_schema(CONTACT_FORM, "{}")).unwrap();
    assert!(schema["properties"]["email"].is_object());
    assert_eq!(schema["required"], json!(["name", "email"]));

    let summary: Value = serde_json::from_str(&formwalk_host::describe(CONTACT_FORM)).unwrap();
    assert_eq!(summary["mode"], "flat");
    assert_eq!(summary["fieldCount"], 2);
}
