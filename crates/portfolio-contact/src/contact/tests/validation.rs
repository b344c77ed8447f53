use serde_json::json;

use super::common::*;
use crate::contact::validation::{validate_submission, FieldErrorCode};

#[test]
fn accepts_well_formed_payload() {
    let validated = validate_submission(&payload()).expect("payload is valid");
    assert_eq!(validated, submission());
}

#[test]
fn reports_every_missing_field_at_once() {
    let err = validate_submission(&json!({ "email": "ana@x.com" })).expect_err("fields missing");
    assert_eq!(err.fields(), vec!["name", "subject", "message"]);
    assert!(err
        .errors()
        .iter()
        .all(|error| error.code == FieldErrorCode::Required));
}

#[test]
fn empty_object_lists_all_four_fields() {
    let err = validate_submission(&json!({})).expect_err("nothing supplied");
    assert_eq!(err.fields(), vec!["name", "email", "subject", "message"]);
}

#[test]
fn non_string_values_are_type_errors() {
    let err = validate_submission(&json!({
        "name": 42,
        "email": "ana@x.com",
        "subject": ["Hi"],
        "message": "Hello",
    }))
    .expect_err("wrong types");
    assert_eq!(err.fields(), vec!["name", "subject"]);
    assert!(err
        .errors()
        .iter()
        .all(|error| error.code == FieldErrorCode::InvalidType));
}

#[test]
fn presence_failures_stop_before_emptiness_checks() {
    let err = validate_submission(&json!({
        "name": "",
        "email": "ana@x.com",
        "subject": "Hi",
    }))
    .expect_err("message missing");
    assert_eq!(err.fields(), vec!["message"]);
}

#[test]
fn blank_name_is_rejected_after_trimming() {
    let mut input = payload();
    input["name"] = json!("   ");
    let err = validate_submission(&input).expect_err("blank name");
    assert_eq!(err.fields(), vec!["name"]);
    assert_eq!(err.errors()[0].code, FieldErrorCode::Empty);
}

#[test]
fn emptiness_failures_are_reported_together() {
    let err = validate_submission(&json!({
        "name": "",
        "email": "not-an-email",
        "subject": "",
        "message": "\n\t",
    }))
    .expect_err("blank fields");
    assert_eq!(err.fields(), vec!["name", "subject", "message"]);
}

#[test]
fn email_without_at_or_dot_is_rejected() {
    for email in ["ana.x.com", "ana@xcom", "ana@", "ana@x."] {
        let mut input = payload();
        input["email"] = json!(email);
        let err = validate_submission(&input).expect_err("bad email");
        assert_eq!(err.fields(), vec!["email"], "{email}");
        assert_eq!(err.errors()[0].code, FieldErrorCode::InvalidEmail);
    }
}

#[test]
fn minimal_email_shape_is_accepted() {
    let mut input = payload();
    input["email"] = json!("a@b.c");
    let submission = validate_submission(&input).expect("a@b.c is valid");
    assert_eq!(submission.email, "a@b.c");
}

#[test]
fn trims_edges_but_preserves_interior_text() {
    let submission = validate_submission(&json!({
        "name": "  Ana María ",
        "email": " Ana@X.com ",
        "subject": "Hi  there",
        "message": "Line one\n\nLine  two\n",
    }))
    .expect("valid after trimming");

    assert_eq!(submission.name, "Ana María");
    assert_eq!(submission.email, "Ana@X.com");
    assert_eq!(submission.subject, "Hi  there");
    assert_eq!(submission.message, "Line one\n\nLine  two");
}

#[test]
fn non_object_body_is_rejected() {
    let err = validate_submission(&json!(["Ana"])).expect_err("array body");
    assert_eq!(err.fields(), vec!["body"]);
    assert_eq!(err.errors()[0].code, FieldErrorCode::InvalidBody);
}
