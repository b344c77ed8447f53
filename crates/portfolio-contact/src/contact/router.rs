use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use super::domain::StoredContact;
use super::handler::{SubmissionError, SubmissionHandler, SubmissionOutcome};
use super::notify::{MailSelfTest, MailTransport};
use super::store::ContactStore;
use super::validation::ValidationError;

const SENT_MESSAGE: &str =
    "Message sent successfully! You will receive a confirmation email shortly.";
const DEGRADED_MESSAGE: &str =
    "Message received! The confirmation email could not be sent, but your message has been saved.";

/// Router builder exposing the contact endpoints.
pub fn contact_router<S, T>(handler: Arc<SubmissionHandler<S, T>>) -> Router
where
    S: ContactStore + 'static,
    T: MailTransport + ?Sized + 'static,
{
    Router::new()
        .route("/api/contact", post(submit_handler::<S, T>))
        .route("/api/contacts", get(list_handler::<S, T>))
        .route("/api/test-email", get(test_email_handler::<S, T>))
        .with_state(handler)
}

/// Body returned for every stored submission, degraded or not.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAccepted {
    pub success: bool,
    pub email_sent: bool,
    pub message: &'static str,
    pub contact: StoredContact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl From<SubmissionOutcome> for SubmissionAccepted {
    fn from(outcome: SubmissionOutcome) -> Self {
        let email_sent = outcome.email_sent();
        let email_error = outcome.email_error();
        Self {
            success: true,
            email_sent,
            message: if email_sent {
                SENT_MESSAGE
            } else {
                DEGRADED_MESSAGE
            },
            contact: outcome.contact,
            email_error,
        }
    }
}

fn invalid_form_response(error: ValidationError) -> Response {
    let payload = json!({
        "success": false,
        "message": "Invalid form data",
        "errors": error.into_errors(),
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn internal_error_response() -> Response {
    let payload = json!({
        "success": false,
        "message": "Internal server error",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

pub(crate) async fn submit_handler<S, T>(
    State(handler): State<Arc<SubmissionHandler<S, T>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    S: ContactStore + 'static,
    T: MailTransport + ?Sized + 'static,
{
    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            return invalid_form_response(ValidationError::malformed_body(rejection.body_text()))
        }
    };

    match handler.submit(&payload).await {
        Ok(outcome) => {
            (StatusCode::OK, Json(SubmissionAccepted::from(outcome))).into_response()
        }
        Err(SubmissionError::Validation(error)) => invalid_form_response(error),
        Err(SubmissionError::Storage(_)) => internal_error_response(),
    }
}

pub(crate) async fn list_handler<S, T>(
    State(handler): State<Arc<SubmissionHandler<S, T>>>,
) -> Response
where
    S: ContactStore + 'static,
    T: MailTransport + ?Sized + 'static,
{
    match handler.contacts() {
        Ok(contacts) => (StatusCode::OK, Json(contacts)).into_response(),
        Err(_) => internal_error_response(),
    }
}

pub(crate) async fn test_email_handler<S, T>(
    State(handler): State<Arc<SubmissionHandler<S, T>>>,
) -> Response
where
    S: ContactStore + 'static,
    T: MailTransport + ?Sized + 'static,
{
    let payload = match handler.dispatcher().send_test(Utc::now()).await {
        MailSelfTest::NotConfigured => json!({
            "success": false,
            "message": "Email credentials not configured",
            "configured": false,
        }),
        MailSelfTest::Delivered => json!({
            "success": true,
            "message": "Test email sent successfully! Check your inbox.",
            "configured": true,
        }),
        MailSelfTest::Failed(error) => json!({
            "success": false,
            "message": format!("Email test failed: {error}"),
            "configured": true,
            "error": error.to_string(),
        }),
    };

    (StatusCode::OK, Json(payload)).into_response()
}
