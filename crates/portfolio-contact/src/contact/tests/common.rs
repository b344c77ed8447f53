use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{json, Value};

use crate::config::MailSettings;
use crate::contact::domain::{ContactSubmission, StoredContact};
use crate::contact::handler::{SubmissionEvent, SubmissionHandler, SubmissionObserver};
use crate::contact::notify::{
    MailTransport, NotificationDispatcher, NotificationError, OutgoingMail,
};
use crate::contact::store::{ContactStore, InMemoryContactStore, StoreError};

pub(super) const OWNER: &str = "owner@example.com";

pub(super) fn payload() -> Value {
    json!({
        "name": "Ana",
        "email": "ana@x.com",
        "subject": "Hi",
        "message": "Hello",
    })
}

pub(super) fn submission() -> ContactSubmission {
    ContactSubmission {
        name: "Ana".to_string(),
        email: "ana@x.com".to_string(),
        subject: "Hi".to_string(),
        message: "Hello".to_string(),
    }
}

pub(super) fn configured_settings() -> MailSettings {
    MailSettings::unconfigured().with_credentials(OWNER, "app-password")
}

/// Transport fake that records every message and can be told to fail.
#[derive(Default)]
pub(super) struct RecordingTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    verify_calls: Mutex<usize>,
    verify_error: Option<String>,
    reject_recipient: Option<String>,
}

impl RecordingTransport {
    pub(super) fn failing_verify(reason: &str) -> Self {
        Self {
            verify_error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub(super) fn rejecting(recipient: &str) -> Self {
        Self {
            reject_recipient: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    pub(super) fn verify_calls(&self) -> usize {
        *self.verify_calls.lock().expect("verify mutex poisoned")
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn verify(&self) -> Result<(), NotificationError> {
        *self.verify_calls.lock().expect("verify mutex poisoned") += 1;
        match &self.verify_error {
            Some(reason) => Err(NotificationError::Verification(reason.clone())),
            None => Ok(()),
        }
    }

    async fn send(&self, mail: OutgoingMail) -> Result<(), NotificationError> {
        if self.reject_recipient.as_deref() == Some(mail.to.as_str()) {
            return Err(NotificationError::Delivery(format!(
                "550 mailbox unavailable: {}",
                mail.to
            )));
        }
        self.sent.lock().expect("sent mutex poisoned").push(mail);
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl ContactStore for UnavailableStore {
    fn create(&self, _submission: ContactSubmission) -> Result<StoredContact, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<StoredContact>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Observer that keeps a label per event for ordering assertions.
#[derive(Default)]
pub(super) struct EventLog {
    events: Mutex<Vec<&'static str>>,
}

impl EventLog {
    pub(super) fn labels(&self) -> Vec<&'static str> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl SubmissionObserver for EventLog {
    fn observe(&self, event: &SubmissionEvent<'_>) {
        let label = match event {
            SubmissionEvent::Rejected(_) => "rejected",
            SubmissionEvent::Validated(_) => "validated",
            SubmissionEvent::Stored(_) => "stored",
            SubmissionEvent::StorageFailed(_) => "storage_failed",
            SubmissionEvent::Notified { .. } => "notified",
        };
        self.events.lock().expect("event mutex poisoned").push(label);
    }
}

pub(super) fn dispatcher(
    settings: MailSettings,
    transport: Arc<RecordingTransport>,
) -> NotificationDispatcher<RecordingTransport> {
    NotificationDispatcher::new(settings, transport)
}

pub(super) fn build_handler(
    settings: MailSettings,
) -> (
    SubmissionHandler<InMemoryContactStore, RecordingTransport>,
    Arc<InMemoryContactStore>,
    Arc<RecordingTransport>,
) {
    let store = Arc::new(InMemoryContactStore::new());
    let transport = Arc::new(RecordingTransport::default());
    let handler = SubmissionHandler::new(store.clone(), dispatcher(settings, transport.clone()));
    (handler, store, transport)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
