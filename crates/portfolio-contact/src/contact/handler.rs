use std::sync::Arc;

use serde_json::Value;

use super::domain::{ContactSubmission, StoredContact};
use super::notify::{MailTransport, NotificationDispatcher, NotificationReport};
use super::store::{ContactStore, StoreError};
use super::validation::{validate_submission, ValidationError};
use crate::config::DetailLevel;

/// Terminal failure of a submission. Notification problems are never represented here.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// A stored submission together with what happened to its notifications.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub contact: StoredContact,
    pub notification: NotificationReport,
}

impl SubmissionOutcome {
    pub fn email_sent(&self) -> bool {
        self.notification.email_sent()
    }

    pub fn email_error(&self) -> Option<String> {
        self.notification.error_message()
    }
}

/// Lifecycle points reported to a [`SubmissionObserver`].
#[derive(Debug)]
pub enum SubmissionEvent<'a> {
    Rejected(&'a ValidationError),
    Validated(&'a ContactSubmission),
    Stored(&'a StoredContact),
    StorageFailed(&'a StoreError),
    Notified {
        contact: &'a StoredContact,
        report: &'a NotificationReport,
    },
}

/// Hook for logging or metrics around the pipeline.
pub trait SubmissionObserver: Send + Sync {
    fn observe(&self, event: &SubmissionEvent<'_>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SubmissionObserver for NoopObserver {
    fn observe(&self, _event: &SubmissionEvent<'_>) {}
}

/// Emits pipeline events through `tracing` at the configured detail level.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    detail: DetailLevel,
}

impl TracingObserver {
    pub fn new(detail: DetailLevel) -> Self {
        Self { detail }
    }
}

impl SubmissionObserver for TracingObserver {
    fn observe(&self, event: &SubmissionEvent<'_>) {
        match (event, self.detail) {
            (SubmissionEvent::StorageFailed(err), _) => {
                tracing::error!(error = %err, "contact submission could not be stored");
            }
            (_, DetailLevel::Quiet) => {}
            (SubmissionEvent::Rejected(err), _) => {
                tracing::info!(fields = ?err.fields(), "contact submission rejected");
            }
            (SubmissionEvent::Stored(contact), _) => {
                tracing::info!(contact_id = %contact.id, "contact submission stored");
            }
            (SubmissionEvent::Notified { contact, report }, DetailLevel::Summary) => {
                if report.email_sent() {
                    tracing::info!(contact_id = %contact.id, "contact notifications sent");
                } else {
                    tracing::warn!(
                        contact_id = %contact.id,
                        reason = %report.error_message().unwrap_or_default(),
                        "contact notifications degraded"
                    );
                }
            }
            (SubmissionEvent::Notified { contact, report }, _) => {
                tracing::info!(
                    contact_id = %contact.id,
                    email_sent = report.email_sent(),
                    owner_alert = ?report.owner_alert,
                    acknowledgement = ?report.acknowledgement,
                    error = ?report.error,
                    "contact notification report"
                );
            }
            (SubmissionEvent::Validated(submission), DetailLevel::Verbose) => {
                tracing::debug!(
                    email = %submission.email,
                    subject = %submission.subject,
                    "contact submission validated"
                );
            }
            (SubmissionEvent::Validated(_), _) => {}
        }
    }
}

/// Runs validate, persist, and notify for one submission.
pub struct SubmissionHandler<S, T: ?Sized> {
    store: Arc<S>,
    dispatcher: NotificationDispatcher<T>,
    observer: Arc<dyn SubmissionObserver>,
}

impl<S, T> SubmissionHandler<S, T>
where
    S: ContactStore + 'static,
    T: MailTransport + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: NotificationDispatcher<T>) -> Self {
        Self::with_observer(store, dispatcher, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        store: Arc<S>,
        dispatcher: NotificationDispatcher<T>,
        observer: Arc<dyn SubmissionObserver>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            observer,
        }
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher<T> {
        &self.dispatcher
    }

    /// Validates and stores the payload, then attempts notification.
    ///
    /// Only validation and storage failures are returned as errors; a stored submission
    /// is always `Ok` whatever the mail outcome.
    pub async fn submit(&self, payload: &Value) -> Result<SubmissionOutcome, SubmissionError> {
        let submission = validate_submission(payload).map_err(|err| {
            self.observer.observe(&SubmissionEvent::Rejected(&err));
            err
        })?;
        self.observer.observe(&SubmissionEvent::Validated(&submission));

        let contact = self.store.create(submission).map_err(|err| {
            self.observer.observe(&SubmissionEvent::StorageFailed(&err));
            err
        })?;
        self.observer.observe(&SubmissionEvent::Stored(&contact));

        let notification = self.dispatcher.notify(&contact.submission()).await;
        self.observer.observe(&SubmissionEvent::Notified {
            contact: &contact,
            report: &notification,
        });

        Ok(SubmissionOutcome {
            contact,
            notification,
        })
    }

    pub fn contacts(&self) -> Result<Vec<StoredContact>, StoreError> {
        self.store.list().map_err(|err| {
            self.observer.observe(&SubmissionEvent::StorageFailed(&err));
            err
        })
    }
}
