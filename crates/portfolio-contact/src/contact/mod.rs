//! Contact-form intake: validation, storage, and best-effort email notification.
//!
//! [`SubmissionHandler`] drives a payload through [`validate_submission`], a
//! [`ContactStore`], and a [`NotificationDispatcher`]. Only validation and storage
//! failures fail a request; mail problems come back as data on the outcome.

pub mod domain;
pub mod handler;
pub mod notify;
pub mod router;
pub mod smtp;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{ContactId, ContactSubmission, StoredContact};
pub use handler::{
    NoopObserver, SubmissionError, SubmissionEvent, SubmissionHandler, SubmissionObserver,
    SubmissionOutcome, TracingObserver,
};
pub use notify::{
    DeliveryStatus, MailKind, MailSelfTest, MailTransport, NotificationDispatcher,
    NotificationError, NotificationReport, OutgoingMail,
};
pub use router::{contact_router, SubmissionAccepted};
pub use smtp::SmtpMailTransport;
pub use store::{ContactStore, CsvContactStore, InMemoryContactStore, StoreError};
pub use validation::{validate_submission, FieldError, FieldErrorCode, ValidationError};
