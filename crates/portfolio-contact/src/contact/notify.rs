//! Best-effort owner alerts and sender acknowledgements.
//!
//! [`NotificationDispatcher::notify`] never returns an error: every failure, including a
//! missing configuration, is folded into the returned [`NotificationReport`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::ContactSubmission;
use crate::config::MailSettings;

/// A fully rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_body: String,
}

/// Outbound mail seam. Implemented by the SMTP relay adapter and by test fakes.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Opens and authenticates a session without sending anything.
    async fn verify(&self) -> Result<(), NotificationError>;
    async fn send(&self, mail: OutgoingMail) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("Email credentials not configured")]
    NotConfigured,
    #[error("mail transport setup failed: {0}")]
    Transport(String),
    #[error("mail session verification failed: {0}")]
    Verification(String),
    #[error("invalid mail address '{address}': {reason}")]
    Address { address: String, reason: String },
    #[error("mail relay rejected message: {0}")]
    Delivery(String),
    #[error("failed to send {kind}: {reason}")]
    Send { kind: MailKind, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    OwnerAlert,
    Acknowledgement,
    ConfigurationTest,
}

impl std::fmt::Display for MailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MailKind::OwnerAlert => "owner alert",
            MailKind::Acknowledgement => "sender acknowledgement",
            MailKind::ConfigurationTest => "configuration test",
        };
        f.write_str(label)
    }
}

/// Per-message delivery state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    Failed(String),
    Skipped,
}

impl DeliveryStatus {
    fn from_result(result: Result<(), NotificationError>) -> (Self, Option<NotificationError>) {
        match result {
            Ok(()) => (Self::Sent, None),
            Err(err) => (Self::Failed(err.to_string()), Some(err)),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Outcome of one dispatch attempt. `email_sent` only when both messages went out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationReport {
    pub owner_alert: DeliveryStatus,
    pub acknowledgement: DeliveryStatus,
    pub error: Option<NotificationError>,
}

impl NotificationReport {
    fn skipped(error: NotificationError) -> Self {
        Self {
            owner_alert: DeliveryStatus::Skipped,
            acknowledgement: DeliveryStatus::Skipped,
            error: Some(error),
        }
    }

    pub fn email_sent(&self) -> bool {
        self.error.is_none() && self.owner_alert.is_sent() && self.acknowledgement.is_sent()
    }

    /// Human-readable reason for a degraded dispatch.
    pub fn error_message(&self) -> Option<String> {
        if self.email_sent() {
            return None;
        }
        Some(
            self.error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "Email sending failed".to_string()),
        )
    }
}

/// Result of the owner-facing configuration self-test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailSelfTest {
    NotConfigured,
    Delivered,
    Failed(NotificationError),
}

/// Sends owner alerts and sender acknowledgements through an injected transport.
pub struct NotificationDispatcher<T: ?Sized> {
    settings: MailSettings,
    transport: Arc<T>,
}

impl<T: ?Sized> Clone for NotificationDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> NotificationDispatcher<T>
where
    T: MailTransport + ?Sized,
{
    pub fn new(settings: MailSettings, transport: Arc<T>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Attempts both notifications for a stored submission.
    ///
    /// Both sends are attempted even when the first fails; the first failure becomes the
    /// report's error.
    pub async fn notify(&self, submission: &ContactSubmission) -> NotificationReport {
        let (sender, owner) = match self.ready_addresses() {
            Ok(addresses) => addresses,
            Err(err) => return NotificationReport::skipped(err),
        };

        if let Err(err) = self.transport.verify().await {
            return NotificationReport::skipped(err);
        }

        let alert = render_owner_alert(&sender, &owner, submission);
        let acknowledgement =
            render_acknowledgement(&sender, submission, &self.settings.signature);

        let (owner_alert, owner_error) = DeliveryStatus::from_result(
            self.transport
                .send(alert)
                .await
                .map_err(|err| tag_send_error(err, MailKind::OwnerAlert)),
        );
        let (acknowledgement, ack_error) = DeliveryStatus::from_result(
            self.transport
                .send(acknowledgement)
                .await
                .map_err(|err| tag_send_error(err, MailKind::Acknowledgement)),
        );

        NotificationReport {
            owner_alert,
            acknowledgement,
            error: owner_error.or(ack_error),
        }
    }

    /// Verifies the session and mails a timestamped test message to the owner.
    pub async fn send_test(&self, now: DateTime<Utc>) -> MailSelfTest {
        let (sender, owner) = match self.ready_addresses() {
            Ok(addresses) => addresses,
            Err(NotificationError::NotConfigured) => return MailSelfTest::NotConfigured,
            Err(err) => return MailSelfTest::Failed(err),
        };

        if let Err(err) = self.transport.verify().await {
            return MailSelfTest::Failed(err);
        }

        let mail = render_test_message(&sender, &owner, now);
        match self.transport.send(mail).await {
            Ok(()) => MailSelfTest::Delivered,
            Err(err) => MailSelfTest::Failed(tag_send_error(err, MailKind::ConfigurationTest)),
        }
    }

    fn ready_addresses(&self) -> Result<(String, String), NotificationError> {
        let (sender, _) = self
            .settings
            .credentials()
            .ok_or(NotificationError::NotConfigured)?;
        let owner = self.settings.owner_recipient().unwrap_or(sender);
        Ok((sender.to_string(), owner.to_string()))
    }
}

fn tag_send_error(err: NotificationError, kind: MailKind) -> NotificationError {
    match err {
        NotificationError::Delivery(reason) => NotificationError::Send { kind, reason },
        other => other,
    }
}

/// Escapes text for inclusion in an HTML body and turns newlines into `<br>`.
pub fn html_paragraph(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' => {}
            '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    out
}

pub fn render_owner_alert(
    sender: &str,
    owner: &str,
    submission: &ContactSubmission,
) -> OutgoingMail {
    let html_body = format!(
        "<h2>New Contact Form Submission</h2>\n\
         <p><strong>Name:</strong> {name}</p>\n\
         <p><strong>Email:</strong> {email}</p>\n\
         <p><strong>Subject:</strong> {subject}</p>\n\
         <p><strong>Message:</strong></p>\n\
         <p>{message}</p>\n",
        name = html_paragraph(&submission.name),
        email = html_paragraph(&submission.email),
        subject = html_paragraph(&submission.subject),
        message = html_paragraph(&submission.message),
    );

    OutgoingMail {
        from: sender.to_string(),
        to: owner.to_string(),
        reply_to: Some(submission.email.clone()),
        subject: format!("New Contact Form Submission: {}", submission.subject),
        html_body,
    }
}

pub fn render_acknowledgement(
    sender: &str,
    submission: &ContactSubmission,
    signature: &str,
) -> OutgoingMail {
    let html_body = format!(
        "<h2>Thank you for your message!</h2>\n\
         <p>Hi {name},</p>\n\
         <p>Thank you for reaching out. I have received your message and will get back to you as soon as possible.</p>\n\
         <p><strong>Your message:</strong></p>\n\
         <p>{message}</p>\n\
         <br>\n\
         <p>Best regards,</p>\n\
         <p>{signature}</p>\n",
        name = html_paragraph(&submission.name),
        message = html_paragraph(&submission.message),
        signature = html_paragraph(signature),
    );

    OutgoingMail {
        from: sender.to_string(),
        to: submission.email.clone(),
        reply_to: None,
        subject: format!("Thank you for contacting {signature}"),
        html_body,
    }
}

pub fn render_test_message(sender: &str, owner: &str, now: DateTime<Utc>) -> OutgoingMail {
    let html_body = format!(
        "<h2>Email Configuration Test</h2>\n\
         <p>This is a test email to verify that your email configuration is working correctly.</p>\n\
         <p>If you receive this email, your contact form emails should work properly.</p>\n\
         <p>Timestamp: {}</p>\n",
        now.to_rfc3339()
    );

    OutgoingMail {
        from: sender.to_string(),
        to: owner.to_string(),
        reply_to: None,
        subject: "Email Configuration Test".to_string(),
        html_body,
    }
}
