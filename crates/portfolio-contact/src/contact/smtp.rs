use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::notify::{MailTransport, NotificationError, OutgoingMail};
use crate::config::MailSettings;

/// STARTTLS relay adapter backed by lettre.
///
/// Building the transport does not open a connection; the first network round trip
/// happens in [`MailTransport::verify`].
#[derive(Clone)]
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn from_settings(settings: &MailSettings) -> Result<Self, NotificationError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            .map_err(|err| NotificationError::Transport(err.to_string()))?
            .port(settings.smtp_port);

        if let Some((user, pass)) = settings.credentials() {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn verify(&self) -> Result<(), NotificationError> {
        match self.inner.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotificationError::Verification(
                "relay did not accept the session".to_string(),
            )),
            Err(err) => Err(NotificationError::Verification(err.to_string())),
        }
    }

    async fn send(&self, mail: OutgoingMail) -> Result<(), NotificationError> {
        let message = build_message(mail)?;
        self.inner
            .send(message)
            .await
            .map(|_| ())
            .map_err(|err| NotificationError::Delivery(err.to_string()))
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address.parse().map_err(|err: lettre::address::AddressError| NotificationError::Address {
        address: address.to_string(),
        reason: err.to_string(),
    })
}

fn build_message(mail: OutgoingMail) -> Result<Message, NotificationError> {
    let mut builder = Message::builder()
        .from(mailbox(&mail.from)?)
        .to(mailbox(&mail.to)?)
        .subject(mail.subject)
        .header(ContentType::TEXT_HTML);

    // Reply-To carries the visitor's address, which only passed the loose form check.
    if let Some(reply_to) = mail.reply_to.as_deref() {
        match mailbox(reply_to) {
            Ok(address) => builder = builder.reply_to(address),
            Err(err) => tracing::debug!(error = %err, "omitting Reply-To header"),
        }
    }

    builder
        .body(mail.html_body)
        .map_err(|err| NotificationError::Delivery(err.to_string()))
}
