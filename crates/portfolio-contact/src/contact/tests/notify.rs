use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::common::*;
use crate::config::MailSettings;
use crate::contact::notify::{
    html_paragraph, DeliveryStatus, MailKind, MailSelfTest, NotificationError,
};

#[tokio::test]
async fn unconfigured_dispatcher_short_circuits() {
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = dispatcher(MailSettings::unconfigured(), transport.clone());

    let report = dispatcher.notify(&submission()).await;

    assert!(!report.email_sent());
    assert_eq!(report.error, Some(NotificationError::NotConfigured));
    assert_eq!(
        report.error_message().as_deref(),
        Some("Email credentials not configured")
    );
    assert_eq!(report.owner_alert, DeliveryStatus::Skipped);
    assert_eq!(transport.verify_calls(), 0);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn identity_without_secret_counts_as_unconfigured() {
    let transport = Arc::new(RecordingTransport::default());
    let mut settings = MailSettings::unconfigured();
    settings.username = Some(OWNER.to_string());
    let dispatcher = dispatcher(settings, transport.clone());

    let report = dispatcher.notify(&submission()).await;

    assert_eq!(report.error, Some(NotificationError::NotConfigured));
    assert_eq!(transport.verify_calls(), 0);
}

#[tokio::test]
async fn verification_failure_skips_both_sends() {
    let transport = Arc::new(RecordingTransport::failing_verify("535 bad credentials"));
    let dispatcher = dispatcher(configured_settings(), transport.clone());

    let report = dispatcher.notify(&submission()).await;

    assert!(!report.email_sent());
    assert!(report
        .error_message()
        .expect("reason present")
        .contains("535 bad credentials"));
    assert_eq!(report.acknowledgement, DeliveryStatus::Skipped);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn sends_owner_alert_then_acknowledgement() {
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = dispatcher(configured_settings(), transport.clone());

    let mut visitor = submission();
    visitor.message = "Line one\nLine <two>".to_string();
    let report = dispatcher.notify(&visitor).await;

    assert!(report.email_sent());
    assert_eq!(report.error_message(), None);

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);

    let alert = &sent[0];
    assert_eq!(alert.from, OWNER);
    assert_eq!(alert.to, OWNER);
    assert_eq!(alert.reply_to.as_deref(), Some("ana@x.com"));
    assert_eq!(alert.subject, "New Contact Form Submission: Hi");
    assert!(alert.html_body.contains("<strong>Name:</strong> Ana"));
    assert!(alert.html_body.contains("<strong>Email:</strong> ana@x.com"));
    assert!(alert.html_body.contains("Line one<br>Line &lt;two&gt;"));

    let ack = &sent[1];
    assert_eq!(ack.to, "ana@x.com");
    assert_eq!(ack.subject, "Thank you for contacting Portfolio Owner");
    assert!(ack.html_body.contains("Hi Ana,"));
    assert!(ack.html_body.contains("Line one<br>Line &lt;two&gt;"));
}

#[tokio::test]
async fn owner_alert_goes_to_configured_recipient() {
    let transport = Arc::new(RecordingTransport::default());
    let mut settings = configured_settings();
    settings.owner_address = Some("inbox@example.org".to_string());
    let dispatcher = dispatcher(settings, transport.clone());

    dispatcher.notify(&submission()).await;

    let sent = transport.sent();
    assert_eq!(sent[0].to, "inbox@example.org");
    assert_eq!(sent[0].from, OWNER);
}

#[tokio::test]
async fn failed_acknowledgement_marks_partial_delivery() {
    let transport = Arc::new(RecordingTransport::rejecting("ana@x.com"));
    let dispatcher = dispatcher(configured_settings(), transport.clone());

    let report = dispatcher.notify(&submission()).await;

    assert!(!report.email_sent());
    assert_eq!(report.owner_alert, DeliveryStatus::Sent);
    assert!(matches!(report.acknowledgement, DeliveryStatus::Failed(_)));
    assert!(matches!(
        report.error,
        Some(NotificationError::Send {
            kind: MailKind::Acknowledgement,
            ..
        })
    ));
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn first_failure_wins_when_owner_alert_fails() {
    let transport = Arc::new(RecordingTransport::rejecting(OWNER));
    let dispatcher = dispatcher(configured_settings(), transport.clone());

    let report = dispatcher.notify(&submission()).await;

    assert!(matches!(
        report.error,
        Some(NotificationError::Send {
            kind: MailKind::OwnerAlert,
            ..
        })
    ));
    assert_eq!(report.acknowledgement, DeliveryStatus::Sent);
    assert_eq!(transport.sent()[0].to, "ana@x.com");
}

#[tokio::test]
async fn self_test_reports_missing_configuration() {
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = dispatcher(MailSettings::unconfigured(), transport.clone());

    assert_eq!(
        dispatcher.send_test(Utc::now()).await,
        MailSelfTest::NotConfigured
    );
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn self_test_mails_owner_with_timestamp() {
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = dispatcher(configured_settings(), transport.clone());
    let now = Utc
        .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp");

    assert_eq!(dispatcher.send_test(now).await, MailSelfTest::Delivered);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, OWNER);
    assert_eq!(sent[0].subject, "Email Configuration Test");
    assert!(sent[0].html_body.contains("2025-06-01T12:00:00+00:00"));
}

#[tokio::test]
async fn self_test_surfaces_send_failure() {
    let transport = Arc::new(RecordingTransport::rejecting(OWNER));
    let dispatcher = dispatcher(configured_settings(), transport);

    match dispatcher.send_test(Utc::now()).await {
        MailSelfTest::Failed(NotificationError::Send { kind, reason }) => {
            assert_eq!(kind, MailKind::ConfigurationTest);
            assert!(reason.contains("550"));
        }
        other => panic!("expected send failure, got {other:?}"),
    }
}

#[test]
fn html_paragraph_escapes_markup_and_breaks_lines() {
    assert_eq!(
        html_paragraph("a & b\r\n<script>'x'</script>"),
        "a &amp; b<br>&lt;script&gt;&#39;x&#39;&lt;/script&gt;"
    );
}
