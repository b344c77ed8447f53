//! Contact-form submission pipeline for a personal portfolio site.
//!
//! Submissions are validated, persisted through a [`contact::ContactStore`], and then
//! handed to a best-effort [`contact::NotificationDispatcher`] whose failures never fail
//! the visitor-facing request.

pub mod config;
pub mod contact;
pub mod error;
pub mod telemetry;
