use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::domain::ContactSubmission;

const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "subject", "message"];
const NON_EMPTY_FIELDS: [&str; 3] = ["name", "subject", "message"];

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static pattern"))
}

/// Machine-readable reason attached to each rejected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    Required,
    InvalidType,
    Empty,
    InvalidEmail,
    InvalidBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: FieldErrorCode,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, code: FieldErrorCode) -> Self {
        let message = match code {
            FieldErrorCode::Required => format!("{field} is required"),
            FieldErrorCode::InvalidType => format!("{field} must be a string"),
            FieldErrorCode::Empty => format!("{field} must not be empty"),
            FieldErrorCode::InvalidEmail => format!("{field} must be a valid email address"),
            FieldErrorCode::InvalidBody => "request body must be a JSON object".to_string(),
        };

        Self {
            field: field.to_string(),
            code,
            message,
        }
    }
}

/// Rejection raised when a submission fails one rule class. Carries every field that
/// broke that class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid form data: {}", summarize(.errors))]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Used when the request body could not be read as a JSON object at all.
    pub fn malformed_body(detail: impl Into<String>) -> Self {
        let mut error = FieldError::new("body", FieldErrorCode::InvalidBody);
        let detail = detail.into();
        if !detail.is_empty() {
            error.message = format!("{}: {detail}", error.message);
        }
        Self {
            errors: vec![error],
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|error| error.field.as_str()).collect()
    }
}

fn summarize(errors: &[FieldError]) -> String {
    let details: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    details.join("; ")
}

/// Checks a raw JSON payload against the contact schema.
///
/// Rule classes run in order (presence and type, then non-emptiness, then email shape)
/// and the first class with any violation ends validation. Values come back trimmed.
pub fn validate_submission(input: &Value) -> Result<ContactSubmission, ValidationError> {
    let Some(object) = input.as_object() else {
        return Err(ValidationError::malformed_body(""));
    };

    let fields = required_strings(object)?;
    let [name, email, subject, message] = fields.map(str::trim);

    let empty: Vec<FieldError> = NON_EMPTY_FIELDS
        .iter()
        .zip([name, subject, message])
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| FieldError::new(field, FieldErrorCode::Empty))
        .collect();
    if !empty.is_empty() {
        return Err(ValidationError::new(empty));
    }

    if !is_valid_email(email) {
        return Err(ValidationError::new(vec![FieldError::new(
            "email",
            FieldErrorCode::InvalidEmail,
        )]));
    }

    Ok(ContactSubmission {
        name: name.to_string(),
        email: email.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
    })
}

pub fn is_valid_email(candidate: &str) -> bool {
    email_pattern().is_match(candidate)
}

fn required_strings(object: &Map<String, Value>) -> Result<[&str; 4], ValidationError> {
    let mut errors = Vec::new();
    let mut values = [""; 4];

    for (slot, field) in values.iter_mut().zip(REQUIRED_FIELDS) {
        match object.get(field) {
            None | Some(Value::Null) => {
                errors.push(FieldError::new(field, FieldErrorCode::Required))
            }
            Some(Value::String(text)) => *slot = text.as_str(),
            Some(_) => errors.push(FieldError::new(field, FieldErrorCode::InvalidType)),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(ValidationError::new(errors))
    }
}
