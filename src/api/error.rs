//! Normalized failures from the remote API.
//!
//! Every call through [`super::ApiClient`] fails with one [`ApiError`] carrying
//! an [`ErrorKind`] and a ready-to-display message, so call sites never inspect
//! response shapes themselves.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response was received (connect failure, timeout).
    Network,
    /// 401: bad credentials or a rejected token. Terminal for the credential.
    Unauthorized,
    /// 403: inactive or unverified account.
    Forbidden,
    /// 400/422: the API rejected the input, possibly per field.
    Validation,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            400 | 422 => Self::Validation,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::Network => "Unable to reach the server. Check your connection and try again.",
            Self::Unauthorized => "Your credentials were rejected. Please sign in again.",
            Self::Forbidden => "Your account is inactive or has not been verified yet.",
            Self::Validation => "Please review the highlighted fields.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    pub message: String,
    pub field_errors: Vec<FieldError>,
}

impl ApiError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Input rejected before it left the process.
    #[must_use]
    pub fn invalid_field(field: &str, message: &str) -> Self {
        Self {
            field_errors: vec![FieldError {
                field: field.to_string(),
                message: message.to_string(),
            }],
            ..Self::new(ErrorKind::Validation, message)
        }
    }

    /// Map a transport failure. Timeouts and connect errors are `Network`.
    #[must_use]
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::network("Request timed out. Please try again.");
        }
        if err.is_decode() {
            return Self::new(ErrorKind::Unknown, format!("Failed to decode response: {err}"));
        }
        if let Some(status) = err.status() {
            return Self::from_response(status.as_u16(), &[]);
        }
        Self::network(format!("Unable to reach the server: {err}"))
    }

    /// Build an error from a non-success status and its raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let kind = ErrorKind::from_status(status);
        let (message, field_errors) = extract_detail(body);
        Self {
            kind,
            status: Some(status),
            message: message.unwrap_or_else(|| kind.default_message().to_string()),
            field_errors,
        }
    }

    /// A success status whose body could not be understood.
    #[must_use]
    pub fn malformed(status: u16, detail: impl fmt::Display) -> Self {
        Self {
            status: Some(status),
            ..Self::new(ErrorKind::Unknown, format!("Unexpected response: {detail}"))
        }
    }

    /// Text safe to show the user. Network details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self.kind {
            ErrorKind::Network => self.kind.default_message(),
            _ if self.message.trim().is_empty() => self.kind.default_message(),
            _ => &self.message,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

/// Pull a message out of an error body. Shapes tried, in order: `detail` as a
/// string, `detail` as a list of `{loc, msg}`, `detail.message`, top-level
/// `message`. A body that is not JSON (a proxy's HTML error page) only
/// reaches the logs.
fn extract_detail(body: &[u8]) -> (Option<String>, Vec<FieldError>) {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        if let Some(text) = sanitize(&String::from_utf8_lossy(body)) {
            debug!(body = %text, "non-JSON error body");
        }
        return (None, Vec::new());
    };

    let mut field_errors = Vec::new();
    let detail_message = match value.get("detail") {
        Some(Value::String(detail)) => sanitize(detail),
        Some(Value::Array(items)) => {
            field_errors = items.iter().filter_map(field_error).collect();
            field_errors
                .first()
                .map(|error| error.message.clone())
                .or_else(|| items.first().and_then(Value::as_str).and_then(sanitize))
        }
        Some(Value::Object(detail)) => detail
            .get("message")
            .and_then(Value::as_str)
            .and_then(sanitize),
        _ => None,
    };

    let message = detail_message.or_else(|| {
        value
            .get("message")
            .and_then(Value::as_str)
            .and_then(sanitize)
    });

    (message, field_errors)
}

fn field_error(item: &Value) -> Option<FieldError> {
    let message = item.get("msg").and_then(Value::as_str)?;
    let field = match item.get("loc") {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(name) if name != "body" && name != "query" => Some(name.clone()),
                Value::Number(index) => Some(index.to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("."),
        Some(Value::String(name)) => name.clone(),
        _ => String::new(),
    };
    Some(FieldError {
        field,
        message: message.to_string(),
    })
}

fn sanitize(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_CHARS).collect())
    }
}
