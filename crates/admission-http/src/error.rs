//! HTTP status and transport error classification

use admission_core::BackendError;
use reqwest::StatusCode;
use serde::Deserialize;

/// Body code the API uses for a second submission
pub const DUPLICATE_CODE: &str = "duplicate_submission";

const MAX_MESSAGE_LEN: usize = 300;

/// Errors constructing the client
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Base URL is not an http(s) URL
    #[error("invalid base url: '{0}'")]
    InvalidBaseUrl(String),

    /// TLS or client setup failed
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    detail: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.message
            .or(self.detail)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Map a non-success response to a backend error
///
/// - 409 or body `code == "duplicate_submission"` → duplicate
/// - 400, 422 → validation, server message verbatim
/// - 404 → not found
/// - 5xx → network
/// - anything else → unknown
pub fn classify_response(status: StatusCode, body: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let duplicate = parsed.code.as_deref() == Some(DUPLICATE_CODE);
    let message = parsed
        .message()
        .unwrap_or_else(|| fallback_message(status, body));

    if duplicate || status == StatusCode::CONFLICT {
        return BackendError::duplicate(message);
    }

    match status.as_u16() {
        400 | 422 => BackendError::Validation(message),
        404 => BackendError::NotFound(message),
        500..=599 => BackendError::Network(format!("server returned {status}: {message}")),
        _ => BackendError::Unknown(format!("server returned {status}: {message}")),
    }
}

/// Map a transport failure
pub fn transport_error(error: &reqwest::Error) -> BackendError {
    if error.is_decode() {
        BackendError::Unknown(format!("malformed response: {error}"))
    } else {
        BackendError::Network(error.to_string())
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    body.chars().take(MAX_MESSAGE_LEN).collect()
}
