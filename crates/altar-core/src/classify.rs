//! Error classification
//!
//! [`classify`] is total: every [`RawFailure`] maps to exactly one
//! [`ClassifiedError`]. Precedence follows the variant order:
//! already-classified, offline, structured server body, network-like message,
//! anything else.

use crate::error::{ClassifiedError, ErrorCode};
use crate::messages;
use serde::Deserialize;

const NETWORK_KEYWORDS: [&str; 3] = ["network", "fetch", "connection"];

/// A failure as caught at the transport boundary, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// Already classified upstream; passed through unchanged
    Classified(ClassifiedError),
    /// Environment reported no network reachability
    Offline,
    /// Server answered with a non-success status
    Response { status: u16, body: String },
    /// Lower-level failure described only by its message
    Message(String),
    /// Failure with no usable detail
    Opaque,
}

impl From<ClassifiedError> for RawFailure {
    fn from(err: ClassifiedError) -> Self {
        Self::Classified(err)
    }
}

/// Structured error body returned by the remote endpoints
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Statuses worth retrying: server errors and rate limiting
#[inline]
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429
}

/// Classify a raw failure. Never panics, never re-raises.
#[must_use]
pub fn classify(raw: RawFailure) -> ClassifiedError {
    match raw {
        RawFailure::Classified(err) => err,
        RawFailure::Offline => ClassifiedError::no_connectivity(),
        RawFailure::Response { status, body } => classify_response(status, &body),
        RawFailure::Message(message) => classify_message(message),
        RawFailure::Opaque => ClassifiedError::unknown(messages::UNEXPECTED_ERROR),
    }
}

fn classify_response(status: u16, body: &str) -> ClassifiedError {
    let retryable = is_retryable_status(status);

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed
                .message
                .filter(|m| !m.is_empty())
                .or(parsed.error.filter(|e| !e.is_empty()))
                .unwrap_or_else(|| messages::GENERIC_SERVER_ERROR.to_string());
            let code = parsed
                .code
                .map_or(ErrorCode::UnknownError, |c| ErrorCode::parse(&c));
            ClassifiedError::new(message, code, Some(status), retryable)
        }
        Err(_) => ClassifiedError::new(
            messages::http_status(status),
            ErrorCode::UnknownError,
            Some(status),
            retryable,
        ),
    }
}

fn classify_message(message: String) -> ClassifiedError {
    let lowered = message.to_lowercase();
    if NETWORK_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return ClassifiedError::network();
    }
    if message.trim().is_empty() {
        return ClassifiedError::unknown(messages::UNEXPECTED_ERROR);
    }
    ClassifiedError::unknown(message)
}
