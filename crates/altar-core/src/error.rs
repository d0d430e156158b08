//! Remote error taxonomy
//!
//! Every failure of a remote operation is surfaced as a [`ClassifiedError`]:
//! - a human-readable (localized) message
//! - a stable machine code ([`ErrorCode`])
//! - an optional HTTP status
//! - an explicit retryability flag consumed by the retry controller
//!
//! Classified errors are immutable once constructed; annotating one with an
//! attempt count produces a new value.

use crate::messages;
use std::fmt;

/// Stable, machine-readable remote error codes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Environment reports no network reachability
    NoConnectivity,
    /// Request did not complete within the timeout window
    Timeout,
    /// Response body was malformed or incomplete
    InvalidResponse,
    /// Request was missing required fields
    InvalidRequest,
    /// Food description outside 10..=500 characters
    InvalidDescriptionLength,
    /// Transport-level failure
    NetworkError,
    /// Anything the classifier could not place
    UnknownError,
    /// Code reported by the server that is not part of the known set
    Server(String),
}

impl ErrorCode {
    /// Wire representation of the code
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoConnectivity => "NO_CONNECTIVITY",
            Self::Timeout => "TIMEOUT",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidDescriptionLength => "INVALID_DESCRIPTION_LENGTH",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::Server(code) => code,
        }
    }

    /// Map a wire code onto the taxonomy; unknown codes are kept verbatim.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code {
            "NO_CONNECTIVITY" | "NO_INTERNET" => Self::NoConnectivity,
            "TIMEOUT" => Self::Timeout,
            "INVALID_RESPONSE" => Self::InvalidResponse,
            "INVALID_REQUEST" => Self::InvalidRequest,
            "INVALID_DESCRIPTION_LENGTH" => Self::InvalidDescriptionLength,
            "NETWORK_ERROR" => Self::NetworkError,
            "UNKNOWN_ERROR" | "" => Self::UnknownError,
            other => Self::Server(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote failure after classification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    message: String,
    code: ErrorCode,
    status: Option<u16>,
    retryable: bool,
}

impl ClassifiedError {
    /// Create a classified error
    #[inline]
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        code: ErrorCode,
        status: Option<u16>,
        retryable: bool,
    ) -> Self {
        Self {
            message: message.into(),
            code,
            status,
            retryable,
        }
    }

    #[must_use]
    pub fn no_connectivity() -> Self {
        Self::new(messages::NO_CONNECTIVITY, ErrorCode::NoConnectivity, Some(0), true)
    }

    #[must_use]
    pub fn timeout() -> Self {
        Self::new(messages::TIMEOUT, ErrorCode::Timeout, Some(408), true)
    }

    /// Body was not a JSON object
    #[must_use]
    pub fn invalid_response_format() -> Self {
        Self::new(messages::INVALID_RESPONSE_FORMAT, ErrorCode::InvalidResponse, None, false)
    }

    /// Body was an object but lacked a required field
    #[must_use]
    pub fn incomplete_response() -> Self {
        Self::new(messages::INCOMPLETE_RESPONSE, ErrorCode::InvalidResponse, None, false)
    }

    #[must_use]
    pub fn invalid_request() -> Self {
        Self::new(messages::INVALID_REQUEST, ErrorCode::InvalidRequest, Some(400), false)
    }

    #[must_use]
    pub fn invalid_description_length() -> Self {
        Self::new(
            messages::INVALID_DESCRIPTION_LENGTH,
            ErrorCode::InvalidDescriptionLength,
            Some(400),
            false,
        )
    }

    #[must_use]
    pub fn network() -> Self {
        Self::new(messages::NETWORK_ERROR, ErrorCode::NetworkError, None, true)
    }

    /// Unplaceable failure, never retried
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(message, ErrorCode::UnknownError, None, false)
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    #[must_use]
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Check if re-attempting the same operation may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Annotate the message with the total number of attempts made.
    ///
    /// Code, status and retryability are preserved. A single attempt leaves
    /// the message untouched.
    #[must_use]
    pub fn with_attempts(self, attempts: u32) -> Self {
        if attempts <= 1 {
            return self;
        }
        Self {
            message: format!("{}{}", self.message, messages::attempts_suffix(attempts)),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_408_and_retryable() {
        let err = ClassifiedError::timeout();
        assert_eq!(err.code(), &ErrorCode::Timeout);
        assert_eq!(err.status(), Some(408));
        assert!(err.is_retryable());
    }

    #[test]
    fn invalid_response_is_not_retryable() {
        assert!(!ClassifiedError::invalid_response_format().is_retryable());
        assert!(!ClassifiedError::incomplete_response().is_retryable());
    }

    #[test]
    fn with_attempts_appends_count_and_keeps_code() {
        let err = ClassifiedError::network().with_attempts(4);
        assert!(err.message().ends_with("(intentos: 4)"));
        assert_eq!(err.code(), &ErrorCode::NetworkError);
        assert!(err.is_retryable());
    }

    #[test]
    fn single_attempt_leaves_message_alone() {
        let err = ClassifiedError::timeout().with_attempts(1);
        assert_eq!(err.message(), messages::TIMEOUT);
    }

    #[test]
    fn error_code_parse_roundtrips_known_codes() {
        for code in [
            ErrorCode::NoConnectivity,
            ErrorCode::Timeout,
            ErrorCode::InvalidResponse,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidDescriptionLength,
            ErrorCode::NetworkError,
            ErrorCode::UnknownError,
        ] {
            assert_eq!(ErrorCode::parse(code.as_str()), code);
        }
        assert_eq!(
            ErrorCode::parse("RATE_LIMITED"),
            ErrorCode::Server("RATE_LIMITED".to_string())
        );
    }

    #[test]
    fn display_is_the_message() {
        let err = ClassifiedError::unknown("boom");
        assert_eq!(err.to_string(), "boom");
    }
}
