//! Local persistence errors
//!
//! Two layers:
//! - [`StorageError`]: what a key/value backend reports
//! - [`StoreError`]: what the local store surfaces, with a stable
//!   [`StoreErrorCode`] distinct from the remote taxonomy

use std::fmt;

/// Failures reported by a key/value backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Write would exceed the backend's capacity ceiling
    #[error("quota exceeded: {needed} bytes needed, limit {limit}")]
    QuotaExceeded { needed: u64, limit: u64 },

    /// Backend refused access
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Stored value is not readable text
    #[error("corrupt value under '{0}'")]
    Corrupt(String),

    /// Key cannot be represented by the backend
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable local-store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorCode {
    QuotaExceeded,
    AccessDenied,
    ParseError,
    Unknown,
}

impl StoreErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::ParseError => "PARSE_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local store failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn quota_exceeded() -> Self {
        Self::new(
            StoreErrorCode::QuotaExceeded,
            "Storage quota exceeded. Please delete some altars to free up space.",
        )
    }

    #[must_use]
    pub fn access_denied() -> Self {
        Self::new(
            StoreErrorCode::AccessDenied,
            "Access to local storage is denied. Please check your storage permissions.",
        )
    }

    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(
            StoreErrorCode::ParseError,
            "Failed to parse altar data from storage",
        )
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self::new(
            StoreErrorCode::Unknown,
            "An unexpected error occurred while accessing storage.",
        )
    }

    #[inline]
    #[must_use]
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::QuotaExceeded { .. } => Self::quota_exceeded(),
            StorageError::AccessDenied(_) => Self::access_denied(),
            StorageError::Corrupt(_) => Self::parse_error(),
            StorageError::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                Self::access_denied()
            }
            StorageError::InvalidKey(_) | StorageError::Io(_) => {
                tracing::debug!(error = %err, "unclassified storage failure");
                Self::unknown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn backend_errors_map_to_store_codes() {
        let quota = StoreError::from(StorageError::QuotaExceeded { needed: 10, limit: 5 });
        assert_eq!(quota.code(), StoreErrorCode::QuotaExceeded);

        let denied = StoreError::from(StorageError::Io(io::Error::from(io::ErrorKind::PermissionDenied)));
        assert_eq!(denied.code(), StoreErrorCode::AccessDenied);

        let corrupt = StoreError::from(StorageError::Corrupt("altar_app_altars".into()));
        assert_eq!(corrupt.code(), StoreErrorCode::ParseError);

        let other = StoreError::from(StorageError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)));
        assert_eq!(other.code(), StoreErrorCode::Unknown);
    }

    #[test]
    fn codes_render_as_wire_strings() {
        assert_eq!(StoreErrorCode::ParseError.to_string(), "PARSE_ERROR");
        assert_eq!(StoreError::parse_error().code().as_str(), "PARSE_ERROR");
    }
}
