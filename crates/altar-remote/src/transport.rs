//! Transport seam between the remote client and the wire.

use altar_core::RawFailure;
use async_trait::async_trait;

/// Body of a remote call
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    /// Multipart upload with a single `file` part
    Photo {
        file_name: String,
        bytes: Vec<u8>,
        mime_type: &'static str,
    },
    /// JSON document
    Json(serde_json::Value),
}

/// Raw response as received, before status or body inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    #[inline]
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a POST to an endpoint path.
///
/// Implementations report lower-level failures as [`RawFailure`]; the client
/// classifies them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, path: &str, payload: RequestPayload) -> Result<TransportResponse, RawFailure>;
}
