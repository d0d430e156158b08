//! HTTP transport backed by `reqwest`.

use crate::transport::{RequestPayload, Transport, TransportResponse};
use altar_core::{ClassifiedError, RawFailure};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

/// Errors building the HTTP transport
#[derive(Debug, thiserror::Error)]
pub enum HttpSetupError {
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// POSTs payloads to `<base_url><path>`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport for `base_url` (`http` or `https`)
    pub fn new(base_url: &str) -> Result<Self, HttpSetupError> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| HttpSetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpSetupError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("altar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn raw_failure(err: &reqwest::Error) -> RawFailure {
    if err.is_timeout() {
        return RawFailure::Classified(ClassifiedError::timeout());
    }
    if err.is_connect() || err.is_request() {
        return RawFailure::Message(format!("connection failed: {err}"));
    }
    RawFailure::Message(err.to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, path: &str, payload: RequestPayload) -> Result<TransportResponse, RawFailure> {
        let request = self.client.post(self.url(path));
        let request = match payload {
            RequestPayload::Photo {
                file_name,
                bytes,
                mime_type,
            } => {
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(mime_type)
                    .map_err(|e| RawFailure::Message(e.to_string()))?;
                request.multipart(Form::new().part("file", part))
            }
            RequestPayload::Json(value) => request.json(&value),
        };

        let response = request.send().await.map_err(|e| raw_failure(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| raw_failure(&e))?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_and_path() {
        let transport = ReqwestTransport::new("https://altar.example/").unwrap();
        assert_eq!(
            transport.url("/api/upload-photo"),
            "https://altar.example/api/upload-photo"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            ReqwestTransport::new("ftp://altar.example"),
            Err(HttpSetupError::InvalidBaseUrl { .. })
        ));
        assert!(ReqwestTransport::new("not a url").is_err());
    }
}
