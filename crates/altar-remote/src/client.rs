//! Remote operation client
//!
//! `invoke` performs exactly one attempt:
//! 1. connectivity gate (synchronous, before any I/O)
//! 2. request raced against the configured timeout
//! 3. non-success statuses handed to the classifier
//! 4. body validated as a JSON object
//!
//! Retries belong to the caller (see [`altar_core::retry`]).

use crate::connectivity::{AlwaysOnline, Connectivity};
use crate::response::{parse_generate_response, parse_object, parse_upload_response};
use crate::service::AltarService;
use crate::transport::{RequestPayload, Transport};
use altar_core::validation::{self, ValidationError};
use altar_core::{
    classify, ApiConfig, ClassifiedError, GenerateAltarRequest, GenerateAltarResponse, ImageKind,
    PhotoUpload, RawFailure, RemoteOperation, UploadPhotoResponse,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Client for the upload and generation endpoints
#[derive(Debug)]
pub struct RemoteClient<T, C = AlwaysOnline> {
    transport: T,
    connectivity: C,
    timeout: Duration,
    upload_path: String,
    generate_path: String,
}

impl<T: Transport, C: Connectivity> RemoteClient<T, C> {
    /// Create a client using endpoint paths and timeout from `api`
    #[must_use]
    pub fn new(transport: T, connectivity: C, api: &ApiConfig) -> Self {
        Self {
            transport,
            connectivity,
            timeout: api.request_timeout(),
            upload_path: api.upload_path.clone(),
            generate_path: api.generate_path.clone(),
        }
    }

    /// With a different timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn path(&self, operation: RemoteOperation) -> &str {
        match operation {
            RemoteOperation::UploadPhoto => &self.upload_path,
            RemoteOperation::GenerateAltar => &self.generate_path,
        }
    }

    /// Perform one attempt of `operation` and return its JSON object body
    pub async fn invoke(
        &self,
        operation: RemoteOperation,
        payload: RequestPayload,
    ) -> Result<Map<String, Value>, ClassifiedError> {
        if !self.connectivity.is_online() {
            tracing::warn!(%operation, "no connectivity, skipping request");
            return Err(classify(RawFailure::Offline));
        }

        let path = self.path(operation);
        tracing::debug!(%operation, path, timeout_ms = saturating_millis(self.timeout), "sending request");

        let response = match tokio::time::timeout(self.timeout, self.transport.post(path, payload)).await {
            Err(_elapsed) => {
                tracing::warn!(%operation, "request timed out");
                return Err(ClassifiedError::timeout());
            }
            Ok(Err(raw)) => return Err(classify(raw)),
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            tracing::debug!(%operation, status = response.status, "non-success status");
            return Err(classify(RawFailure::Response {
                status: response.status,
                body: response.body,
            }));
        }

        parse_object(&response.body)
    }
}

fn check_generate_request(request: &GenerateAltarRequest) -> Result<(), ClassifiedError> {
    if request.photo_s3_key.is_empty() || request.food_description.trim().is_empty() {
        return Err(ClassifiedError::invalid_request());
    }
    match validation::validate_food_description(&request.food_description) {
        Ok(()) => Ok(()),
        Err(ValidationError::EmptyDescription) => Err(ClassifiedError::invalid_request()),
        Err(_) => Err(ClassifiedError::invalid_description_length()),
    }
}

#[async_trait]
impl<T: Transport, C: Connectivity> AltarService for RemoteClient<T, C> {
    async fn upload_photo(&self, photo: &PhotoUpload) -> Result<UploadPhotoResponse, ClassifiedError> {
        let mime_type = ImageKind::detect(&photo.bytes).map_or(FALLBACK_MIME, ImageKind::mime_type);
        let payload = RequestPayload::Photo {
            file_name: photo.file_name.clone(),
            bytes: photo.bytes.clone(),
            mime_type,
        };
        let body = self.invoke(RemoteOperation::UploadPhoto, payload).await?;
        parse_upload_response(&body)
    }

    async fn generate_altar(
        &self,
        request: &GenerateAltarRequest,
    ) -> Result<GenerateAltarResponse, ClassifiedError> {
        check_generate_request(request)?;
        let json = serde_json::to_value(request)
            .map_err(|e| classify(RawFailure::Message(e.to_string())))?;
        let body = self
            .invoke(RemoteOperation::GenerateAltar, RequestPayload::Json(json))
            .await?;
        parse_generate_response(&body)
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityFlag;
    use crate::transport::{MockTransport, TransportResponse};
    use altar_core::ErrorCode;
    use std::sync::Arc;

    fn jpeg() -> PhotoUpload {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.resize(64, 0);
        PhotoUpload::new("ofrenda.jpg", bytes)
    }

    fn generate_request() -> GenerateAltarRequest {
        GenerateAltarRequest {
            photo_s3_key: "k1".to_string(),
            food_description: "Pan de muerto y mole".to_string(),
        }
    }

    fn client(mock: MockTransport) -> RemoteClient<MockTransport> {
        RemoteClient::new(mock, AlwaysOnline, &ApiConfig::default())
    }

    struct StallingTransport;

    #[async_trait]
    impl Transport for StallingTransport {
        async fn post(&self, _path: &str, _payload: RequestPayload) -> Result<TransportResponse, RawFailure> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn upload_sends_multipart_with_detected_mime() {
        let mut mock = MockTransport::new();
        mock.expect_post()
            .withf(|path, payload| {
                path == "/api/upload-photo"
                    && matches!(payload, RequestPayload::Photo { mime_type, file_name, .. }
                        if *mime_type == "image/jpeg" && file_name == "ofrenda.jpg")
            })
            .times(1)
            .returning(|_, _| Ok(TransportResponse::new(200, r#"{"photoUrl":"u","s3Key":"k1"}"#)));

        let uploaded = client(mock).upload_photo(&jpeg()).await.unwrap();
        assert_eq!(uploaded.photo_url, "u");
        assert_eq!(uploaded.s3_key, "k1");
    }

    #[tokio::test]
    async fn generate_posts_camel_case_json() {
        let mut mock = MockTransport::new();
        mock.expect_post()
            .withf(|path, payload| {
                path == "/api/generate-altar"
                    && matches!(payload, RequestPayload::Json(v)
                        if v["photoS3Key"] == "k1" && v["foodDescription"] == "Pan de muerto y mole")
            })
            .times(1)
            .returning(|_, _| {
                Ok(TransportResponse::new(200, r#"{"altarImageUrl":"g","altarImageS3Key":"k2"}"#))
            });

        let generated = client(mock).generate_altar(&generate_request()).await.unwrap();
        assert_eq!(generated.altar_image_url, "g");
        assert_eq!(generated.altar_image_s3_key, "k2");
    }

    #[tokio::test]
    async fn offline_rejects_before_any_io() {
        let mut mock = MockTransport::new();
        mock.expect_post().times(0);
        let flag = Arc::new(ConnectivityFlag::new(false));
        let client = RemoteClient::new(mock, Arc::clone(&flag), &ApiConfig::default());

        let err = client.upload_photo(&jpeg()).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::NoConnectivity);
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_request_times_out_with_408() {
        let client = RemoteClient::new(StallingTransport, AlwaysOnline, &ApiConfig::default());
        let started = tokio::time::Instant::now();

        let err = client.upload_photo(&jpeg()).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::Timeout);
        assert_eq!(err.status(), Some(408));
        assert!(err.is_retryable());
        assert!(started.elapsed() >= Duration::from_secs(35));
    }

    #[tokio::test]
    async fn server_error_body_is_classified() {
        let mut mock = MockTransport::new();
        mock.expect_post().returning(|_, _| {
            Ok(TransportResponse::new(
                503,
                r#"{"error":"Service Unavailable","message":"Bedrock saturado","code":"MODEL_BUSY"}"#,
            ))
        });

        let err = client(mock).generate_altar(&generate_request()).await.unwrap_err();
        assert_eq!(err.message(), "Bedrock saturado");
        assert_eq!(err.code(), &ErrorCode::Server("MODEL_BUSY".to_string()));
        assert_eq!(err.status(), Some(503));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn malformed_success_body_is_rejected() {
        let mut mock = MockTransport::new();
        mock.expect_post()
            .returning(|_, _| Ok(TransportResponse::new(200, r#"{"photoUrl":"u"}"#)));

        let err = client(mock).upload_photo(&jpeg()).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::InvalidResponse);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn transport_failures_go_through_classifier() {
        let mut mock = MockTransport::new();
        mock.expect_post()
            .returning(|_, _| Err(RawFailure::Message("connection refused".to_string())));

        let err = client(mock).upload_photo(&jpeg()).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::NetworkError);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn generate_validates_request_before_sending() {
        let mut mock = MockTransport::new();
        mock.expect_post().times(0);
        let client = client(mock);

        let mut missing_key = generate_request();
        missing_key.photo_s3_key.clear();
        let err = client.generate_altar(&missing_key).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::InvalidRequest);
        assert_eq!(err.status(), Some(400));

        let mut short = generate_request();
        short.food_description = "mole".to_string();
        let err = client.generate_altar(&short).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::InvalidDescriptionLength);
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeout_millis_saturate_instead_of_wrapping() {
        assert_eq!(saturating_millis(Duration::from_secs(35)), 35_000);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn unbounded_timeout_still_sends() {
        let mut mock = MockTransport::new();
        mock.expect_post()
            .times(1)
            .returning(|_, _| Ok(TransportResponse::new(200, r#"{"photoUrl":"u","s3Key":"k1"}"#)));

        let client = client(mock).with_timeout(Duration::MAX);
        assert_eq!(client.upload_photo(&jpeg()).await.unwrap().s3_key, "k1");
    }
}
