//! The remote operations as seen by the pipeline.

use altar_core::{
    ClassifiedError, GenerateAltarRequest, GenerateAltarResponse, PhotoUpload,
    UploadPhotoResponse,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Upload and generation calls, one attempt each
#[async_trait]
pub trait AltarService: Send + Sync {
    /// Upload the source photo
    async fn upload_photo(&self, photo: &PhotoUpload) -> Result<UploadPhotoResponse, ClassifiedError>;

    /// Generate the altar image from an uploaded photo and a description
    async fn generate_altar(
        &self,
        request: &GenerateAltarRequest,
    ) -> Result<GenerateAltarResponse, ClassifiedError>;
}

#[async_trait]
impl<S: AltarService + ?Sized> AltarService for Arc<S> {
    async fn upload_photo(&self, photo: &PhotoUpload) -> Result<UploadPhotoResponse, ClassifiedError> {
        (**self).upload_photo(photo).await
    }

    async fn generate_altar(
        &self,
        request: &GenerateAltarRequest,
    ) -> Result<GenerateAltarResponse, ClassifiedError> {
        (**self).generate_altar(request).await
    }
}
