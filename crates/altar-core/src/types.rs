//! Core types for the altar pipeline
//!
//! Defines:
//! - Record identity and the persisted [`AltarRecord`]
//! - The creation request handed to the pipeline
//! - Request/response shapes of the two remote operations

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque record identifier, generated once per record and never reused
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AltarId(String);

impl AltarId {
    /// Generate a fresh identifier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AltarId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for AltarId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AltarId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for AltarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two remote operations of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    UploadPhoto,
    GenerateAltar,
}

impl RemoteOperation {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::UploadPhoto => "upload_photo",
            Self::GenerateAltar => "generate_altar",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully assembled altar, the unit persisted by the local store.
///
/// Field names on the wire match the stored JSON collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltarRecord {
    id: AltarId,
    photo_url: String,
    #[serde(rename = "photoS3Key")]
    photo_storage_key: String,
    food_description: String,
    #[serde(rename = "altarImageUrl")]
    generated_image_url: String,
    #[serde(rename = "altarImageS3Key")]
    generated_image_storage_key: String,
    #[serde(with = "iso_millis")]
    created_at: DateTime<Utc>,
}

impl AltarRecord {
    /// Assemble a record from both remote results, stamping a new id and
    /// creation time. Pure construction; cannot fail.
    #[must_use]
    pub fn assemble(
        upload: UploadPhotoResponse,
        generated: GenerateAltarResponse,
        food_description: impl Into<String>,
    ) -> Self {
        Self::restore(
            AltarId::new(),
            upload,
            generated,
            food_description,
            Utc::now(),
        )
    }

    /// Rebuild a record with a known id and creation time.
    ///
    /// The timestamp is truncated to milliseconds, the precision of the
    /// stored representation.
    #[must_use]
    pub fn restore(
        id: AltarId,
        upload: UploadPhotoResponse,
        generated: GenerateAltarResponse,
        food_description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            photo_url: upload.photo_url,
            photo_storage_key: upload.s3_key,
            food_description: food_description.into(),
            generated_image_url: generated.altar_image_url,
            generated_image_storage_key: generated.altar_image_s3_key,
            created_at: created_at.trunc_subsecs(3),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &AltarId {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn photo_url(&self) -> &str {
        &self.photo_url
    }

    #[inline]
    #[must_use]
    pub fn photo_storage_key(&self) -> &str {
        &self.photo_storage_key
    }

    #[inline]
    #[must_use]
    pub fn food_description(&self) -> &str {
        &self.food_description
    }

    #[inline]
    #[must_use]
    pub fn generated_image_url(&self) -> &str {
        &self.generated_image_url
    }

    #[inline]
    #[must_use]
    pub fn generated_image_storage_key(&self) -> &str {
        &self.generated_image_storage_key
    }

    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// ISO-8601 creation timestamp with millisecond precision
    #[must_use]
    pub fn created_at_iso(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Photo bytes as submitted by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Original file name, used for the multipart part
    pub file_name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    #[inline]
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Input of one pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAltarRequest {
    pub photo: PhotoUpload,
    pub food_description: String,
}

impl CreateAltarRequest {
    #[inline]
    #[must_use]
    pub fn new(photo: PhotoUpload, food_description: impl Into<String>) -> Self {
        Self {
            photo,
            food_description: food_description.into(),
        }
    }
}

/// Response of the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPhotoResponse {
    pub photo_url: String,
    pub s3_key: String,
}

/// Request body of the generation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAltarRequest {
    pub photo_s3_key: String,
    pub food_description: String,
}

/// Response of the generation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAltarResponse {
    pub altar_image_url: String,
    pub altar_image_s3_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn upload() -> UploadPhotoResponse {
        UploadPhotoResponse {
            photo_url: "https://cdn/photo.jpg".to_string(),
            s3_key: "uploads/photo.jpg".to_string(),
        }
    }

    fn generated() -> GenerateAltarResponse {
        GenerateAltarResponse {
            altar_image_url: "https://cdn/altar.png".to_string(),
            altar_image_s3_key: "altars/altar.png".to_string(),
        }
    }

    #[test]
    fn assemble_generates_distinct_ids() {
        let a = AltarRecord::assemble(upload(), generated(), "Pan de muerto y mole");
        let b = AltarRecord::assemble(upload(), generated(), "Pan de muerto y mole");
        assert_ne!(a.id(), b.id());
        assert!(!a.id().as_str().is_empty());
    }

    #[test]
    fn record_serializes_with_stored_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 11, 1, 12, 30, 0).unwrap();
        let record = AltarRecord::restore(AltarId::from("a1"), upload(), generated(), "tamales", at);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], "a1");
        assert_eq!(json["photoS3Key"], "uploads/photo.jpg");
        assert_eq!(json["altarImageUrl"], "https://cdn/altar.png");
        assert_eq!(json["altarImageS3Key"], "altars/altar.png");
        assert_eq!(json["createdAt"], "2024-11-01T12:30:00.000Z");
    }

    #[test]
    fn created_at_is_truncated_to_millis() {
        let at = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let record = AltarRecord::restore(AltarId::new(), upload(), generated(), "x", at);
        let back: AltarRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(back, record);
        assert_eq!(record.created_at_iso(), "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn created_at_accepts_offsets() {
        let json = r#"{"id":"x","photoUrl":"u","photoS3Key":"k1","foodDescription":"d",
            "altarImageUrl":"g","altarImageS3Key":"k2","createdAt":"2024-11-01T06:00:00-06:00"}"#;
        let record: AltarRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.created_at(), Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap());
    }
}
