//! Testing utilities for the altar workspace
//!
//! Shared fixtures and fakes: records, image bytes, a scripted remote service
//! and storage backends that fail on demand.

#![allow(missing_docs)]

use altar_core::{
    AltarId, AltarRecord, ClassifiedError, GenerateAltarRequest, GenerateAltarResponse,
    PhotoUpload, UploadPhotoResponse,
};
use altar_remote::AltarService;
use altar_store::{KeyValueStorage, MemoryStorage, StorageError, DEFAULT_STORAGE_KEY};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DESCRIPTION: &str = "Pan de muerto y mole";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

pub fn upload_response(photo_url: &str, s3_key: &str) -> UploadPhotoResponse {
    UploadPhotoResponse {
        photo_url: photo_url.to_string(),
        s3_key: s3_key.to_string(),
    }
}

pub fn generate_response(image_url: &str, s3_key: &str) -> GenerateAltarResponse {
    GenerateAltarResponse {
        altar_image_url: image_url.to_string(),
        altar_image_s3_key: s3_key.to_string(),
    }
}

/// Record `id` created at `millis` since the epoch
pub fn record_at(id: &str, millis: i64) -> AltarRecord {
    let created_at = Utc
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now);
    AltarRecord::restore(
        AltarId::from(id),
        upload_response(&format!("https://cdn.example/{id}.jpg"), &format!("photos/{id}")),
        generate_response(&format!("https://cdn.example/{id}-altar.png"), &format!("altars/{id}")),
        DESCRIPTION,
        created_at,
    )
}

/// `count` records `r0..`, one second apart, oldest first
pub fn records(count: usize) -> Vec<AltarRecord> {
    (0..count)
        .map(|i| record_at(&format!("r{i}"), 1_700_000_000_000 + i as i64 * 1_000))
        .collect()
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

fn padded(prefix: &[u8], len: usize) -> Vec<u8> {
    let mut bytes = prefix.to_vec();
    bytes.resize(len.max(prefix.len()), 0);
    bytes
}

pub fn jpeg_bytes() -> Vec<u8> {
    padded(&[0xFF, 0xD8, 0xFF, 0xE0], 64)
}

pub fn png_bytes() -> Vec<u8> {
    padded(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], 64)
}

pub fn webp_bytes() -> Vec<u8> {
    padded(b"RIFF\x24\x00\x00\x00WEBPVP8 ", 64)
}

pub fn jpeg_photo() -> PhotoUpload {
    PhotoUpload::new("ofrenda.jpg", jpeg_bytes())
}

// ---------------------------------------------------------------------------
// Remote service
// ---------------------------------------------------------------------------

/// Hands out queued results per operation, then repeats the fallback
///
/// With no fallback an exhausted queue answers with a non-retryable error.
#[derive(Debug, Default)]
pub struct ScriptedService {
    uploads: Mutex<VecDeque<Result<UploadPhotoResponse, ClassifiedError>>>,
    generations: Mutex<VecDeque<Result<GenerateAltarResponse, ClassifiedError>>>,
    upload_fallback: Option<UploadPhotoResponse>,
    generate_fallback: Option<GenerateAltarResponse>,
    upload_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    descriptions: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always succeeds with `u`/`k1` for upload and `g`/`k2` for generation
    pub fn succeeding() -> Self {
        Self {
            upload_fallback: Some(upload_response("u", "k1")),
            generate_fallback: Some(generate_response("g", "k2")),
            ..Self::default()
        }
    }

    pub fn push_upload(self, result: Result<UploadPhotoResponse, ClassifiedError>) -> Self {
        self.uploads.lock().push_back(result);
        self
    }

    pub fn push_generation(self, result: Result<GenerateAltarResponse, ClassifiedError>) -> Self {
        self.generations.lock().push_back(result);
        self
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Descriptions received by `generate_altar`, in call order
    pub fn descriptions(&self) -> Vec<String> {
        self.descriptions.lock().clone()
    }
}

fn exhausted() -> ClassifiedError {
    ClassifiedError::unknown("script exhausted")
}

#[async_trait]
impl AltarService for ScriptedService {
    async fn upload_photo(&self, _photo: &PhotoUpload) -> Result<UploadPhotoResponse, ClassifiedError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.uploads.lock().pop_front();
        next.unwrap_or_else(|| self.upload_fallback.clone().ok_or_else(exhausted))
    }

    async fn generate_altar(
        &self,
        request: &GenerateAltarRequest,
    ) -> Result<GenerateAltarResponse, ClassifiedError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.descriptions.lock().push(request.food_description.clone());
        let next = self.generations.lock().pop_front();
        next.unwrap_or_else(|| self.generate_fallback.clone().ok_or_else(exhausted))
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// How [`FailingStorage`] rejects writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    Quota,
    AccessDenied,
}

/// Reads from an inner [`MemoryStorage`]; every write fails
#[derive(Debug)]
pub struct FailingStorage {
    inner: MemoryStorage,
    failure: WriteFailure,
    write_attempts: AtomicUsize,
}

impl FailingStorage {
    pub fn new(failure: WriteFailure) -> Self {
        Self {
            inner: MemoryStorage::new(),
            failure,
            write_attempts: AtomicUsize::new(0),
        }
    }

    pub fn quota_exceeded() -> Self {
        Self::new(WriteFailure::Quota)
    }

    pub fn access_denied() -> Self {
        Self::new(WriteFailure::AccessDenied)
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn reject(&self) -> StorageError {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            WriteFailure::Quota => StorageError::QuotaExceeded {
                needed: u64::MAX,
                limit: 0,
            },
            WriteFailure::AccessDenied => StorageError::AccessDenied("read-only fixture".to_string()),
        }
    }
}

impl KeyValueStorage for FailingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(self.reject())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(self.reject())
    }
}

/// Storage whose collection key holds something that is not a record array
pub fn corrupt_storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    // the in-memory backend only fails on quota, and this one has none
    let _ = storage.set(DEFAULT_STORAGE_KEY, "{\"id\": \"truncated");
    storage
}
