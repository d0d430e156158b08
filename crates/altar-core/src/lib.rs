//! Altar Core
//!
//! Shared building blocks of the altar creation pipeline:
//! - Records, requests and remote response shapes
//! - The remote error taxonomy ([`ClassifiedError`], [`ErrorCode`])
//! - The total error classifier ([`classify`])
//! - The retry controller ([`retry`], [`RetryPolicy`])
//! - Input validation consumed before pipeline entry
//! - Configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use altar_core::{retry, RemoteOperation, RetryPolicy};
//!
//! let policy = RetryPolicy::for_operation(RemoteOperation::UploadPhoto);
//! let uploaded = retry(RemoteOperation::UploadPhoto, &policy, || client.upload_photo(&photo)).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod classify;
pub mod config;
pub mod error;
pub mod messages;
pub mod retry;
pub mod types;
pub mod validation;

pub use classify::{classify, RawFailure};
pub use config::{AltarConfig, ApiConfig, ConfigError, RetryConfig, StorageConfig};
pub use error::{ClassifiedError, ErrorCode};
pub use retry::{retry, RetryPolicy};
pub use types::{
    AltarId, AltarRecord, CreateAltarRequest, GenerateAltarRequest, GenerateAltarResponse,
    PhotoUpload, RemoteOperation, UploadPhotoResponse,
};
pub use validation::{ImageKind, ValidationError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with altar records and remote errors
    pub use crate::{
        classify, retry, AltarId, AltarRecord, ClassifiedError, CreateAltarRequest, ErrorCode,
        PhotoUpload, RawFailure, RemoteOperation, RetryPolicy,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
