//! Altar Store
//!
//! Capacity-bounded local persistence for altar records.
//!
//! - [`KeyValueStorage`]: durable string key/value seam
//! - [`MemoryStorage`], [`FileStorage`]: backends
//! - [`LocalStore`]: the sorted, truncated record collection
//! - [`StoreError`]: failures with a [`StoreErrorCode`] distinct from remote errors

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod file;
pub mod storage;
pub mod store;

pub use error::{StorageError, StoreError, StoreErrorCode};
pub use file::FileStorage;
pub use storage::{KeyValueStorage, MemoryStorage};
pub use store::{LocalStore, DEFAULT_MAX_RECORDS, DEFAULT_STORAGE_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
