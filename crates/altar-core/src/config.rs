//! Altar configuration
//!
//! Loaded from an optional TOML file, then overridden by `ALTAR_*`
//! environment variables. Every field has a default so an empty file (or no
//! file) yields a working configuration.

use crate::retry::RetryPolicy;
use crate::types::RemoteOperation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_API_BASE_URL: &str = "ALTAR_API_BASE_URL";
pub const ENV_STORAGE_DIR: &str = "ALTAR_STORAGE_DIR";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AltarConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub storage: StorageConfig,
}

impl AltarConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path` if given and present, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(dir) = lookup(ENV_STORAGE_DIR).filter(|v| !v.trim().is_empty()) {
            self.storage.dir = PathBuf::from(dir);
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.api.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "api.request_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.storage.max_records == 0 {
            return Err(ConfigError::Invalid {
                field: "storage.max_records",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// With storage directory
    #[inline]
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.dir = dir.into();
        self
    }
}

/// Remote endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub upload_path: String,
    pub generate_path: String,
    /// Timeout raced against every remote call
    pub request_timeout_ms: u64,
}

impl ApiConfig {
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Endpoint path for an operation
    #[must_use]
    pub fn path_for(&self, operation: RemoteOperation) -> &str {
        match operation {
            RemoteOperation::UploadPhoto => &self.upload_path,
            RemoteOperation::GenerateAltar => &self.generate_path,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            upload_path: "/api/upload-photo".to_string(),
            generate_path: "/api/generate-altar".to_string(),
            request_timeout_ms: 35_000,
        }
    }
}

/// Backoff settings shared by both operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Extra weight for the (slower) generation operation
    pub generation_multiplier: u32,
}

impl RetryConfig {
    /// Policy for one operation
    #[must_use]
    pub fn policy_for(&self, operation: RemoteOperation) -> RetryPolicy {
        let multiplier = match operation {
            RemoteOperation::UploadPhoto => 1,
            RemoteOperation::GenerateAltar => self.generation_multiplier,
        };
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            multiplier,
        )
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            base_delay_ms: 1000,
            generation_multiplier: RetryPolicy::GENERATION_MULTIPLIER,
        }
    }
}

/// Durable local storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
    /// Single key holding the whole serialized collection
    pub key: String,
    pub max_records: usize,
    /// Capacity ceiling in bytes; writes above it fail with a quota error
    pub quota_bytes: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".altar"),
            key: "altar_app_altars".to_string(),
            max_records: 50,
            quota_bytes: Some(5 * 1024 * 1024),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_pipeline_constants() {
        let config = AltarConfig::new();
        assert_eq!(config.api.request_timeout(), Duration::from_secs(35));
        assert_eq!(config.storage.max_records, 50);
        assert_eq!(config.storage.key, "altar_app_altars");
        assert_eq!(
            config.retry.policy_for(RemoteOperation::GenerateAltar),
            RetryPolicy::for_operation(RemoteOperation::GenerateAltar)
        );
        assert_eq!(
            config.retry.policy_for(RemoteOperation::UploadPhoto),
            RetryPolicy::for_operation(RemoteOperation::UploadPhoto)
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://altar.example\"\n[retry]\nmax_retries = 1").unwrap();

        let config = AltarConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "https://altar.example");
        assert_eq!(config.api.upload_path, "/api/upload-photo");
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.base_delay_ms, 1000);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AltarConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.storage.max_records, 50);
    }

    #[test]
    fn malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbase_url = ").unwrap();
        assert!(matches!(
            AltarConfig::load(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AltarConfig::new().with_base_url("https://file.example");
        config.apply_env(|key| match key {
            ENV_API_BASE_URL => Some("https://env.example".to_string()),
            ENV_STORAGE_DIR => Some("/tmp/altars".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://env.example");
        assert_eq!(config.storage.dir, PathBuf::from("/tmp/altars"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = AltarConfig::new();
        config.storage.max_records = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }
}
