//! Versioning configuration
//!
//! [`VersioningConfig`] carries every tunable of the version manager. Only
//! `storage_root`, `max_versions_per_file` and the event log bounds change
//! behavior inside this crate; `auto_versioning`, `retention_days`,
//! `enable_diff` and `storage_location` are advisory values exposed to the
//! surrounding service.
//!
//! Configuration can be built in code, through
//! [`VersionManagerBuilder`](crate::VersionManagerBuilder), or loaded from JSON:
//!
//! ```rust
//! use verchain::config::VersioningConfig;
//!
//! let config: VersioningConfig = serde_json::from_str(r#"{
//!     "storage_root": "/var/lib/files/.versions",
//!     "max_versions_per_file": 5
//! }"#).unwrap();
//!
//! assert_eq!(config.max_versions_per_file, 5);
//! assert_eq!(config.retention_days, 30);
//! config.validate().unwrap();
//! ```

use crate::error::{Result, VersionError};
use crate::events::{DEFAULT_HIGH_WATER, DEFAULT_RETAIN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where version content is expected to live
///
/// The manager itself only ever writes through its
/// [`ContentStore`](crate::content::ContentStore); this value tells callers
/// which kind of store they configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    /// Local disk
    #[default]
    Local,
    /// Remote object storage
    Remote,
}

/// Configuration for a version manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Directory under which version content is stored
    pub storage_root: PathBuf,
    /// Versions retained per file before pruning
    pub max_versions_per_file: usize,
    /// Whether callers should version files automatically on write
    pub auto_versioning: bool,
    /// Days versions should be retained; not enforced by the manager
    pub retention_days: u32,
    /// Whether callers should compute comparisons on version creation
    pub enable_diff: bool,
    /// Kind of content store in use
    pub storage_location: StorageLocation,
    /// Event log length that triggers truncation
    pub event_log_high_water: usize,
    /// Events kept after truncation
    pub event_log_retain: usize,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(".versions"),
            max_versions_per_file: 10,
            auto_versioning: true,
            retention_days: 30,
            enable_diff: true,
            storage_location: StorageLocation::Local,
            event_log_high_water: DEFAULT_HIGH_WATER,
            event_log_retain: DEFAULT_RETAIN,
        }
    }
}

impl VersioningConfig {
    /// Load configuration from a JSON file; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// - [`VersionError::Io`] if the file cannot be read
    /// - [`VersionError::Json`] if it is not valid JSON for this struct
    /// - [`VersionError::InvalidConfiguration`] if [`validate`](Self::validate) fails
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded versioning config from {:?}", path);
        Ok(config)
    }

    /// Check that the values are usable
    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(VersionError::InvalidConfiguration(
                "storage_root must not be empty".to_string(),
            ));
        }
        if self.max_versions_per_file == 0 {
            return Err(VersionError::InvalidConfiguration(
                "max_versions_per_file must be at least 1".to_string(),
            ));
        }
        if self.event_log_retain == 0 || self.event_log_retain > self.event_log_high_water {
            return Err(VersionError::InvalidConfiguration(format!(
                "event_log_retain ({}) must be between 1 and event_log_high_water ({})",
                self.event_log_retain, self.event_log_high_water
            )));
        }
        Ok(())
    }
}
