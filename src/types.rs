//! Core data types used throughout verchain
//!
//! This module contains the records the version manager stores and returns,
//! plus the option and query structs its operations take.
//!
//! ## Overview
//!
//! - **Records**: `FileVersion`, `VersioningEvent` - immutable snapshots and audit entries
//! - **Views**: `VersionHistory`, `VersionStats`, `SearchResult`, `VersionComparison`
//! - **Requests**: `CreateVersionOptions`, `RestoreOptions`, `SearchQuery`, `EventQuery`
//!
//! ## Examples
//!
//! ```rust
//! use verchain::types::{CreateVersionOptions, MetadataValue};
//!
//! let options = CreateVersionOptions {
//!     comment: Some("Quarterly numbers".to_string()),
//!     created_by: Some("alice".to_string()),
//!     ..Default::default()
//! }
//! .with_tag("finance")
//! .with_metadata("author", "alice")
//! .with_metadata("pages", 12i64);
//!
//! assert_eq!(options.metadata["pages"], MetadataValue::Integer(12));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Open key/value metadata attached to versions and events
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A scalar metadata value
///
/// Serialized untagged, so a JSON object such as
/// `{"author": "alice", "pages": 12, "draft": false}` maps directly onto
/// `Text`, `Integer` and `Bool` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Free-form text
    Text(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for MetadataValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One immutable snapshot of a file's content
///
/// Versions of the same logical file share a `file_id` and form a singly
/// linked chain through `parent_version_id`. Exactly one version per file is
/// active at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileVersion {
    /// Unique version identifier
    pub id: String,
    /// Logical file this version belongs to
    pub file_id: String,
    /// Version number, starting at 1
    pub version: u32,
    /// File name at creation time
    pub file_name: String,
    /// MIME type at creation time
    pub mime_type: String,
    /// Where this version's bytes are stored
    pub storage_path: PathBuf,
    /// Stored content length in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the content
    pub checksum: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Who created the version
    pub created_by: Option<String>,
    /// Free-form comment
    pub comment: Option<String>,
    /// Tags
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Custom metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Whether this is the current version of the file
    pub is_active: bool,
    /// Version this one superseded
    pub parent_version_id: Option<String>,
}

impl FileVersion {
    /// First eight characters of the version id
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// Check whether the version carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Read-only view over one file's version chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionHistory {
    /// Logical file id
    pub file_id: String,
    /// Name from the active (or newest) version
    pub file_name: String,
    /// Active version number, 0 when none is active
    pub current_version: u32,
    /// Number of versions
    pub total_versions: usize,
    /// Versions sorted by version number, newest first
    pub versions: Vec<FileVersion>,
    /// Sum of all version sizes
    pub total_size: u64,
    /// Earliest creation timestamp
    pub first_version_at: DateTime<Utc>,
    /// Latest creation timestamp
    pub last_version_at: DateTime<Utc>,
}

/// Kind of state change recorded in the event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A version was created
    Create,
    /// A version was restored
    Restore,
    /// A version was deleted
    Delete,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Restore => write!(f, "restore"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Append-only audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersioningEvent {
    /// Event id
    pub id: String,
    /// What happened
    pub event_type: EventType,
    /// File the event concerns
    pub file_id: String,
    /// Version the event concerns
    pub version_id: Option<String>,
    /// Acting user
    pub user_id: Option<String>,
    /// When the event was appended
    pub timestamp: DateTime<Utc>,
    /// Free-form details
    #[serde(default)]
    pub details: Metadata,
}

/// Kind of a single comparison entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present only in the second version
    Added,
    /// Present only in the first version
    Removed,
    /// Present in both with different values
    Modified,
}

/// One entry in a version comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionChange {
    /// Kind of change
    pub kind: ChangeKind,
    /// Dotted path of the changed field, e.g. `metadata.author`
    pub path: Option<String>,
    /// Value in the first version
    pub old_value: Option<MetadataValue>,
    /// Value in the second version
    pub new_value: Option<MetadataValue>,
    /// Human-readable description
    pub description: String,
}

/// Result of comparing two versions of the same file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionComparison {
    /// Logical file id
    pub file_id: String,
    /// First version as passed by the caller
    pub from: FileVersion,
    /// Second version as passed by the caller
    pub to: FileVersion,
    /// Ordered change entries
    pub changes: Vec<VersionChange>,
    /// Similarity in `[0, 1]`
    pub similarity: f64,
}

impl VersionComparison {
    /// Check if the versions differ at all
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Check if the stored bytes are identical
    pub fn content_identical(&self) -> bool {
        self.from.checksum == self.to.checksum
    }
}

/// Options for version creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateVersionOptions {
    /// Free-form comment
    pub comment: Option<String>,
    /// Who creates the version
    pub created_by: Option<String>,
    /// Tags to attach
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Custom metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Create a version even when identical content already exists
    #[serde(default)]
    pub preserve_original: bool,
    /// Override the file name taken from the source path
    pub file_name: Option<String>,
    /// Override the MIME type guessed from the file name
    pub mime_type: Option<String>,
}

impl CreateVersionOptions {
    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Options for restore operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreOptions {
    /// Id of the version to restore
    pub target_version_id: String,
    /// Snapshot the currently active content before restoring
    #[serde(default)]
    pub create_backup: bool,
    /// Who performs the restore
    pub restored_by: Option<String>,
    /// Comment for the restored version
    pub comment: Option<String>,
}

impl RestoreOptions {
    /// Restore the given version without a backup
    pub fn new(target_version_id: impl Into<String>) -> Self {
        Self {
            target_version_id: target_version_id.into(),
            create_backup: false,
            restored_by: None,
            comment: None,
        }
    }

    /// Request a pre-restore backup
    pub fn with_backup(mut self) -> Self {
        self.create_backup = true;
        self
    }
}

/// Field to sort search results by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Version number
    Version,
    /// Stored size
    Size,
    /// Creation timestamp
    #[default]
    CreatedAt,
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}

/// Filters, ordering and paging for version search
///
/// All supplied filters must match. `tags` matches when at least one of the
/// requested tags is present on the version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Exact file id
    pub file_id: Option<String>,
    /// Substring of the file name
    pub file_name: Option<String>,
    /// Exact version number
    pub version: Option<u32>,
    /// Exact creator
    pub created_by: Option<String>,
    /// Inclusive lower bound on creation time
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time
    pub date_to: Option<DateTime<Utc>>,
    /// Any-of tag filter
    #[serde(default)]
    pub tags: Vec<String>,
    /// Sort field
    #[serde(default)]
    pub sort_by: SortField,
    /// Sort direction
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Results to skip
    #[serde(default)]
    pub offset: usize,
    /// Page size
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    50
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            file_id: None,
            file_name: None,
            version: None,
            created_by: None,
            date_from: None,
            date_to: None,
            tags: Vec::new(),
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            offset: 0,
            limit: default_search_limit(),
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching versions in the requested order
    pub versions: Vec<FileVersion>,
    /// Number of matches before paging
    pub total: usize,
    /// Whether more matches follow this page
    pub has_more: bool,
}

/// Per-file entry in [`VersionStats::top_files`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileVersionSummary {
    /// Logical file id
    pub file_id: String,
    /// Name from the active (or newest) version
    pub file_name: String,
    /// Number of versions
    pub version_count: usize,
    /// Sum of version sizes
    pub total_size: u64,
}

/// Aggregate statistics across the whole store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionStats {
    /// Distinct file ids
    pub total_files: usize,
    /// Versions across all files
    pub total_versions: usize,
    /// Bytes across all versions
    pub total_size: u64,
    /// `total_versions / total_files`, 0 when empty
    pub average_versions_per_file: f64,
    /// Oldest creation timestamp
    pub oldest_version: Option<DateTime<Utc>>,
    /// Newest creation timestamp
    pub newest_version: Option<DateTime<Utc>>,
    /// Up to ten files with the most versions
    pub top_files: Vec<FileVersionSummary>,
}

/// Outcome of re-hashing a version's stored content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionVerification {
    /// Verified version id
    pub version_id: String,
    /// Checksum recorded at creation
    pub expected_checksum: String,
    /// Checksum of the bytes on disk now
    pub actual_checksum: String,
    /// Whether the stored size still matches the record
    pub size_matches: bool,
}

impl VersionVerification {
    /// Check if stored content still matches the record
    pub fn is_valid(&self) -> bool {
        self.size_matches && self.expected_checksum == self.actual_checksum
    }
}

/// Filter for reading the event log through the manager
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Only events for this file
    pub file_id: Option<String>,
    /// Only events of this type
    pub event_type: Option<EventType>,
    /// Keep only the most recent N matches
    pub limit: Option<usize>,
}
