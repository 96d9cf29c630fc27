//! # Verchain - Per-file version chains
//!
//! A versioning library that keeps an ordered chain of immutable versions for
//! every logical file, with content deduplication, bounded retention, restore
//! and an audit trail.
//!
//! ## Overview
//!
//! Verchain lets a file-management service:
//! - Snapshot the current content of a file as a new numbered version
//! - Skip snapshots whose content is identical to an existing version
//! - Restore any earlier version, recording the restore as a new version
//! - Compare two versions and search across all versions
//! - Keep the chain bounded by pruning the oldest inactive versions
//! - Audit every create, restore and delete in an event log
//!
//! ## Architecture
//!
//! - **Checksum Engine**: SHA-256 digests of streamed content, used for
//!   deduplication and integrity checks
//! - **Version Store**: in-memory chains keyed by file id that enforce
//!   monotonically increasing version numbers and a single active version
//! - **Content Store**: pluggable backend holding one copy of each version's
//!   bytes at its own storage path
//! - **Compare Engine**: record-level change lists and a size-based similarity
//! - **Event Log**: bounded, append-only audit trail
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verchain::{CreateVersionOptions, RestoreOptions, VersionManager};
//! use verchain::config::VersioningConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = VersionManager::new(VersioningConfig::default())?;
//!
//! let v1 = manager.create_version(
//!     "doc-A",
//!     Path::new("report.txt"),
//!     CreateVersionOptions {
//!         comment: Some("First draft".to_string()),
//!         created_by: Some("alice".to_string()),
//!         ..Default::default()
//!     },
//! )?;
//! println!("Created version {} ({})", v1.version, v1.short_id());
//!
//! // ... report.txt is edited ...
//! manager.create_version("doc-A", Path::new("report.txt"), CreateVersionOptions::default())?;
//!
//! // Bring the first draft back
//! let restored = manager.restore_version(
//!     "doc-A",
//!     Path::new("report.txt"),
//!     RestoreOptions::new(v1.id.clone()),
//! )?;
//! println!("Now at version {}", restored.version);
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Versions
//!
//! A version is an immutable record of one file's content at a point in time:
//! a per-file version number starting at 1, the SHA-256 checksum and size of
//! the stored bytes, author, comment, tags and free-form metadata. Exactly
//! one version of each file is active: the most recently created one.
//!
//! ### Restore
//!
//! Restoring never rewinds the chain. The chosen version's content is copied
//! back to the working path and recorded as a brand new version tagged
//! `restored`, optionally preceded by a `backup` of the previously active
//! content.
//!
//! ### Retention
//!
//! After each creation the chain is pruned to `max_versions_per_file`,
//! oldest inactive versions first. The active version is never pruned.
//!
//! ## Persistence
//!
//! Version records and the event log live in memory and are lost when the
//! manager is dropped. Only version content is written to the storage root.
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, VersionError>`. Not-found
//! conditions, rejected operations, validation failures and I/O errors are
//! separate variants so callers can map them to their own status codes.
//!
//! ## Module Organization
//!
//! - [`manager`]: The [`VersionManager`] facade and its builder
//! - [`store`]: Per-file version chains
//! - [`content`]: Content storage backends
//! - [`checksum`]: Content hashing
//! - [`diff`]: Version comparison
//! - [`search`]: Search filtering, ordering and paging
//! - [`events`]: Audit event log
//! - [`config`]: Configuration
//! - [`sources`]: Injectable clocks and id generators
//! - [`types`]: Common types and data structures
//! - [`utils`]: Formatting and path helpers
//! - [`error`]: Error types and handling

// Public API modules
pub mod checksum;
pub mod config;
pub mod content;
pub mod diff;
pub mod error;
pub mod events;
pub mod manager;
pub mod search;
pub mod sources;
pub mod store;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use config::{StorageLocation, VersioningConfig};
pub use content::{ContentStat, ContentStore, LocalContentStore};
pub use error::{Result, VersionError};
pub use events::EventLog;
pub use manager::{VersionManager, VersionManagerBuilder};
pub use store::VersionStore;
pub use types::*;
pub use utils::format_bytes;
