//! Version manager
//!
//! This module provides [`VersionManager`], the entry point for every
//! versioning operation: creating versions, reading history, restoring,
//! comparing, searching, computing statistics and deleting.
//!
//! ## Overview
//!
//! The manager coordinates several components:
//!
//! - **Version Store**: per-file version lists and their invariants
//! - **Content Store**: copies, reads and deletes version content
//! - **Checksum Engine**: content digests for deduplication and verification
//! - **Compare Engine**: coarse change summaries between versions
//! - **Event Log**: bounded audit trail of create/restore/delete
//!
//! ## Thread Safety
//!
//! `VersionManager` is `Send + Sync` and every operation takes `&self`.
//! Mutating operations on the same file id are serialized by a per-file
//! lock, so concurrent writers can never compute the same version number or
//! leave two versions active. Operations on different files run in parallel.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use verchain::{CreateVersionOptions, RestoreOptions, VersionManager};
//! use std::path::Path;
//!
//! # fn main() -> verchain::Result<()> {
//! let manager = VersionManager::builder()
//!     .storage_root("./.versions")
//!     .max_versions_per_file(20)
//!     .build()?;
//!
//! let v1 = manager.create_version("doc-A", Path::new("report.txt"), CreateVersionOptions::default())?;
//! // ... report.txt changes ...
//! let v2 = manager.create_version("doc-A", Path::new("report.txt"), CreateVersionOptions::default())?;
//!
//! let comparison = manager.compare_versions("doc-A", v1.version, v2.version)?;
//! println!("similarity {:.2}", comparison.similarity);
//!
//! let restored = manager.restore_version(
//!     "doc-A",
//!     Path::new("report.txt"),
//!     RestoreOptions::new(v1.id.clone()).with_backup(),
//! )?;
//! assert!(restored.is_active);
//! # Ok(())
//! # }
//! ```

use crate::checksum;
use crate::config::{StorageLocation, VersioningConfig};
use crate::content::{ContentStore, LocalContentStore};
use crate::diff;
use crate::error::{Result, VersionError};
use crate::events::EventLog;
use crate::search;
use crate::sources::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::store::VersionStore;
use crate::types::*;
use crate::utils;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

/// Number of entries in [`VersionStats::top_files`]
const TOP_FILES: usize = 10;

/// Orchestrates version creation, history, restore, compare, search and deletion
///
/// Construct one instance at process start with [`VersionManager::builder`]
/// and share it (for example behind an `Arc`). All state is in memory and is
/// lost when the manager is dropped; only version content lives on disk.
pub struct VersionManager {
    config: VersioningConfig,
    store: VersionStore,
    events: EventLog,
    content: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    file_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for VersionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionManager")
            .field("config", &self.config)
            .field("files", &self.store.file_count())
            .field("versions", &self.store.version_count())
            .field("events", &self.events.len())
            .field("content", &self.content)
            .finish()
    }
}

impl VersionManager {
    /// Create a manager with the given configuration and default collaborators
    ///
    /// # Errors
    ///
    /// - [`VersionError::InvalidConfiguration`] if the configuration is invalid
    /// - [`VersionError::Io`] if the storage root cannot be created
    pub fn new(config: VersioningConfig) -> Result<Self> {
        VersionManagerBuilder::new().config(config).build()
    }

    /// Start building a manager
    pub fn builder() -> VersionManagerBuilder {
        VersionManagerBuilder::new()
    }

    /// Active configuration
    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Create a new version of `file_id` from the content at `file_path`
    ///
    /// The content is hashed first. If a version of the same file already has
    /// that checksum and `options.preserve_original` is not set, the existing
    /// version is returned unchanged and nothing is recorded.
    ///
    /// Otherwise the content is copied to a dedicated storage path, the new
    /// record becomes the active version (its parent is the previously active
    /// one), a `create` event is logged and the file's chain is pruned down to
    /// `max_versions_per_file`. Pruned content is deleted best-effort.
    ///
    /// # Arguments
    ///
    /// * `file_id` - Logical file id; must not be empty
    /// * `file_path` - Where the current content is read from
    /// * `options` - Comment, author, tags, metadata and overrides
    ///
    /// # Errors
    ///
    /// - [`VersionError::Validation`] if `file_id` is empty
    /// - [`VersionError::Io`] if the source cannot be read or copied
    #[instrument(skip(self, options))]
    pub fn create_version(
        &self,
        file_id: &str,
        file_path: &Path,
        options: CreateVersionOptions,
    ) -> Result<FileVersion> {
        if file_id.is_empty() {
            return Err(VersionError::validation("file_id must not be empty"));
        }

        let lock = self.lock_for(file_id);
        let result = {
            let _guard = lock.lock();
            self.create_version_locked(file_id, file_path, options)
        };
        if result.is_err() {
            drop(lock);
            self.release_lock(file_id);
        }
        result
    }

    /// History of one file, newest version first
    ///
    /// # Errors
    ///
    /// - [`VersionError::FileNotFound`] if the file has no versions
    pub fn get_version_history(&self, file_id: &str) -> Result<VersionHistory> {
        let mut versions = self.store.list(file_id)?;
        versions.sort_by(|a, b| b.version.cmp(&a.version));

        let active = versions.iter().find(|v| v.is_active);
        let current_version = active.map_or(0, |v| v.version);
        let file_name = active
            .or_else(|| versions.first())
            .map(|v| v.file_name.clone())
            .unwrap_or_default();

        let total_size = versions.iter().map(|v| v.size).sum();
        let (first_version_at, last_version_at) = versions
            .iter()
            .map(|v| v.created_at)
            .fold(None, |acc: Option<(_, _)>, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            })
            .ok_or_else(|| VersionError::FileNotFound(file_id.to_string()))?;

        Ok(VersionHistory {
            file_id: file_id.to_string(),
            file_name,
            current_version,
            total_versions: versions.len(),
            versions,
            total_size,
            first_version_at,
            last_version_at,
        })
    }

    /// Look up a version by number
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNumberNotFound`] if it does not exist
    pub fn get_version(&self, file_id: &str, version: u32) -> Result<FileVersion> {
        self.store
            .get(file_id, version)
            .ok_or_else(|| VersionError::VersionNumberNotFound {
                file_id: file_id.to_string(),
                version,
            })
    }

    /// The active version of a file
    ///
    /// # Errors
    ///
    /// - [`VersionError::FileNotFound`] if the file has no versions
    pub fn active_version(&self, file_id: &str) -> Result<FileVersion> {
        self.store
            .active(file_id)
            .ok_or_else(|| VersionError::FileNotFound(file_id.to_string()))
    }

    /// Restore a stored version to `target_path` and record it as a new version
    ///
    /// Restore never reactivates the old record. It copies the target
    /// version's stored content to `target_path` and then creates a new version
    /// from it, tagged `restored`, which becomes active. With
    /// `options.create_backup` the content of the currently active version is
    /// first saved as its own version, tagged `backup` and `pre-restore`.
    /// Neither of these versions is deduplicated, so a restore always adds
    /// one version, or two with a backup. A `restore` event is logged.
    ///
    /// The backup is recorded before `target_path` is written, so a failed
    /// backup leaves the caller's file untouched. Pruning waits until the
    /// restored version exists, so the target's content is still in place
    /// while it is copied out. If that copy fails after a backup was taken,
    /// the backup stays as the active version.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if the target version does not exist
    /// - [`VersionError::Io`] if any copy fails
    #[instrument(skip(self, options), fields(target = %options.target_version_id))]
    pub fn restore_version(
        &self,
        file_id: &str,
        target_path: &Path,
        options: RestoreOptions,
    ) -> Result<FileVersion> {
        let lock = self.lock_for(file_id);
        let _guard = lock.lock();

        let target = self
            .store
            .get_by_id(file_id, &options.target_version_id)
            .ok_or_else(|| VersionError::VersionNotFound {
                file_id: file_id.to_string(),
                version_id: options.target_version_id.clone(),
            })?;

        info!("Restoring {} to version {}", file_id, target.version);
        self.content.stat(&target.storage_path)?;

        let mut backup_version_id = None;
        if options.create_backup {
            match self.store.active(file_id) {
                Some(active) => {
                    let backup_options = CreateVersionOptions {
                        comment: Some(format!(
                            "Backup of version {} before restoring version {}",
                            active.version, target.version
                        )),
                        created_by: options.restored_by.clone(),
                        preserve_original: true,
                        file_name: Some(active.file_name.clone()),
                        mime_type: Some(active.mime_type.clone()),
                        ..Default::default()
                    }
                    .with_tag("backup")
                    .with_tag("pre-restore")
                    .with_metadata("backup_of_version", active.version);

                    let backup =
                        self.record_version(file_id, &active.storage_path, backup_options)?;
                    debug!("Created pre-restore backup version {}", backup.version);
                    backup_version_id = Some(backup.id);
                }
                None => warn!("No active version of {} to back up", file_id),
            }
        }

        if let Some(parent) = target_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.content.mkdir_all(parent)?;
        }
        if let Err(e) = self.content.copy(&target.storage_path, target_path) {
            if backup_version_id.is_some() {
                self.prune(file_id);
            }
            return Err(e);
        }

        let mut restored_options = CreateVersionOptions {
            comment: options
                .comment
                .clone()
                .or_else(|| Some(format!("Restored from version {}", target.version))),
            created_by: options.restored_by.clone(),
            metadata: target.metadata.clone(),
            preserve_original: true,
            file_name: Some(target.file_name.clone()),
            mime_type: Some(target.mime_type.clone()),
            ..Default::default()
        }
        .with_tag("restored")
        .with_metadata("restored_from_version", target.version)
        .with_metadata("restored_from_version_id", target.id.clone());
        if let Some(id) = &backup_version_id {
            restored_options = restored_options.with_metadata("backup_version_id", id.clone());
        }

        let restored = self.create_version_locked(file_id, target_path, restored_options)?;

        let mut details = Metadata::new();
        details.insert("restored_from_version".into(), target.version.into());
        details.insert("restored_from_version_id".into(), target.id.clone().into());
        details.insert("new_version".into(), restored.version.into());
        details.insert(
            "target_path".into(),
            target_path.to_string_lossy().into_owned().into(),
        );
        if let Some(id) = backup_version_id {
            details.insert("backup_version_id".into(), id.into());
        }
        self.events.append(
            EventType::Restore,
            file_id,
            Some(&restored.id),
            options.restored_by.as_deref(),
            details,
        );

        info!(
            "Restored {} version {} as version {}",
            file_id, target.version, restored.version
        );
        Ok(restored)
    }

    /// Compare two versions of a file by number; order is up to the caller
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNumberNotFound`] if either version is missing
    pub fn compare_versions(
        &self,
        file_id: &str,
        version_a: u32,
        version_b: u32,
    ) -> Result<VersionComparison> {
        let a = self.get_version(file_id, version_a)?;
        let b = self.get_version(file_id, version_b)?;
        debug!("Comparing {} versions {} and {}", file_id, version_a, version_b);
        Ok(diff::compare(&a, &b))
    }

    /// Search versions across all files
    ///
    /// # Errors
    ///
    /// - [`VersionError::Validation`] if `date_from` is after `date_to` or `limit` is 0
    pub fn search_versions(&self, query: &SearchQuery) -> Result<SearchResult> {
        search::run(self.store.all_versions(), query)
    }

    /// Aggregate statistics across the whole store
    ///
    /// `top_files` lists up to ten files by version count, ties broken by
    /// file id in ascending order.
    pub fn get_version_stats(&self) -> VersionStats {
        let all = self.store.all_versions();
        if all.is_empty() {
            return VersionStats::default();
        }

        let mut top_files: Vec<FileVersionSummary> = all
            .chunk_by(|a, b| a.file_id == b.file_id)
            .map(|group| {
                let named = group
                    .iter()
                    .find(|v| v.is_active)
                    .or_else(|| group.last())
                    .map(|v| v.file_name.clone())
                    .unwrap_or_default();
                FileVersionSummary {
                    file_id: group[0].file_id.clone(),
                    file_name: named,
                    version_count: group.len(),
                    total_size: group.iter().map(|v| v.size).sum(),
                }
            })
            .collect();

        let total_files = top_files.len();
        let total_versions = all.len();
        let total_size = all.iter().map(|v| v.size).sum();
        let oldest_version = all.iter().map(|v| v.created_at).min();
        let newest_version = all.iter().map(|v| v.created_at).max();

        top_files.sort_by(|a, b| {
            b.version_count
                .cmp(&a.version_count)
                .then_with(|| a.file_id.cmp(&b.file_id))
        });
        top_files.truncate(TOP_FILES);

        VersionStats {
            total_files,
            total_versions,
            total_size,
            average_versions_per_file: total_versions as f64 / total_files as f64,
            oldest_version,
            newest_version,
            top_files,
        }
    }

    /// Delete an inactive version
    ///
    /// The record is removed first; its stored content is then deleted
    /// best-effort (a failure is logged, not returned). A `delete` event is
    /// logged and the removed record returned.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if the version does not exist
    /// - [`VersionError::InvalidOperation`] if the version is active
    #[instrument(skip(self))]
    pub fn delete_version(&self, file_id: &str, version_id: &str) -> Result<FileVersion> {
        let lock = self.lock_for(file_id);
        let _guard = lock.lock();

        let removed = self.store.remove(file_id, version_id)?;
        self.discard_content(&removed);

        let mut details = Metadata::new();
        details.insert("version".into(), removed.version.into());
        details.insert("file_name".into(), removed.file_name.clone().into());
        self.events
            .append(EventType::Delete, file_id, Some(&removed.id), None, details);

        info!("Deleted version {} of {}", removed.version, file_id);
        Ok(removed)
    }

    /// Re-hash a version's stored content and compare it with the record
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNumberNotFound`] if the version does not exist
    /// - [`VersionError::Io`] if the stored content cannot be read
    pub fn verify_version(&self, file_id: &str, version: u32) -> Result<VersionVerification> {
        let record = self.get_version(file_id, version)?;
        let stat = self.content.stat(&record.storage_path)?;
        let actual_checksum = checksum::hash_reader(self.content.open(&record.storage_path)?)?;

        let verification = VersionVerification {
            version_id: record.id.clone(),
            expected_checksum: record.checksum.clone(),
            actual_checksum,
            size_matches: stat.size == record.size,
        };
        if !verification.is_valid() {
            warn!("Version {} of {} failed verification", version, file_id);
        }
        Ok(verification)
    }

    /// Read the event log, oldest first
    ///
    /// With `query.limit` only the most recent matching events are returned.
    pub fn events(&self, query: &EventQuery) -> Vec<VersioningEvent> {
        let mut matched: Vec<VersioningEvent> = self
            .events
            .snapshot()
            .into_iter()
            .filter(|e| query.file_id.as_ref().map_or(true, |id| &e.file_id == id))
            .filter(|e| query.event_type.map_or(true, |t| e.event_type == t))
            .collect();

        if let Some(limit) = query.limit {
            let skip = matched.len().saturating_sub(limit);
            matched.drain(..skip);
        }
        matched
    }

    /// Every file id with at least one version, sorted
    pub fn file_ids(&self) -> Vec<String> {
        self.store.file_ids()
    }

    fn lock_for(&self, file_id: &str) -> Arc<Mutex<()>> {
        self.file_locks
            .entry(file_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Drop the lock of a file id that has no chain and no other holder
    fn release_lock(&self, file_id: &str) {
        if self.store.contains(file_id) {
            return;
        }
        if self
            .file_locks
            .remove_if(file_id, |_, lock| Arc::strong_count(lock) == 1)
            .is_some()
        {
            trace!("Released lock of {}", file_id);
        }
    }

    /// Body of [`create_version`](Self::create_version); the caller holds the file lock
    fn create_version_locked(
        &self,
        file_id: &str,
        file_path: &Path,
        options: CreateVersionOptions,
    ) -> Result<FileVersion> {
        let version = self.record_version(file_id, file_path, options)?;
        self.prune(file_id);
        Ok(version)
    }

    /// Trim the chain to `max_versions_per_file`, deleting pruned content
    fn prune(&self, file_id: &str) {
        for pruned in self.store.prune(file_id, self.config.max_versions_per_file) {
            self.discard_content(&pruned);
        }
    }

    /// Return the version of `file_id` holding `checksum`, unless dedup is off
    fn duplicate_of(
        &self,
        file_id: &str,
        checksum: &str,
        options: &CreateVersionOptions,
    ) -> Option<FileVersion> {
        if options.preserve_original {
            return None;
        }
        let existing = self.store.find_duplicate_by_checksum(file_id, checksum)?;
        debug!(
            "Content matches version {} of {}, skipping",
            existing.version, file_id
        );
        Some(existing)
    }

    /// Copy content in and append its record without pruning
    ///
    /// The recorded size and checksum describe the stored copy, so a source
    /// that changes mid-copy still yields a record that verifies.
    fn record_version(
        &self,
        file_id: &str,
        file_path: &Path,
        options: CreateVersionOptions,
    ) -> Result<FileVersion> {
        let stat = self.content.stat(file_path)?;
        let source_checksum = checksum::hash_reader(self.content.open(file_path)?)?;
        if let Some(existing) = self.duplicate_of(file_id, &source_checksum, &options) {
            return Ok(existing);
        }

        let number = self.store.next_version_number(file_id);
        let parent_version_id = self.store.active(file_id).map(|v| v.id);
        let version_id = self.ids.generate();

        let file_name = options
            .file_name
            .clone()
            .or_else(|| {
                file_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| file_id.to_string());
        let mime_type = options
            .mime_type
            .clone()
            .unwrap_or_else(|| utils::guess_mime_type(&file_name));

        let storage_path = self.storage_path_for(file_id, number, &version_id, &file_name);
        if let Some(dir) = storage_path.parent() {
            self.content.mkdir_all(dir)?;
        }
        let size = self.content.copy(file_path, &storage_path)?;

        let checksum = match self
            .content
            .open(&storage_path)
            .and_then(checksum::hash_reader)
        {
            Ok(stored) => stored,
            Err(e) => {
                self.discard_stored(&storage_path);
                return Err(e);
            }
        };
        if checksum != source_checksum {
            debug!(
                "Content of {:?} changed during copy ({} -> {} bytes)",
                file_path, stat.size, size
            );
            if let Some(existing) = self.duplicate_of(file_id, &checksum, &options) {
                self.discard_stored(&storage_path);
                return Ok(existing);
            }
        }

        let version = FileVersion {
            id: version_id,
            file_id: file_id.to_string(),
            version: number,
            file_name,
            mime_type,
            storage_path,
            size,
            checksum,
            created_at: self.clock.now(),
            created_by: options.created_by,
            comment: options.comment,
            tags: options.tags,
            metadata: options.metadata,
            is_active: true,
            parent_version_id,
        };

        if let Err(e) = self.store.append(file_id, version.clone()) {
            self.discard_content(&version);
            return Err(e);
        }

        let mut details = Metadata::new();
        details.insert("version".into(), version.version.into());
        details.insert("checksum".into(), version.checksum.clone().into());
        details.insert("size".into(), MetadataValue::Integer(version.size as i64));
        details.insert("file_name".into(), version.file_name.clone().into());
        self.events.append(
            EventType::Create,
            file_id,
            Some(&version.id),
            version.created_by.as_deref(),
            details,
        );

        info!(
            "Created version {} of {} ({})",
            version.version,
            file_id,
            utils::format_bytes(version.size)
        );

        Ok(version)
    }

    fn storage_path_for(&self, file_id: &str, number: u32, version_id: &str, file_name: &str) -> PathBuf {
        let extension = Path::new(file_name)
            .extension()
            .map(|ext| format!(".{}", utils::sanitize_component(&ext.to_string_lossy())))
            .unwrap_or_default();

        self.config
            .storage_root
            .join(utils::sanitize_component(file_id))
            .join(format!("v{}_{}{}", number, version_id, extension))
    }

    /// Best-effort removal of a version's stored content
    fn discard_content(&self, version: &FileVersion) {
        if let Err(e) = self.content.delete(&version.storage_path) {
            warn!(
                "Failed to delete content of version {} of {} at {:?}: {}",
                version.version, version.file_id, version.storage_path, e
            );
        }
    }

    /// Best-effort removal of a copy that never got a record
    fn discard_stored(&self, storage_path: &Path) {
        if let Err(e) = self.content.delete(storage_path) {
            warn!("Failed to delete unrecorded content at {:?}: {}", storage_path, e);
        }
    }
}

/// Builder for [`VersionManager`]
///
/// # Examples
///
/// ```rust,no_run
/// use verchain::VersionManagerBuilder;
/// use verchain::config::StorageLocation;
///
/// # fn main() -> verchain::Result<()> {
/// let manager = VersionManagerBuilder::new()
///     .storage_root("/srv/files/.versions")
///     .max_versions_per_file(5)
///     .storage_location(StorageLocation::Local)
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// # Default Values
///
/// - configuration: [`VersioningConfig::default`]
/// - content store: [`LocalContentStore`]
/// - clock: [`SystemClock`]
/// - id generator: [`UuidGenerator`]
#[derive(Debug, Default)]
pub struct VersionManagerBuilder {
    config: VersioningConfig,
    content: Option<Arc<dyn ContentStore>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl VersionManagerBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: VersioningConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory under which version content is stored
    pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.storage_root = root.into();
        self
    }

    /// Versions retained per file before the oldest inactive ones are pruned
    pub fn max_versions_per_file(mut self, max: usize) -> Self {
        self.config.max_versions_per_file = max;
        self
    }

    /// Advisory auto-versioning flag for callers
    pub fn auto_versioning(mut self, enabled: bool) -> Self {
        self.config.auto_versioning = enabled;
        self
    }

    /// Advisory retention in days; not enforced
    pub fn retention_days(mut self, days: u32) -> Self {
        self.config.retention_days = days;
        self
    }

    /// Advisory diff generation flag for callers
    pub fn enable_diff(mut self, enabled: bool) -> Self {
        self.config.enable_diff = enabled;
        self
    }

    /// Kind of content store in use
    pub fn storage_location(mut self, location: StorageLocation) -> Self {
        self.config.storage_location = location;
        self
    }

    /// Truncate the event log to `retain` entries once it exceeds `high_water`
    pub fn event_log_bounds(mut self, high_water: usize, retain: usize) -> Self {
        self.config.event_log_high_water = high_water;
        self.config.event_log_retain = retain;
        self
    }

    /// Use a custom content store
    pub fn content_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.content = Some(store);
        self
    }

    /// Use a custom clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a custom id generator
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Build the manager, creating the storage root if needed
    ///
    /// # Errors
    ///
    /// - [`VersionError::InvalidConfiguration`] if the configuration is invalid
    /// - [`VersionError::Io`] if the storage root cannot be created
    pub fn build(self) -> Result<VersionManager> {
        self.config.validate()?;

        let content = self
            .content
            .unwrap_or_else(|| Arc::new(LocalContentStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self.ids.unwrap_or_else(|| Arc::new(UuidGenerator));

        content.mkdir_all(&self.config.storage_root)?;

        let events = EventLog::with_bounds(
            Arc::clone(&clock),
            Arc::clone(&ids),
            self.config.event_log_high_water,
            self.config.event_log_retain,
        );

        info!(
            "Version manager ready at {:?} (max {} versions per file)",
            self.config.storage_root, self.config.max_versions_per_file
        );

        Ok(VersionManager {
            config: self.config,
            store: VersionStore::new(),
            events,
            content,
            clock,
            ids,
            file_locks: DashMap::new(),
        })
    }
}
