//! In-memory version store
//!
//! [`VersionStore`] owns the version list of every file id and is the only
//! component that mutates it. It enforces the chain invariants:
//!
//! - version numbers per file strictly increase
//! - at most one version per file is active
//! - the active version can be neither removed nor pruned
//!
//! ## Thread Safety
//!
//! Lists live in a `DashMap` keyed by file id, so each operation is atomic
//! with respect to one file's list and operations on different files do not
//! contend. Sequences of operations that must appear atomic (compute the next
//! number, copy content, append) need external per-file serialization, which
//! the [`VersionManager`](crate::VersionManager) provides.
//!
//! State is not persisted: dropping the store drops all history.

use crate::error::{Result, VersionError};
use crate::types::FileVersion;
use dashmap::DashMap;
use tracing::{debug, trace};

/// Concurrent map from file id to that file's versions
#[derive(Debug, Default)]
pub struct VersionStore {
    chains: DashMap<String, Vec<FileVersion>>,
}

impl VersionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            chains: DashMap::new(),
        }
    }

    /// Next version number for a file: highest existing number plus one, or 1
    pub fn next_version_number(&self, file_id: &str) -> u32 {
        self.chains
            .get(file_id)
            .and_then(|chain| chain.iter().map(|v| v.version).max())
            .map_or(1, |max| max + 1)
    }

    /// Append a version as the new active version of its file
    ///
    /// All existing versions of the file are deactivated first.
    ///
    /// # Errors
    ///
    /// - [`VersionError::InvalidOperation`] if `version.file_id` differs from
    ///   `file_id` or the version number does not exceed the current maximum
    pub fn append(&self, file_id: &str, mut version: FileVersion) -> Result<()> {
        if version.file_id != file_id {
            return Err(VersionError::invalid_operation(format!(
                "Version belongs to file {}, not {}",
                version.file_id, file_id
            )));
        }

        let mut chain = self.chains.entry(file_id.to_string()).or_default();
        if let Some(max) = chain.iter().map(|v| v.version).max() {
            if version.version <= max {
                return Err(VersionError::invalid_operation(format!(
                    "Version number {} for {} must be greater than {}",
                    version.version, file_id, max
                )));
            }
        }

        for existing in chain.iter_mut() {
            existing.is_active = false;
        }
        version.is_active = true;

        trace!("Appending version {} to {}", version.version, file_id);
        chain.push(version);
        Ok(())
    }

    /// Find a version of the file with the given checksum
    pub fn find_duplicate_by_checksum(&self, file_id: &str, checksum: &str) -> Option<FileVersion> {
        self.chains
            .get(file_id)
            .and_then(|chain| chain.iter().find(|v| v.checksum == checksum).cloned())
    }

    /// All versions of a file, in insertion order
    ///
    /// # Errors
    ///
    /// - [`VersionError::FileNotFound`] if the file has no versions
    pub fn list(&self, file_id: &str) -> Result<Vec<FileVersion>> {
        match self.chains.get(file_id) {
            Some(chain) if !chain.is_empty() => Ok(chain.clone()),
            _ => Err(VersionError::FileNotFound(file_id.to_string())),
        }
    }

    /// Look up a version by number
    pub fn get(&self, file_id: &str, version: u32) -> Option<FileVersion> {
        self.chains
            .get(file_id)
            .and_then(|chain| chain.iter().find(|v| v.version == version).cloned())
    }

    /// Look up a version by id
    pub fn get_by_id(&self, file_id: &str, version_id: &str) -> Option<FileVersion> {
        self.chains
            .get(file_id)
            .and_then(|chain| chain.iter().find(|v| v.id == version_id).cloned())
    }

    /// The active version of a file
    pub fn active(&self, file_id: &str) -> Option<FileVersion> {
        self.chains
            .get(file_id)
            .and_then(|chain| chain.iter().find(|v| v.is_active).cloned())
    }

    /// Remove an inactive version and return it for content cleanup
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if the version does not exist
    /// - [`VersionError::InvalidOperation`] if the version is active
    pub fn remove(&self, file_id: &str, version_id: &str) -> Result<FileVersion> {
        let not_found = || VersionError::VersionNotFound {
            file_id: file_id.to_string(),
            version_id: version_id.to_string(),
        };

        let removed = {
            let mut chain = self.chains.get_mut(file_id).ok_or_else(not_found)?;
            let idx = chain
                .iter()
                .position(|v| v.id == version_id)
                .ok_or_else(not_found)?;

            if chain[idx].is_active {
                return Err(VersionError::invalid_operation(format!(
                    "Cannot delete the active version {} of {}",
                    chain[idx].version, file_id
                )));
            }
            chain.remove(idx)
        };

        self.chains.remove_if(file_id, |_, chain| chain.is_empty());
        debug!("Removed version {} of {}", removed.version, file_id);
        Ok(removed)
    }

    /// Drop the oldest inactive versions until at most `max_versions` remain
    ///
    /// Candidates are taken in ascending version order. The active version is
    /// never removed, so a file may stay above the limit only if every
    /// remaining version is active (at most one). Returns the removed records
    /// so the caller can delete their content.
    pub fn prune(&self, file_id: &str, max_versions: usize) -> Vec<FileVersion> {
        let Some(mut chain) = self.chains.get_mut(file_id) else {
            return Vec::new();
        };
        if chain.len() <= max_versions {
            return Vec::new();
        }

        let excess = chain.len() - max_versions;
        let mut candidates: Vec<(u32, String)> = chain
            .iter()
            .filter(|v| !v.is_active)
            .map(|v| (v.version, v.id.clone()))
            .collect();
        candidates.sort_by_key(|(number, _)| *number);
        candidates.truncate(excess);

        let mut removed = Vec::with_capacity(candidates.len());
        for (_, id) in candidates {
            if let Some(idx) = chain.iter().position(|v| v.id == id) {
                removed.push(chain.remove(idx));
            }
        }

        if !removed.is_empty() {
            debug!(
                "Pruned {} versions of {} (limit {})",
                removed.len(),
                file_id,
                max_versions
            );
        }
        removed
    }

    /// Whether the file has any versions
    pub fn contains(&self, file_id: &str) -> bool {
        self.chains.get(file_id).is_some_and(|chain| !chain.is_empty())
    }

    /// Every file id with at least one version, sorted
    pub fn file_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.chains.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Every version of every file, ordered by file id then version number
    pub fn all_versions(&self) -> Vec<FileVersion> {
        let mut all: Vec<FileVersion> = self
            .chains
            .iter()
            .flat_map(|e| e.value().clone())
            .collect();
        all.sort_by(|a, b| a.file_id.cmp(&b.file_id).then(a.version.cmp(&b.version)));
        all
    }

    /// Number of files with versions
    pub fn file_count(&self) -> usize {
        self.chains.len()
    }

    /// Number of versions across all files
    pub fn version_count(&self) -> usize {
        self.chains.iter().map(|e| e.value().len()).sum()
    }
}
