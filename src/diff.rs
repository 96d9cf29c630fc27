//! Version comparison
//!
//! Compares two versions of the same file at record level. The comparison is
//! deliberately coarse: stored bytes are never inspected beyond their checksum
//! and size.
//!
//! ## Change entries
//!
//! Entries are emitted in a fixed order:
//!
//! 1. `size` - `Modified` with old/new sizes when they differ
//! 2. `content` - a single `Modified` flag when checksums differ
//! 3. `metadata.<key>` - key-wise diff over both metadata maps, in key order
//!
//! ## Similarity
//!
//! Exactly `1.0` for identical checksums (and for two empty files). Otherwise
//! `max(0, 1 - |a - b| / max(a, b))` over the two sizes.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use verchain::diff::compare;
//! # use verchain::FileVersion;
//! # fn example(v1: &FileVersion, v2: &FileVersion) {
//! let comparison = compare(v1, v2);
//! for change in &comparison.changes {
//!     println!("{:?} {:?}: {}", change.kind, change.path, change.description);
//! }
//! println!("similarity {:.2}", comparison.similarity);
//! # }
//! ```

use crate::types::{ChangeKind, FileVersion, MetadataValue, VersionChange, VersionComparison};
use crate::utils::format_bytes;

/// Compare two versions; `from` and `to` may be passed in either order
pub fn compare(from: &FileVersion, to: &FileVersion) -> VersionComparison {
    VersionComparison {
        file_id: from.file_id.clone(),
        from: from.clone(),
        to: to.clone(),
        changes: compute_changes(from, to),
        similarity: similarity(from, to),
    }
}

/// Ordered list of differences between two versions
pub fn compute_changes(from: &FileVersion, to: &FileVersion) -> Vec<VersionChange> {
    let mut changes = Vec::new();

    if from.size != to.size {
        changes.push(VersionChange {
            kind: ChangeKind::Modified,
            path: Some("size".to_string()),
            old_value: Some(size_value(from.size)),
            new_value: Some(size_value(to.size)),
            description: format!(
                "File size changed from {} to {}",
                format_bytes(from.size),
                format_bytes(to.size)
            ),
        });
    }

    if from.checksum != to.checksum {
        changes.push(VersionChange {
            kind: ChangeKind::Modified,
            path: Some("content".to_string()),
            old_value: None,
            new_value: None,
            description: "File content changed".to_string(),
        });
    }

    // Both maps are ordered, so a merge walk yields keys in sorted order
    let mut old_iter = from.metadata.iter().peekable();
    let mut new_iter = to.metadata.iter().peekable();
    loop {
        match (old_iter.peek(), new_iter.peek()) {
            (Some(&(old_key, old_value)), Some(&(new_key, new_value))) => {
                if old_key < new_key {
                    changes.push(removed(old_key, old_value));
                    old_iter.next();
                } else if new_key < old_key {
                    changes.push(added(new_key, new_value));
                    new_iter.next();
                } else {
                    if old_value.to_string() != new_value.to_string() {
                        changes.push(modified(old_key, old_value, new_value));
                    }
                    old_iter.next();
                    new_iter.next();
                }
            }
            (Some(&(key, value)), None) => {
                changes.push(removed(key, value));
                old_iter.next();
            }
            (None, Some(&(key, value))) => {
                changes.push(added(key, value));
                new_iter.next();
            }
            (None, None) => break,
        }
    }

    changes
}

/// Size-based similarity score in `[0, 1]`
pub fn similarity(a: &FileVersion, b: &FileVersion) -> f64 {
    if a.checksum == b.checksum {
        return 1.0;
    }

    let larger = a.size.max(b.size);
    if larger == 0 {
        return 1.0;
    }

    let delta = a.size.abs_diff(b.size) as f64;
    (1.0 - delta / larger as f64).max(0.0)
}

fn size_value(size: u64) -> MetadataValue {
    MetadataValue::Integer(i64::try_from(size).unwrap_or(i64::MAX))
}

fn added(key: &str, value: &MetadataValue) -> VersionChange {
    VersionChange {
        kind: ChangeKind::Added,
        path: Some(format!("metadata.{}", key)),
        old_value: None,
        new_value: Some(value.clone()),
        description: format!("Metadata '{}' added", key),
    }
}

fn removed(key: &str, value: &MetadataValue) -> VersionChange {
    VersionChange {
        kind: ChangeKind::Removed,
        path: Some(format!("metadata.{}", key)),
        old_value: Some(value.clone()),
        new_value: None,
        description: format!("Metadata '{}' removed", key),
    }
}

fn modified(key: &str, old: &MetadataValue, new: &MetadataValue) -> VersionChange {
    VersionChange {
        kind: ChangeKind::Modified,
        path: Some(format!("metadata.{}", key)),
        old_value: Some(old.clone()),
        new_value: Some(new.clone()),
        description: format!("Metadata '{}' changed from '{}' to '{}'", key, old, new),
    }
}
