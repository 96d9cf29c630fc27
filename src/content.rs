//! Content storage backend
//!
//! The version manager never touches the filesystem directly. It goes through
//! a [`ContentStore`], which exposes the handful of primitives versioning
//! needs: open/read, copy, stat, delete and recursive directory creation.
//!
//! [`LocalContentStore`] implements the trait on top of `std::fs`. Copies are
//! written to a temporary file in the destination directory and then renamed
//! into place, so a version's storage path either holds the complete content
//! or does not exist.
//!
//! ## Example
//!
//! ```rust,no_run
//! use verchain::content::{ContentStore, LocalContentStore};
//! use std::path::Path;
//!
//! # fn example() -> verchain::Result<()> {
//! let store = LocalContentStore::new();
//! let copied = store.copy(Path::new("report.pdf"), Path::new("versions/report/v1.pdf"))?;
//! assert_eq!(store.stat(Path::new("versions/report/v1.pdf"))?.size, copied);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::trace;

/// Size information about stored content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentStat {
    /// Length in bytes
    pub size: u64,
}

/// Filesystem-like content backend used by the version manager
///
/// Every failure surfaces as [`VersionError::Io`](crate::VersionError::Io).
/// Implementations must be safe to share between threads.
pub trait ContentStore: Send + Sync + Debug {
    /// Open content for streaming reads
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// Copy `src` to `dst`, returning the number of bytes written
    fn copy(&self, src: &Path, dst: &Path) -> Result<u64>;

    /// Stat content
    fn stat(&self, path: &Path) -> Result<ContentStat>;

    /// Delete content
    fn delete(&self, path: &Path) -> Result<()>;

    /// Create a directory and all missing parents
    fn mkdir_all(&self, path: &Path) -> Result<()>;

    /// Read content fully into memory
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let mut reader = self.open(path)?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Content store backed by the local filesystem
#[derive(Debug, Clone, Default)]
pub struct LocalContentStore;

impl LocalContentStore {
    /// Create a local store
    pub fn new() -> Self {
        Self
    }
}

impl ContentStore for LocalContentStore {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<u64> {
        let parent = match dst.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut source = File::open(src)?;
        let mut temp = NamedTempFile::new_in(parent)?;
        let written = io::copy(&mut source, temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        temp.persist(dst).map_err(|e| e.error)?;

        trace!("Copied {} bytes {:?} -> {:?}", written, src, dst);
        Ok(written)
    }

    fn stat(&self, path: &Path) -> Result<ContentStat> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }
        Ok(ContentStat { size: metadata.len() })
    }

    fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        trace!("Deleted {:?}", path);
        Ok(())
    }

    fn mkdir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }
}
