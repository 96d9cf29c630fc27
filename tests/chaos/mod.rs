//! Chaos testing for verchain
//!
//! Exercises the manager under adverse conditions: concurrent writers on the
//! same file, storage backends that fail at the worst moment, and stored
//! content corrupted behind the manager's back.

use ::verchain::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use tracing::info;

/// Fault injection modes for [`FaultyContentStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every delete fails
    Delete,
    /// Copies fail once the budget of successful copies is used up
    CopyAfter(usize),
}

/// Local store that injects failures
#[derive(Debug)]
pub struct FaultyContentStore {
    inner: LocalContentStore,
    fault: Fault,
    copies: AtomicUsize,
    pub failed_deletes: AtomicUsize,
}

impl FaultyContentStore {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: LocalContentStore::new(),
            fault,
            copies: AtomicUsize::new(0),
            failed_deletes: AtomicUsize::new(0),
        }
    }
}

impl ContentStore for FaultyContentStore {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.inner.open(path)
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<u64> {
        if let Fault::CopyAfter(budget) = self.fault {
            if self.copies.fetch_add(1, Ordering::SeqCst) >= budget {
                return Err(io::Error::other("injected copy failure").into());
            }
        }
        self.inner.copy(src, dst)
    }

    fn stat(&self, path: &Path) -> Result<ContentStat> {
        self.inner.stat(path)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        if self.fault == Fault::Delete {
            self.failed_deletes.fetch_add(1, Ordering::SeqCst);
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected delete failure").into());
        }
        self.inner.delete(path)
    }

    fn mkdir_all(&self, path: &Path) -> Result<()> {
        self.inner.mkdir_all(path)
    }
}

/// Local store whose sources get rewritten while they are being copied
#[derive(Debug)]
pub struct RacingContentStore {
    inner: LocalContentStore,
    rewrite_to: Vec<u8>,
}

impl RacingContentStore {
    pub fn new(rewrite_to: &[u8]) -> Self {
        Self {
            inner: LocalContentStore::new(),
            rewrite_to: rewrite_to.to_vec(),
        }
    }
}

impl ContentStore for RacingContentStore {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.inner.open(path)
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<u64> {
        if src.file_name().is_some_and(|name| name == "racy.txt") {
            fs::write(src, &self.rewrite_to)?;
        }
        self.inner.copy(src, dst)
    }

    fn stat(&self, path: &Path) -> Result<ContentStat> {
        self.inner.stat(path)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.inner.delete(path)
    }

    fn mkdir_all(&self, path: &Path) -> Result<()> {
        self.inner.mkdir_all(path)
    }
}

/// Chaos testing fixture
pub struct ChaosFixture {
    pub work_dir: TempDir,
    pub storage_dir: TempDir,
    pub manager: Arc<VersionManager>,
}

impl ChaosFixture {
    pub fn new(max_versions: usize) -> Self {
        Self::with_store(max_versions, Arc::new(LocalContentStore::new()))
    }

    pub fn with_store(max_versions: usize, store: Arc<dyn ContentStore>) -> Self {
        let work_dir = TempDir::new().unwrap();
        let storage_dir = TempDir::new().unwrap();
        let manager = VersionManagerBuilder::new()
            .storage_root(storage_dir.path())
            .max_versions_per_file(max_versions)
            .content_store(store)
            .build()
            .unwrap();

        Self {
            work_dir,
            storage_dir,
            manager: Arc::new(manager),
        }
    }

    /// Write content to a fresh working file and return its path
    pub fn write(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.work_dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Flip one random byte of a stored file, or fill it if empty
    pub fn corrupt(&self, path: &Path, rng: &mut StdRng) {
        let mut bytes = fs::read(path).unwrap();
        if bytes.is_empty() {
            fs::write(path, b"garbage").unwrap();
            return;
        }
        let idx = rng.random_range(0..bytes.len());
        bytes[idx] ^= rng.random_range(1..=255u8);
        fs::write(path, &bytes).unwrap();
    }
}

/// Assert the chain invariants that must survive any interleaving
pub fn assert_chain_consistent(manager: &VersionManager, file_id: &str) {
    let history = manager.get_version_history(file_id).unwrap();
    let active: Vec<&FileVersion> = history.versions.iter().filter(|v| v.is_active).collect();
    assert_eq!(active.len(), 1, "exactly one active version of {}", file_id);
    assert_eq!(active[0].version, history.versions[0].version);

    let mut numbers: Vec<u32> = history.versions.iter().map(|v| v.version).collect();
    let len = numbers.len();
    numbers.dedup();
    assert_eq!(numbers.len(), len, "duplicate version numbers in {}", file_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_concurrent_creates_same_file() {
        let fixture = ChaosFixture::new(1_000);
        let threads = 8;
        let per_thread = 10;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let manager = Arc::clone(&fixture.manager);
                let dir = fixture.work_dir.path().to_path_buf();
                thread::spawn(move || {
                    let mut created = Vec::new();
                    for i in 0..per_thread {
                        let path = dir.join(format!("t{}-{}.txt", t, i));
                        fs::write(&path, format!("thread {} write {}", t, i)).unwrap();
                        created.push(
                            manager
                                .create_version("shared", &path, CreateVersionOptions::default())
                                .unwrap()
                                .version,
                        );
                    }
                    created
                })
            })
            .collect();

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        let expected: Vec<u32> = (1..=(threads * per_thread) as u32).collect();
        assert_eq!(all, expected);
        assert_chain_consistent(&fixture.manager, "shared");

        let events = fixture.manager.events(&EventQuery::default());
        assert_eq!(events.len(), threads * per_thread);
    }

    #[test]
    #[traced_test]
    fn test_concurrent_mixed_operations() {
        let fixture = ChaosFixture::new(5);
        let seed_path = fixture.write("seed.txt", b"seed");
        for file_id in ["a", "b"] {
            fixture
                .manager
                .create_version(file_id, &seed_path, Default::default())
                .unwrap();
        }

        let handles: Vec<_> = (0..6u64)
            .map(|t| {
                let manager = Arc::clone(&fixture.manager);
                let dir = fixture.work_dir.path().to_path_buf();
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(t);
                    let file_id = if t % 2 == 0 { "a" } else { "b" };
                    let work = dir.join(format!("worker-{}.bin", t));

                    for i in 0..25 {
                        match rng.random_range(0..3) {
                            0 => {
                                fs::write(&work, format!("{} {} {}", t, i, rng.random::<u32>())).unwrap();
                                manager.create_version(file_id, &work, Default::default()).unwrap();
                            }
                            1 => {
                                let history = manager.get_version_history(file_id).unwrap();
                                let target = &history.versions[rng.random_range(0..history.versions.len())];
                                let mut options = RestoreOptions::new(target.id.clone());
                                options.create_backup = rng.random_bool(0.5);
                                // Another worker may prune the target first
                                if let Err(e) = manager.restore_version(file_id, &work, options) {
                                    assert!(e.is_not_found(), "unexpected restore error: {}", e);
                                }
                            }
                            _ => {
                                let history = manager.get_version_history(file_id).unwrap();
                                if let Some(target) = history.versions.iter().find(|v| !v.is_active) {
                                    match manager.delete_version(file_id, &target.id) {
                                        Ok(_) => {}
                                        Err(e) => assert!(
                                            e.is_not_found() || e.is_invalid_operation(),
                                            "unexpected delete error: {}",
                                            e
                                        ),
                                    }
                                }
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for file_id in ["a", "b"] {
            assert_chain_consistent(&fixture.manager, file_id);
            let history = fixture.manager.get_version_history(file_id).unwrap();
            assert!(history.total_versions <= 5);
            for version in &history.versions {
                assert!(fixture
                    .manager
                    .verify_version(file_id, version.version)
                    .unwrap()
                    .is_valid());
            }
        }
    }

    #[test]
    #[traced_test]
    fn test_failed_content_deletes_are_best_effort() {
        let store = Arc::new(FaultyContentStore::new(Fault::Delete));
        let fixture = ChaosFixture::with_store(2, store.clone());

        let mut versions = Vec::new();
        for i in 0..4 {
            let path = fixture.write("doc.txt", format!("revision {}", i).as_bytes());
            versions.push(fixture.manager.create_version("doc", &path, Default::default()).unwrap());
        }

        // Pruning dropped the records even though their content stayed behind
        let history = fixture.manager.get_version_history("doc").unwrap();
        assert_eq!(history.total_versions, 2);
        assert!(versions[0].storage_path.exists());
        assert_eq!(store.failed_deletes.load(Ordering::SeqCst), 2);

        fixture.manager.delete_version("doc", &versions[2].id).unwrap();
        assert_eq!(fixture.manager.get_version_history("doc").unwrap().total_versions, 1);
        assert_eq!(store.failed_deletes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_copy_failure_leaves_chain_untouched() {
        let store = Arc::new(FaultyContentStore::new(Fault::CopyAfter(2)));
        let fixture = ChaosFixture::with_store(10, store);

        let path = fixture.write("doc.txt", b"one");
        let v1 = fixture.manager.create_version("doc", &path, Default::default()).unwrap();
        fs::write(&path, b"two").unwrap();
        fixture.manager.create_version("doc", &path, Default::default()).unwrap();

        fs::write(&path, b"three").unwrap();
        let err = fixture
            .manager
            .create_version("doc", &path, Default::default())
            .unwrap_err();
        assert!(matches!(err, VersionError::Io(_)));

        let err = fixture
            .manager
            .restore_version("doc", &path, RestoreOptions::new(v1.id.clone()).with_backup())
            .unwrap_err();
        assert!(matches!(err, VersionError::Io(_)));

        let history = fixture.manager.get_version_history("doc").unwrap();
        assert_eq!(history.total_versions, 2);
        assert_eq!(history.current_version, 2);
        assert_eq!(fixture.manager.events(&EventQuery::default()).len(), 2);
    }

    #[test]
    fn test_source_rewritten_during_copy() {
        let fixture = ChaosFixture::with_store(10, Arc::new(RacingContentStore::new(b"written mid-copy")));
        let path = fixture.write("racy.txt", b"content before the copy");

        let version = fixture.manager.create_version("racy", &path, Default::default()).unwrap();
        assert_eq!(version.checksum, checksum::hash_file(&version.storage_path).unwrap());
        assert_eq!(version.size, fs::metadata(&version.storage_path).unwrap().len());
        assert!(fixture.manager.verify_version("racy", version.version).unwrap().is_valid());

        // The rewritten content matches the stored version, so the next save dedups
        fs::write(&path, b"something else entirely").unwrap();
        let again = fixture.manager.create_version("racy", &path, Default::default()).unwrap();
        assert_eq!(again.id, version.id);
        assert_eq!(fixture.manager.get_version_history("racy").unwrap().total_versions, 1);

        let stored = fs::read_dir(version.storage_path.parent().unwrap()).unwrap().count();
        assert_eq!(stored, 1);
    }

    #[test]
    fn test_missing_content_fails_restore_without_side_effects() {
        let fixture = ChaosFixture::new(10);
        let path = fixture.write("doc.txt", b"first");
        let v1 = fixture.manager.create_version("doc", &path, Default::default()).unwrap();
        fs::write(&path, b"second").unwrap();
        fixture.manager.create_version("doc", &path, Default::default()).unwrap();

        fs::remove_file(&v1.storage_path).unwrap();
        let err = fixture
            .manager
            .restore_version("doc", &path, RestoreOptions::new(v1.id.clone()).with_backup())
            .unwrap_err();
        assert!(matches!(err, VersionError::Io(_)));

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fixture.manager.get_version_history("doc").unwrap().total_versions, 2);
    }

    #[test]
    fn test_corruption_detected() {
        let fixture = ChaosFixture::new(20);
        let mut rng = StdRng::seed_from_u64(99);

        let mut versions = Vec::new();
        for i in 0..10 {
            let size = rng.random_range(1..4_096);
            let content: Vec<u8> = (0..size).map(|_| rng.random()).collect();
            let path = fixture.write(&format!("blob-{}.bin", i), &content);
            versions.push(fixture.manager.create_version("blob", &path, Default::default()).unwrap());
        }

        let mut corrupted = Vec::new();
        for version in &versions {
            if rng.random_bool(0.4) {
                fixture.corrupt(&version.storage_path, &mut rng);
                corrupted.push(version.version);
            }
        }
        info!("Corrupted {} of {} versions", corrupted.len(), versions.len());

        for version in &versions {
            let report = fixture.manager.verify_version("blob", version.version).unwrap();
            assert_eq!(
                !report.is_valid(),
                corrupted.contains(&version.version),
                "version {} misreported",
                version.version
            );
        }
    }
}
