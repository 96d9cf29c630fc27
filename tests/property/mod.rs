//! Property-based testing for verchain
//!
//! Uses proptest to verify chain invariants across randomly generated
//! sequences of saves, restores and deletes.

use ::verchain::*;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use tempfile::TempDir;

/// One step of a generated editing session
#[derive(Debug, Clone)]
pub enum SessionOp {
    /// Write one of a small pool of contents and save it
    Save(usize),
    /// Restore the n-th version (modulo history length)
    Restore { pick: usize, backup: bool },
    /// Delete the n-th inactive version, if any
    Delete(usize),
}

/// Small pool so that identical content shows up often
fn content_pool() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        b"a".to_vec(),
        b"hello world".to_vec(),
        vec![0u8; 256],
        vec![0xff; 1024],
        b"hello world!".to_vec(),
    ]
}

fn session_op_strategy() -> impl Strategy<Value = SessionOp> {
    prop_oneof![
        6 => (0..6usize).prop_map(SessionOp::Save),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(pick, backup)| SessionOp::Restore { pick, backup }),
        1 => any::<usize>().prop_map(SessionOp::Delete),
    ]
}

fn manager_with_retention(storage: &TempDir, max_versions: usize) -> VersionManager {
    VersionManagerBuilder::new()
        .storage_root(storage.path())
        .max_versions_per_file(max_versions)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Saving only adds a version for content the chain has not seen
    #[test]
    fn dedup_one_version_per_distinct_content(
        picks in prop::collection::vec(0..6usize, 1..25)
    ) {
        let work = TempDir::new().unwrap();
        let storage = TempDir::new().unwrap();
        let manager = manager_with_retention(&storage, 1_000);
        let pool = content_pool();
        let path = work.path().join("doc.bin");

        let mut first_seen: HashMap<usize, String> = HashMap::new();
        for pick in &picks {
            fs::write(&path, &pool[*pick]).unwrap();
            let version = manager.create_version("doc", &path, Default::default()).unwrap();
            let id = first_seen.entry(*pick).or_insert_with(|| version.id.clone()).clone();
            prop_assert_eq!(&version.id, &id);
        }

        let distinct: BTreeSet<usize> = picks.iter().copied().collect();
        let history = manager.get_version_history("doc").unwrap();
        prop_assert_eq!(history.total_versions, distinct.len());
        let numbers: Vec<u32> = history.versions.iter().rev().map(|v| v.version).collect();
        let expected: Vec<u32> = (1..=distinct.len() as u32).collect();
        prop_assert_eq!(numbers, expected);
    }

    /// Pruning keeps the newest versions and never exceeds the limit
    #[test]
    fn prune_keeps_newest(
        count in 1..20usize,
        max_versions in 1..8usize
    ) {
        let work = TempDir::new().unwrap();
        let storage = TempDir::new().unwrap();
        let manager = manager_with_retention(&storage, max_versions);
        let path = work.path().join("log.txt");

        let mut created = Vec::new();
        for i in 0..count {
            fs::write(&path, format!("entry {}", i)).unwrap();
            created.push(manager.create_version("log", &path, Default::default()).unwrap());
        }

        let history = manager.get_version_history("log").unwrap();
        let kept = count.min(max_versions);
        prop_assert_eq!(history.total_versions, kept);
        prop_assert_eq!(history.current_version, count as u32);

        let retained: Vec<u32> = history.versions.iter().map(|v| v.version).collect();
        let expected: Vec<u32> = ((count - kept + 1) as u32..=count as u32).rev().collect();
        prop_assert_eq!(retained, expected);

        for version in &created[..count - kept] {
            prop_assert!(!version.storage_path.exists());
        }
    }

    /// Any session leaves exactly one active version, the newest, with intact content
    #[test]
    fn chain_invariants_hold(
        ops in prop::collection::vec(session_op_strategy(), 1..30),
        max_versions in 2..10usize
    ) {
        let work = TempDir::new().unwrap();
        let storage = TempDir::new().unwrap();
        let manager = manager_with_retention(&storage, max_versions);
        let pool = content_pool();
        let path = work.path().join("doc.bin");
        let mut highest = 0u32;

        for op in &ops {
            let history = manager.get_version_history("doc").ok();
            match (op, history) {
                (SessionOp::Save(pick), _) => {
                    fs::write(&path, &pool[*pick]).unwrap();
                    manager.create_version("doc", &path, Default::default()).unwrap();
                }
                (SessionOp::Restore { pick, backup }, Some(history)) => {
                    let target = &history.versions[pick % history.versions.len()];
                    let before = history.total_versions;
                    let mut options = RestoreOptions::new(target.id.clone());
                    options.create_backup = *backup;
                    let restored = manager.restore_version("doc", &path, options).unwrap();

                    let added = if *backup { 2 } else { 1 };
                    prop_assert_eq!(restored.version, highest + added);
                    let after = manager.get_version_history("doc").unwrap().total_versions;
                    prop_assert_eq!(after, (before + added as usize).min(max_versions));
                }
                (SessionOp::Delete(pick), Some(history)) => {
                    let inactive: Vec<&FileVersion> =
                        history.versions.iter().filter(|v| !v.is_active).collect();
                    if !inactive.is_empty() {
                        let target = inactive[pick % inactive.len()];
                        manager.delete_version("doc", &target.id).unwrap();
                    }
                }
                _ => {}
            }

            if let Ok(history) = manager.get_version_history("doc") {
                let active: Vec<&FileVersion> =
                    history.versions.iter().filter(|v| v.is_active).collect();
                prop_assert_eq!(active.len(), 1);
                prop_assert_eq!(active[0].version, history.versions[0].version);
                prop_assert!(history.versions[0].version >= highest);
                prop_assert!(history.total_versions <= max_versions);
                highest = history.versions[0].version;

                for version in &history.versions {
                    let report = manager.verify_version("doc", version.version).unwrap();
                    prop_assert!(report.is_valid());
                }
            }
        }
    }

    /// Similarity is symmetric, bounded and exactly 1 for identical content
    #[test]
    fn similarity_properties(
        a in prop::collection::vec(any::<u8>(), 0..512),
        b in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let work = TempDir::new().unwrap();
        let storage = TempDir::new().unwrap();
        let manager = manager_with_retention(&storage, 10);
        let path = work.path().join("x.bin");

        fs::write(&path, &a).unwrap();
        let first = manager.create_version("x", &path, Default::default()).unwrap();
        fs::write(&path, &b).unwrap();
        let second = manager.create_version("x", &path, Default::default()).unwrap();

        let forward = manager.compare_versions("x", first.version, second.version).unwrap();
        let backward = manager.compare_versions("x", second.version, first.version).unwrap();

        prop_assert!((0.0..=1.0).contains(&forward.similarity));
        prop_assert_eq!(forward.similarity, backward.similarity);
        if a == b {
            prop_assert_eq!(forward.similarity, 1.0);
            prop_assert!(forward.changes.is_empty());
        } else {
            prop_assert!(forward.changes.iter().any(|c| c.path.as_deref() == Some("content")));
        }
    }

    /// Search pages partition the full result set
    #[test]
    fn search_pages_partition_results(
        files in 1..5usize,
        saves in 1..6usize,
        page in 1..7usize
    ) {
        let work = TempDir::new().unwrap();
        let storage = TempDir::new().unwrap();
        let manager = manager_with_retention(&storage, 100);
        let path = work.path().join("f.txt");

        for f in 0..files {
            for s in 0..saves {
                fs::write(&path, format!("{}:{}", f, s)).unwrap();
                manager.create_version(&format!("file-{}", f), &path, Default::default()).unwrap();
            }
        }

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let result = manager.search_versions(&SearchQuery {
                sort_by: SortField::Version,
                sort_order: SortOrder::Asc,
                offset,
                limit: page,
                ..Default::default()
            }).unwrap();
            prop_assert_eq!(result.total, files * saves);
            seen.extend(result.versions.iter().map(|v| v.id.clone()));
            offset += page;
            if !result.has_more {
                break;
            }
        }

        let unique: BTreeSet<String> = seen.iter().cloned().collect();
        prop_assert_eq!(seen.len(), files * saves);
        prop_assert_eq!(unique.len(), files * saves);
    }
}
