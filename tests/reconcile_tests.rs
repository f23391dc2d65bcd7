//! Local directory preparation scenarios.

use perforce_tools::sync::{prepare, DirectoryState, ReconcileError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn entry_count(path: &Path) -> usize {
    walkdir::WalkDir::new(path)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .count()
}

/// A workspace left behind by an earlier sync
fn populated_workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("old.txt"), "old").unwrap();
    fs::create_dir_all(temp.path().join("src").join("engine")).unwrap();
    fs::write(temp.path().join("src").join("engine").join("core.cpp"), "// core").unwrap();
    fs::create_dir(temp.path().join("empty")).unwrap();
    temp
}

#[test]
fn test_non_empty_without_force_is_refused() {
    let temp = populated_workspace();
    let before = entry_count(temp.path());

    let err = prepare(temp.path(), false).unwrap_err();

    assert!(matches!(err, ReconcileError::DirectoryNotEmpty(ref p) if p == temp.path()));
    assert!(err.to_string().contains("--force"));
    assert!(temp.path().join("old.txt").exists());
    assert_eq!(entry_count(temp.path()), before);
}

#[test]
fn test_non_empty_with_force_is_cleared() {
    let temp = populated_workspace();

    let state = prepare(temp.path(), true).unwrap();

    assert_eq!(state, DirectoryState::NonEmptyDirectory);
    assert!(temp.path().is_dir());
    assert_eq!(entry_count(temp.path()), 0);
}

#[test]
fn test_empty_directory_is_idempotent() {
    let temp = TempDir::new().unwrap();

    assert_eq!(prepare(temp.path(), false).unwrap(), DirectoryState::EmptyDirectory);
    assert_eq!(prepare(temp.path(), false).unwrap(), DirectoryState::EmptyDirectory);
    assert_eq!(prepare(temp.path(), true).unwrap(), DirectoryState::EmptyDirectory);
    assert!(temp.path().is_dir());
    assert_eq!(entry_count(temp.path()), 0);
}

#[test]
fn test_missing_directory_is_created() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("streams").join("dev");

    assert_eq!(prepare(&target, false).unwrap(), DirectoryState::Missing);
    assert!(target.is_dir());
    assert_eq!(prepare(&target, false).unwrap(), DirectoryState::EmptyDirectory);
}

#[test]
fn test_file_is_never_a_target() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("notes.txt");
    fs::write(&file, "keep me").unwrap();

    for force in [false, true] {
        let err = prepare(&file, force).unwrap_err();
        assert!(matches!(err, ReconcileError::NotADirectory(_)));
    }
    assert_eq!(fs::read_to_string(&file).unwrap(), "keep me");
}
