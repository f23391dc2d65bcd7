//! Preparation of the local target directory before a sync.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Workspace path '{}' exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error(
        "Workspace directory '{}' is not empty. Use --force to clear it before syncing.",
        .0.display()
    )]
    DirectoryNotEmpty(PathBuf),

    #[error("Failed to prepare '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What the target path looked like before preparation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryState {
    /// Did not exist and was created
    Missing,
    EmptyDirectory,
    /// Had entries, which were removed (force only)
    NonEmptyDirectory,
    NotADirectory,
}

impl fmt::Display for DirectoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DirectoryState::Missing => "missing",
            DirectoryState::EmptyDirectory => "empty directory",
            DirectoryState::NonEmptyDirectory => "non-empty directory",
            DirectoryState::NotADirectory => "not a directory",
        };
        f.write_str(text)
    }
}

/// Classify `path` without touching it
pub fn inspect(path: &Path) -> Result<DirectoryState, ReconcileError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DirectoryState::Missing),
        Err(source) => return Err(io_error(path, source)),
    };

    if !metadata.is_dir() {
        return Ok(DirectoryState::NotADirectory);
    }

    let mut entries = fs::read_dir(path).map_err(|e| io_error(path, e))?;
    Ok(match entries.next() {
        None => DirectoryState::EmptyDirectory,
        Some(_) => DirectoryState::NonEmptyDirectory,
    })
}

/// Make `path` an existing, empty directory.
///
/// A missing path is created with its parents. A non-empty directory is
/// rejected unless `force` is set, in which case every entry under it is
/// removed while `path` itself is kept. The first entry that cannot be
/// removed aborts preparation.
pub fn prepare(path: &Path, force: bool) -> Result<DirectoryState, ReconcileError> {
    let state = inspect(path)?;

    match state {
        DirectoryState::Missing => {
            fs::create_dir_all(path).map_err(|e| io_error(path, e))?;
            log::debug!("Created workspace directory {}", path.display());
        }
        DirectoryState::EmptyDirectory => {}
        DirectoryState::NotADirectory => {
            return Err(ReconcileError::NotADirectory(path.to_path_buf()));
        }
        DirectoryState::NonEmptyDirectory if !force => {
            return Err(ReconcileError::DirectoryNotEmpty(path.to_path_buf()));
        }
        DirectoryState::NonEmptyDirectory => {
            let removed = clear_directory(path)?;
            log::debug!("Removed {removed} entries from {}", path.display());
        }
    }

    Ok(state)
}

/// Remove every entry directly under `dir`, returning how many were removed
fn clear_directory(dir: &Path) -> Result<usize, ReconcileError> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        remove_entry(&entry.path())?;
        removed += 1;
    }
    Ok(removed)
}

fn remove_entry(path: &Path) -> Result<(), ReconcileError> {
    // symlink_metadata so links are removed, never followed
    let file_type = fs::symlink_metadata(path)
        .map_err(|e| io_error(path, e))?
        .file_type();

    if file_type.is_dir() {
        clear_directory(path)?;
        fs::remove_dir(path).map_err(|e| io_error(path, e))
    } else {
        remove_file(path)
    }
}

/// Files synced without `allwrite` are read-only, which blocks deletion on
/// Windows. Retry once after clearing the flag.
fn remove_file(path: &Path) -> Result<(), ReconcileError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            let mut permissions = fs::symlink_metadata(path)
                .map_err(|e| io_error(path, e))?
                .permissions();
            if !permissions.readonly() {
                return Err(io_error(path, e));
            }
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            fs::set_permissions(path, permissions).map_err(|e| io_error(path, e))?;
            fs::remove_file(path).map_err(|e| io_error(path, e))
        }
        Err(e) => Err(io_error(path, e)),
    }
}

fn io_error(path: &Path, source: io::Error) -> ReconcileError {
    ReconcileError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::missing(None, DirectoryState::Missing)]
    #[case::empty(Some(&[][..]), DirectoryState::EmptyDirectory)]
    #[case::non_empty(Some(&["a.txt"][..]), DirectoryState::NonEmptyDirectory)]
    fn test_inspect(#[case] files: Option<&[&str]>, #[case] expected: DirectoryState) {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("ws");
        if let Some(files) = files {
            fs::create_dir(&target).unwrap();
            for file in files {
                fs::write(target.join(file), "x").unwrap();
            }
        }

        assert_eq!(inspect(&target).unwrap(), expected);
    }

    #[test]
    fn test_inspect_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        assert_eq!(inspect(&file).unwrap(), DirectoryState::NotADirectory);
    }

    #[test]
    fn test_prepare_creates_parents() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a").join("b").join("ws");

        assert_eq!(prepare(&target, false).unwrap(), DirectoryState::Missing);
        assert!(target.is_dir());
    }

    #[test]
    #[cfg(unix)]
    fn test_clear_removes_symlink_not_target() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("keep.txt"), "keep").unwrap();

        let target = temp.path().join("ws");
        fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&outside, target.join("link")).unwrap();

        prepare(&target, true).unwrap();

        assert!(fs::read_dir(&target).unwrap().next().is_none());
        assert!(outside.join("keep.txt").exists());
    }

    #[test]
    fn test_clear_read_only_files() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("ws");
        fs::create_dir_all(target.join("src")).unwrap();
        let synced = target.join("src").join("main.c");
        fs::write(&synced, "int main;").unwrap();

        let mut permissions = fs::metadata(&synced).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&synced, permissions).unwrap();

        assert_eq!(prepare(&target, true).unwrap(), DirectoryState::NonEmptyDirectory);
        assert!(fs::read_dir(&target).unwrap().next().is_none());
    }
}
