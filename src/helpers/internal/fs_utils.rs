//! Common filesystem utilities

use crate::core::error::{FetchError, FetchResult};
use std::path::Path;

/// Create a directory (and all ancestors) if it doesn't exist.
pub fn ensure_dir(path: &Path) -> FetchResult<()> {
    std::fs::create_dir_all(path)
        .map_err(|e| FetchError::io(format!("cannot create directory {}", path.display()), e))
}

/// Ensure a file's parent directory exists.
pub fn ensure_parent_dir(path: &Path) -> FetchResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Remove a directory tree, treating "not found" as success.
pub fn remove_dir_if_exists(path: &Path) -> FetchResult<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FetchError::io(
            format!("cannot remove directory {}", path.display()),
            e,
        )),
    }
}

/// Remove a file, treating "not found" as success.
pub fn remove_file_if_exists(path: &Path) -> FetchResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FetchError::io(
            format!("cannot remove file {}", path.display()),
            e,
        )),
    }
}

/// Remove whatever is at `path` (directory tree, file or symlink), treating
/// "not found" as success. Symlinks are removed, never followed.
pub fn remove_path_if_exists(path: &Path) -> FetchResult<()> {
    match std::fs::symlink_metadata(path) {
        Ok(md) if md.is_dir() => remove_dir_if_exists(path),
        Ok(_) => remove_file_if_exists(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FetchError::io(format!("cannot stat {}", path.display()), e)),
    }
}

/// Move/rename a file or directory.
pub fn move_path(src: &Path, dest: &Path) -> FetchResult<()> {
    std::fs::rename(src, dest).map_err(|e| {
        FetchError::io(
            format!("move failed: {} -> {}", src.display(), dest.display()),
            e,
        )
    })
}
