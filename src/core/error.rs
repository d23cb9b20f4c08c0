//! Error types for dependency resolution.
//!
//! Every fallible operation in the library returns `FetchResult<T>`. All
//! variants abort the run except `NetworkUnavailable`, which the engine turns
//! into a skipped run instead of surfacing it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for resolver operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while resolving component dependencies.
#[derive(Error, Debug)]
pub enum FetchError {
    // Configuration errors
    #[error("invalid dependency entry '{entry}': {reason}")]
    InvalidEntry { entry: String, reason: String },

    #[error("component '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error(
        "the token file {} must contain a valid GitHub token or be empty (check its read permissions): {source}",
        .path.display()
    )]
    TokenUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Network errors
    #[error("no network connection ({0})")]
    NetworkUnavailable(String),

    #[error("invalid path to release {tag} in repo {repo}, or invalid access token (status {status})")]
    ReleaseNotFound { repo: String, tag: String, status: u16 },

    #[error("asset {asset} not found in release {tag} of {repo}")]
    AssetNotFound {
        asset: String,
        tag: String,
        repo: String,
    },

    #[error("download of {target} failed with status code {status}")]
    DownloadFailed { target: String, status: u16 },

    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    // Archive errors
    #[error(
        "archive {} must contain exactly one root directory, found {}: [{}]",
        .archive.display(),
        .roots.len(),
        .roots.join(", ")
    )]
    ArchiveShape { archive: PathBuf, roots: Vec<String> },

    #[error("archive {}: {reason}", .path.display())]
    Archive { path: PathBuf, reason: String },

    // Cache errors
    #[error("cache file {} is already in use by another process; delete {} if this is incorrect", .path.display(), .lock.display())]
    CacheLocked { path: PathBuf, lock: PathBuf },

    #[error("corrupt cache file {}: {reason}", .path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_entry(entry: &str, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error must abort the build step.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NetworkUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_unavailable_is_non_fatal() {
        assert!(!FetchError::NetworkUnavailable("dns".into()).is_fatal());
        assert!(FetchError::DownloadFailed {
            target: "foo".into(),
            status: 404
        }
        .is_fatal());
        assert!(FetchError::invalid_entry("x", "bad").is_fatal());
    }

    #[test]
    fn test_archive_shape_message_lists_roots() {
        let err = FetchError::ArchiveShape {
            archive: PathBuf::from("components/.foo.tar.gz"),
            roots: vec!["a".into(), "b".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("exactly one root directory"));
        assert!(msg.contains("found 2: [a, b]"));
    }
}
