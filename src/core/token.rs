//! GitHub access token lookup
//!
//! The token lives in a per-user file (`~/.pio_github_token` by default).
//! A missing or blank file means unauthenticated access, which only reaches
//! public repositories. When no file exists, `GITHUB_TOKEN` is used instead.

use crate::core::error::{FetchError, FetchResult};
use std::path::{Path, PathBuf};

pub const TOKEN_FILENAME: &str = ".pio_github_token";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Default token file in the user's home directory.
pub fn default_token_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(TOKEN_FILENAME))
}

/// Load the access token.
///
/// `path` overrides the default location. Returns `Ok(None)` when no usable
/// token is configured; an existing but unreadable file is an error.
pub fn load_token(path: Option<&Path>) -> FetchResult<Option<String>> {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_token_path(),
    };

    match path {
        Some(path) if path.exists() => read_token_file(&path),
        _ => Ok(token_from_env()),
    }
}

fn read_token_file(path: &Path) -> FetchResult<Option<String>> {
    let content = std::fs::read_to_string(path).map_err(|source| FetchError::TokenUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(non_blank(&content))
}

fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV).ok().and_then(|t| non_blank(&t))
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_token_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TOKEN_FILENAME);
        std::fs::write(&path, "  ghp_abc123\n").unwrap();

        assert_eq!(load_token(Some(&path)).unwrap().as_deref(), Some("ghp_abc123"));
    }

    #[test]
    fn test_empty_file_means_public_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TOKEN_FILENAME);
        std::fs::write(&path, "").unwrap();
        assert_eq!(load_token(Some(&path)).unwrap(), None);

        std::fs::write(&path, " \n\t").unwrap();
        assert_eq!(load_token(Some(&path)).unwrap(), None);
    }

    #[test]
    fn test_unreadable_token_is_error() {
        let dir = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file
        let path = dir.path().join("token-dir");
        std::fs::create_dir(&path).unwrap();

        let err = load_token(Some(&path)).unwrap_err();
        assert!(matches!(err, FetchError::TokenUnreadable { .. }));
        assert!(err.to_string().contains("must contain a valid GitHub token or be empty"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(""), None);
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" x "), Some("x".to_string()));
    }
}
