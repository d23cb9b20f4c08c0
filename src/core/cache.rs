//! Persistent content-hash cache
//!
//! Maps component names to the `Content-MD5` value of the archive they were
//! last extracted from. The cache is opened once per run and passed to the
//! resolver; pending updates are written back by `close()` or, failing that,
//! when the value is dropped.
//!
//! ## Format
//!
//! ```toml
//! # .depfetch-cache.toml - Auto-generated, do not edit manually
//!
//! [hashes]
//! foo = "1B2M2Y8AsgTpgAmY7PhCfg=="
//! ```

use crate::core::error::{FetchError, FetchResult};
use crate::core::output;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

const HEADER: &str = "# depfetch hash cache - Auto-generated, do not edit manually\n\n";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    hashes: BTreeMap<String, String>,
}

/// Exclusive lock on the cache, released and removed when dropped
#[derive(Debug)]
struct CacheLock {
    _file: File,
    path: PathBuf,
}

impl CacheLock {
    fn acquire(cache_path: &Path) -> FetchResult<Self> {
        let lock_path = cache_path.with_extension("lock");
        let file = File::create(&lock_path).map_err(|e| {
            FetchError::io(format!("cannot create lock file {}", lock_path.display()), e)
        })?;

        if file.try_lock_exclusive().is_err() {
            return Err(FetchError::CacheLocked {
                path: cache_path.to_path_buf(),
                lock: lock_path,
            });
        }

        Ok(Self {
            _file: file,
            path: lock_path,
        })
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Name → content hash store backed by a TOML file.
#[derive(Debug)]
pub struct HashCache {
    path: PathBuf,
    hashes: BTreeMap<String, String>,
    dirty: bool,
    _lock: CacheLock,
}

impl HashCache {
    /// Open the cache at `path`, creating an empty one if the file is missing.
    pub fn open(path: &Path) -> FetchResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                FetchError::io(format!("cannot create directory {}", parent.display()), e)
            })?;
        }

        let lock = CacheLock::acquire(path)?;

        let hashes = match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str::<CacheFile>(&content)
                    .map_err(|e| FetchError::CacheCorrupt {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?
                    .hashes
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(FetchError::io(
                    format!("cannot read cache file {}", path.display()),
                    e,
                ));
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            hashes,
            dirty: false,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached hash for a component, if one was ever recorded.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.hashes.get(name).map(String::as_str)
    }

    /// Record the hash of a freshly extracted component.
    pub fn set(&mut self, name: &str, hash: &str) {
        if self.get(name) != Some(hash) {
            self.hashes.insert(name.to_string(), hash.to_string());
            self.dirty = true;
        }
    }

    /// Forget a component's hash.
    pub fn remove(&mut self, name: &str) {
        if self.hashes.remove(name).is_some() {
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Write pending changes to disk.
    ///
    /// The new content goes to a sibling temp file first and is renamed over
    /// the cache, so an interrupted write never truncates it.
    pub fn flush(&mut self) -> FetchResult<()> {
        if !self.dirty {
            return Ok(());
        }

        let file = CacheFile {
            hashes: self.hashes.clone(),
        };
        let content = toml::to_string_pretty(&file).map_err(|e| FetchError::CacheCorrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, format!("{}{}", HEADER, content)).map_err(|e| {
            FetchError::io(format!("cannot write cache file {}", tmp_path.display()), e)
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            FetchError::io(format!("cannot replace cache file {}", self.path.display()), e)
        })?;

        self.dirty = false;
        Ok(())
    }

    /// Flush and release the cache.
    pub fn close(mut self) -> FetchResult<()> {
        self.flush()
    }
}

impl Drop for HashCache {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            output::warning(&format!("failed to save hash cache: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_path(dir: &TempDir) -> PathBuf {
        dir.path().join(".depfetch-cache.toml")
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let cache = HashCache::open(&cache_path(&dir)).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.get("foo"), None);
    }

    #[test]
    fn test_close_persists_entries() {
        let dir = TempDir::new().unwrap();
        let path = cache_path(&dir);

        let mut cache = HashCache::open(&path).unwrap();
        cache.set("foo", "abc==");
        cache.set("bar", "def==");
        cache.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# depfetch hash cache"));

        let cache = HashCache::open(&path).unwrap();
        assert_eq!(cache.get("foo"), Some("abc=="));
        assert_eq!(cache.get("bar"), Some("def=="));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_drop_flushes_pending_updates() {
        let dir = TempDir::new().unwrap();
        let path = cache_path(&dir);

        {
            let mut cache = HashCache::open(&path).unwrap();
            cache.set("foo", "abc==");
        }

        let cache = HashCache::open(&path).unwrap();
        assert_eq!(cache.get("foo"), Some("abc=="));
    }

    #[test]
    fn test_set_overwrites_and_remove_forgets() {
        let dir = TempDir::new().unwrap();
        let path = cache_path(&dir);

        let mut cache = HashCache::open(&path).unwrap();
        cache.set("foo", "old");
        cache.set("foo", "new");
        cache.set("bar", "x");
        cache.remove("bar");
        cache.close().unwrap();

        let cache = HashCache::open(&path).unwrap();
        assert_eq!(cache.get("foo"), Some("new"));
        assert_eq!(cache.get("bar"), None);
    }

    #[test]
    fn test_untouched_cache_is_not_written() {
        let dir = TempDir::new().unwrap();
        let path = cache_path(&dir);

        HashCache::open(&path).unwrap().close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_concurrent_open_blocked() {
        let dir = TempDir::new().unwrap();
        let path = cache_path(&dir);

        let _first = HashCache::open(&path).unwrap();
        let second = HashCache::open(&path);
        assert!(matches!(second, Err(FetchError::CacheLocked { .. })));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = cache_path(&dir);

        {
            let _cache = HashCache::open(&path).unwrap();
            assert!(path.with_extension("lock").exists());
        }
        assert!(!path.with_extension("lock").exists());
        assert!(HashCache::open(&path).is_ok());
    }

    #[test]
    fn test_corrupt_file_reported() {
        let dir = TempDir::new().unwrap();
        let path = cache_path(&dir);
        std::fs::write(&path, "hashes = [not toml").unwrap();

        let err = HashCache::open(&path).unwrap_err();
        assert!(matches!(err, FetchError::CacheCorrupt { .. }));
    }
}
