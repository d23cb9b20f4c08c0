//! Shared fixtures for end-to-end resolver tests.

#![allow(dead_code)]

use depfetch::Settings;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Build a gzip tarball from `(path, content)` pairs.
pub fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A throwaway project directory with settings pointing into it.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn components(&self) -> PathBuf {
        self.dir.path().join("components")
    }

    pub fn cache_file(&self) -> PathBuf {
        self.dir.path().join(".depfetch-cache.toml")
    }

    /// Settings with the probe disabled and a private (empty) token file.
    pub fn settings(&self, api_base: &str) -> Settings {
        let token_file = self.dir.path().join("token");
        std::fs::write(&token_file, "").unwrap();
        Settings {
            components_dir: self.components(),
            cache_file: self.cache_file(),
            probe_url: None,
            api_base: api_base.to_string(),
            token_file: Some(token_file),
            http_timeout: Duration::from_secs(10),
            ..Settings::default()
        }
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.components().join(relative)).unwrap()
    }
}
