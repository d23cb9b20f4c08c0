//! Hash-gated fetch and extract
//!
//! For every entry the resolver opens the remote archive, compares its
//! `Content-MD5` with the cached one and only downloads and extracts when the
//! component directory is missing or the hashes differ.

use super::source::RemoteSource;
use crate::core::cache::HashCache;
use crate::core::entry::DependencyEntry;
use crate::core::error::FetchResult;
use crate::core::output;
use crate::helpers::acquire::download_to_file;
use crate::helpers::build::{ArchiveFormat, extract_single_root};
use crate::helpers::internal::fs_utils;
use std::path::{Path, PathBuf};

/// What happened to a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Archive downloaded and extracted
    Downloaded {
        /// Name of the archive's root directory before the rename
        root: String,
        /// Hash now recorded in the cache
        hash: Option<String>,
        bytes: u64,
    },
    AlreadySatisfied,
}

/// Per-entry outcomes of a resolved run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub entries: Vec<(String, EntryOutcome)>,
}

impl ResolveReport {
    pub fn outcome(&self, name: &str) -> Option<&EntryOutcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn downloaded(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, EntryOutcome::Downloaded { .. }))
            .count()
    }

    pub fn satisfied(&self) -> usize {
        self.entries.len() - self.downloaded()
    }
}

/// A cached hash only vouches for a component when the remote served one too
/// and both agree.
pub fn is_fresh(cached: Option<&str>, remote: Option<&str>) -> bool {
    matches!((cached, remote), (Some(c), Some(r)) if c == r)
}

pub struct Resolver<S> {
    source: S,
    components_dir: PathBuf,
}

impl<S: RemoteSource> Resolver<S> {
    pub fn new(source: S, components_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            components_dir: components_dir.into(),
        }
    }

    pub fn components_dir(&self) -> &Path {
        &self.components_dir
    }

    /// Canonical directory of a component.
    pub fn component_dir(&self, name: &str) -> PathBuf {
        self.components_dir.join(name)
    }

    /// Temporary download location, hidden next to the component directory.
    fn archive_path(&self, entry: &DependencyEntry) -> (PathBuf, ArchiveFormat) {
        let format = ArchiveFormat::detect(&entry.remote.file_name);
        let path = self
            .components_dir
            .join(format!(".{}.{}", entry.name, format.extension()));
        (path, format)
    }

    /// Bring one component up to date with its remote archive.
    pub fn resolve_entry(
        &self,
        entry: &DependencyEntry,
        cache: &mut HashCache,
    ) -> FetchResult<EntryOutcome> {
        let dir = self.component_dir(&entry.name);
        let response = self.source.open(entry)?;
        let remote_hash = response.content_md5.clone();

        if dir.is_dir() && is_fresh(cache.get(&entry.name), remote_hash.as_deref()) {
            // Response dropped unread: the archive body is never transferred
            return Ok(EntryOutcome::AlreadySatisfied);
        }

        output::step(&format!(
            "\"{}\" not found locally or different from required, downloading {} {}",
            entry.name, entry.remote.repo, entry.remote.version
        ));

        let (archive, format) = self.archive_path(entry);
        let bytes = download_to_file(response, &archive)?;
        output::detail(&format!("downloaded {} bytes", bytes));

        let extracted = extract_single_root(&archive, format, &dir);
        fs_utils::remove_file_if_exists(&archive)?;
        let root = extracted?;

        match &remote_hash {
            Some(hash) => cache.set(&entry.name, hash),
            None => cache.remove(&entry.name),
        }

        Ok(EntryOutcome::Downloaded {
            root,
            hash: remote_hash,
            bytes,
        })
    }

    /// Resolve entries one after another, stopping at the first error.
    pub fn resolve_all(
        &self,
        entries: &[DependencyEntry],
        cache: &mut HashCache,
    ) -> FetchResult<ResolveReport> {
        let mut report = ResolveReport::default();
        let total = entries.len();

        for (i, entry) in entries.iter().enumerate() {
            output::component(
                i + 1,
                total,
                &entry.name,
                &entry.remote.repo,
                &entry.remote.version,
            );

            let outcome = self.resolve_entry(entry, cache)?;
            match &outcome {
                EntryOutcome::Downloaded { .. } => {
                    output::success(&format!("{} downloaded", entry.name))
                }
                EntryOutcome::AlreadySatisfied => output::satisfied(&entry.name),
            }
            report.entries.push((entry.name.clone(), outcome));
        }

        Ok(report)
    }
}
