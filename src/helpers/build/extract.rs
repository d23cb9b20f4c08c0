//! Tar archive extraction
//!
//! Archives are unpacked with native Rust decoders into a staging directory
//! next to the destination. The staging directory must end up holding exactly
//! one top-level directory, which is then renamed into place.

use crate::core::error::{FetchError, FetchResult};
use crate::core::output;
use crate::helpers::internal::{fs_utils, progress};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

/// Compression wrapped around the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    TarBz2,
    TarZst,
    Tar,
}

impl ArchiveFormat {
    /// Detect the format from a file name.
    ///
    /// Release tarballs are gzip almost without exception, so unknown
    /// extensions are treated as `.tar.gz`.
    pub fn detect(file_name: &str) -> Self {
        let name = file_name.to_lowercase();
        if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Self::TarXz
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Self::TarBz2
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            Self::TarZst
        } else if name.ends_with(".tar") {
            Self::Tar
        } else {
            Self::TarGz
        }
    }

    /// Canonical file extension, without a leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::TarBz2 => "tar.bz2",
            Self::TarZst => "tar.zst",
            Self::Tar => "tar",
        }
    }
}

fn archive_error(path: &Path, reason: impl Into<String>) -> FetchError {
    FetchError::Archive {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    // Lexical normalization only; link targets are validated without
    // following symlinks.
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn ensure_no_symlink_components(archive: &Path, dest: &Path, full_path: &Path) -> FetchResult<()> {
    let rel = full_path.strip_prefix(dest).map_err(|_| {
        archive_error(
            archive,
            format!("entry outside destination: {}", full_path.display()),
        )
    })?;

    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(archive_error(
                archive,
                format!("extraction blocked: symlink in path component: {}", cur.display()),
            ));
        }
    }

    Ok(())
}

fn ensure_link_target_within_dest(
    archive: &Path,
    dest: &Path,
    link_parent: &Path,
    link_name: &Path,
) -> FetchResult<()> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(archive_error(
            archive,
            format!("unsafe link target (absolute): {}", link_name.display()),
        ));
    }

    let candidate = normalize_lexical(&link_parent.join(link_name));
    let norm_dest = normalize_lexical(dest);
    if candidate.strip_prefix(&norm_dest).is_err() {
        return Err(archive_error(
            archive,
            format!(
                "unsafe link target (escapes destination): {} -> {}",
                link_parent.display(),
                link_name.display()
            ),
        ));
    }

    Ok(())
}

/// Resolve a hard link target against the extraction root.
///
/// The target must be a regular file that an earlier entry of the same
/// archive already extracted.
fn hard_link_source(archive: &Path, dest: &Path, link_name: &Path) -> FetchResult<PathBuf> {
    if link_name
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(archive_error(
            archive,
            format!("unsafe link target (escapes destination): {}", link_name.display()),
        ));
    }

    let source = dest.join(link_name);
    ensure_no_symlink_components(archive, dest, &source)?;

    match std::fs::symlink_metadata(&source) {
        Ok(md) if md.is_file() => Ok(source),
        _ => Err(archive_error(
            archive,
            format!(
                "hard link target is not a file of this archive: {}",
                link_name.display()
            ),
        )),
    }
}

/// Unpack a tar stream into `dest`, rejecting entries that would escape it.
fn unpack_tar<R: Read>(reader: R, archive: &Path, dest: &Path) -> FetchResult<()> {
    let mut tar = tar::Archive::new(reader);

    let entries = tar
        .entries()
        .map_err(|e| archive_error(archive, format!("tar read error: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| archive_error(archive, format!("tar entry error: {}", e)))?;

        let entry_type = entry.header().entry_type();
        // GitHub-generated tarballs carry a pax global header (commit id)
        if entry_type.is_pax_global_extensions() || entry_type.is_pax_local_extensions() {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| archive_error(archive, format!("tar path error: {}", e)))?
            .into_owned();

        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(archive_error(
                archive,
                format!("unsafe path: {}", path.display()),
            ));
        }

        if path.as_os_str().is_empty() || path == Path::new(".") {
            continue;
        }

        let full_path = dest.join(&path);
        ensure_no_symlink_components(archive, dest, &full_path)?;

        let link_name = if entry_type.is_symlink() || entry_type.is_hard_link() {
            let link_name = entry
                .link_name()
                .map_err(|e| archive_error(archive, format!("tar link_name error: {}", e)))?
                .ok_or_else(|| {
                    archive_error(archive, format!("link without target: {}", path.display()))
                })?
                .into_owned();
            Some(link_name)
        } else {
            None
        };

        // Symlink targets are relative to the link's directory, hard link
        // targets to the archive root.
        let hard_link_from = match &link_name {
            Some(link_name) if entry_type.is_hard_link() => {
                Some(hard_link_source(archive, dest, link_name)?)
            }
            Some(link_name) => {
                let link_parent = full_path.parent().unwrap_or(dest);
                ensure_link_target_within_dest(archive, dest, link_parent, link_name)?;
                None
            }
            None => None,
        };

        if let Some(parent) = full_path.parent() {
            if parent.starts_with(dest) {
                ensure_no_symlink_components(archive, dest, parent)?;
            }
            fs_utils::ensure_dir(parent)?;
        }

        match hard_link_from {
            Some(source) => std::fs::hard_link(&source, &full_path).map_err(|e| {
                archive_error(
                    archive,
                    format!(
                        "cannot hard link {} to {}: {}",
                        path.display(),
                        source.display(),
                        e
                    ),
                )
            })?,
            None => {
                entry.unpack(&full_path).map_err(|e| {
                    archive_error(archive, format!("unpack error for {}: {}", path.display(), e))
                })?;
            }
        }
    }

    Ok(())
}

/// Extract `archive` into `dest` according to `format`.
pub fn extract_archive(archive: &Path, format: ArchiveFormat, dest: &Path) -> FetchResult<()> {
    let file = File::open(archive)
        .map_err(|e| FetchError::io(format!("cannot open {}", archive.display()), e))?;
    let reader = BufReader::new(file);

    match format {
        ArchiveFormat::TarGz => unpack_tar(flate2::read::GzDecoder::new(reader), archive, dest),
        ArchiveFormat::TarXz => unpack_tar(xz2::read::XzDecoder::new(reader), archive, dest),
        ArchiveFormat::TarBz2 => unpack_tar(bzip2::read::BzDecoder::new(reader), archive, dest),
        ArchiveFormat::TarZst => {
            let decoder = zstd::stream::read::Decoder::new(reader)
                .map_err(|e| archive_error(archive, format!("zstd init error: {}", e)))?;
            unpack_tar(decoder, archive, dest)
        }
        ArchiveFormat::Tar => unpack_tar(reader, archive, dest),
    }
}

/// Top-level entries of an extracted tree, sorted by name.
fn top_level_entries(dir: &Path) -> FetchResult<Vec<(String, bool)>> {
    let read = std::fs::read_dir(dir)
        .map_err(|e| FetchError::io(format!("cannot list {}", dir.display()), e))?;

    let mut entries = Vec::new();
    for entry in read {
        let entry =
            entry.map_err(|e| FetchError::io(format!("cannot list {}", dir.display()), e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| FetchError::io(format!("cannot stat {}", entry.path().display()), e))?
            .is_dir();
        entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    entries.sort();
    Ok(entries)
}

/// Extract an archive whose content is a single root directory and move
/// that directory to `dest`.
///
/// Any existing `dest`, directory or not, is removed first. Extraction happens in a staging
/// directory inside `dest`'s parent, which is deleted on every exit path, so
/// a rejected archive never leaves a renamed destination behind.
///
/// Returns the name of the archive's root directory.
pub fn extract_single_root(
    archive: &Path,
    format: ArchiveFormat,
    dest: &Path,
) -> FetchResult<String> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs_utils::ensure_dir(parent)?;
    fs_utils::remove_path_if_exists(dest)?;

    let staging = tempfile::Builder::new()
        .prefix(".depfetch-extract-")
        .tempdir_in(parent)
        .map_err(|e| {
            FetchError::io(format!("cannot create staging directory in {}", parent.display()), e)
        })?;

    let filename = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());

    progress::with_spinner(&format!("extracting {}", filename), || {
        extract_archive(archive, format, staging.path())
    })?;

    let roots = top_level_entries(staging.path())?;
    let root = match roots.as_slice() {
        [(name, true)] => name.clone(),
        _ => {
            return Err(FetchError::ArchiveShape {
                archive: archive.to_path_buf(),
                roots: roots.into_iter().map(|(name, _)| name).collect(),
            });
        }
    };

    fs_utils::move_path(&staging.path().join(&root), dest)?;
    output::detail(&format!("extracted {} to {}", root, dest.display()));
    Ok(root)
}
