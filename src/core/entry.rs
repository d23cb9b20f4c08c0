//! Dependency entries and locator parsing
//!
//! Entries arrive as one whitespace-separated string from the build system:
//!
//! ```text
//! foo<-https://github.com/acme/foo/releases/download/v1.2/foo.tar.gz
//! bar<-bar-1.0.tar.gz<-v1.0<-acme/bar
//! ```
//!
//! The first form names a release tarball by URL, the second names an asset
//! (`component<-filename<-tag<-repo`) to be looked up through the GitHub API.

use crate::core::error::{FetchError, FetchResult};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Separates the fields of a single entry.
pub const SEPARATOR: &str = "<-";

/// Release download URLs: `<scheme>://<host>/<owner>/<repo>/releases/download/<tag>/<file>`.
/// Any host is accepted so GitHub Enterprise instances resolve too.
static RELEASE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^/\s]+/[^/\s]+/([^/\s]+)/releases/download/([^/\s]+)/([^/\s?#]+)(?:[?#]\S*)?$")
        .expect("Invalid RELEASE_URL regex")
});

/// Where a dependency comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Direct URL of a release tarball
    Url(String),
    /// Named asset of a GitHub release
    Asset {
        filename: String,
        tag: String,
        repo: String,
    },
}

/// Canonical remote identity derived from a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteId {
    pub repo: String,
    pub version: String,
    /// File name of the archive on the remote side
    pub file_name: String,
}

/// A single declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub locator: Locator,
    pub remote: RemoteId,
}

impl Locator {
    /// Resolve the locator into its remote identity.
    ///
    /// URLs must follow the release download layout; asset repos must be
    /// `owner/name`.
    pub fn remote_id(&self) -> Result<RemoteId, String> {
        match self {
            Self::Url(url) => {
                let caps = RELEASE_URL.captures(url).ok_or_else(|| {
                    "make sure you are using a GitHub release download URL \
                     (.../<owner>/<repo>/releases/download/<tag>/<file>)"
                        .to_string()
                })?;
                Ok(RemoteId {
                    repo: caps[1].to_string(),
                    version: caps[2].to_string(),
                    file_name: caps[3].to_string(),
                })
            }
            Self::Asset {
                filename,
                tag,
                repo,
            } => {
                let valid_repo = matches!(
                    repo.split_once('/'),
                    Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/')
                );
                if !valid_repo {
                    return Err(format!("repository '{}' must be in owner/name form", repo));
                }
                Ok(RemoteId {
                    repo: repo.clone(),
                    version: tag.clone(),
                    file_name: filename.clone(),
                })
            }
        }
    }
}

/// Validate a component name so it can only ever name a direct child of the
/// components directory.
pub fn validate_component_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("component name cannot be empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("'{}' is not a valid component name", name));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(format!(
            "invalid component name '{}': only alphanumeric characters, '.', '_' and '-' are allowed",
            name
        ));
    }
    Ok(())
}

/// Parse `name<-url` entries.
pub fn parse_url_entries(raw: &str) -> FetchResult<Vec<DependencyEntry>> {
    parse_entries(raw, |entry, fields| match fields {
        [name, url] => Ok((name.to_string(), Locator::Url(url.to_string()))),
        _ => Err(FetchError::invalid_entry(entry, "expected name<-url")),
    })
}

/// Parse `component<-filename<-tag<-repo` entries.
pub fn parse_asset_entries(raw: &str) -> FetchResult<Vec<DependencyEntry>> {
    parse_entries(raw, |entry, fields| match fields {
        [name, filename, tag, repo] => Ok((
            name.to_string(),
            Locator::Asset {
                filename: filename.to_string(),
                tag: tag.to_string(),
                repo: repo.to_string(),
            },
        )),
        _ => Err(FetchError::invalid_entry(
            entry,
            "expected component<-filename<-tag<-repo",
        )),
    })
}

fn parse_entries(
    raw: &str,
    split: impl Fn(&str, &[&str]) -> FetchResult<(String, Locator)>,
) -> FetchResult<Vec<DependencyEntry>> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for token in raw.split_whitespace() {
        let fields: Vec<&str> = token.split(SEPARATOR).collect();
        if fields.iter().any(|f| f.is_empty()) {
            return Err(FetchError::invalid_entry(token, "empty field"));
        }

        let (name, locator) = split(token, &fields)?;
        validate_component_name(&name).map_err(|reason| FetchError::invalid_entry(token, reason))?;
        let remote = locator
            .remote_id()
            .map_err(|reason| FetchError::invalid_entry(token, reason))?;

        if !seen.insert(name.clone()) {
            return Err(FetchError::DuplicateName(name));
        }

        entries.push(DependencyEntry {
            name,
            locator,
            remote,
        });
    }

    Ok(entries)
}
