//! One build-step invocation
//!
//! Ties settings, credentials, the connectivity probe, the hash cache and the
//! resolver together. Conditions that should not fail a build (cleaning,
//! nothing declared, no network) come back as `RunOutcome::Skipped`; everything
//! else is a `FetchError` for the caller to turn into an exit code.

use super::resolver::{ResolveReport, Resolver};
use super::source::HttpSource;
use crate::core::cache::HashCache;
use crate::core::config::Settings;
use crate::core::entry::{DependencyEntry, parse_asset_entries, parse_url_entries};
use crate::core::error::{FetchError, FetchResult};
use crate::core::{output, token};
use crate::helpers::acquire::HttpClient;
use crate::helpers::internal::fs_utils;

/// Which kind of entries a run resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// `name<-url` release tarballs
    Dependencies,
    /// `component<-filename<-tag<-repo` GitHub release assets
    GithubAssets,
}

impl FetchMode {
    /// Environment variable the build system can use to pass entries.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::Dependencies => "DEPFETCH_DEPENDENCIES",
            Self::GithubAssets => "DEPFETCH_GITHUB_ASSETS",
        }
    }

    pub fn parse_entries(self, raw: &str) -> FetchResult<Vec<DependencyEntry>> {
        match self {
            Self::Dependencies => parse_url_entries(raw),
            Self::GithubAssets => parse_asset_entries(raw),
        }
    }

    /// Entries declared in the config file for this mode.
    pub fn configured_entries(self, settings: &Settings) -> Option<&str> {
        match self {
            Self::Dependencies => settings.dependencies.as_deref(),
            Self::GithubAssets => settings.github_assets.as_deref(),
        }
    }

    fn banner(self) -> &'static str {
        match self {
            Self::Dependencies => "Resolving dependencies...",
            Self::GithubAssets => "Fetching components as custom GitHub assets...",
        }
    }
}

/// Per-invocation options supplied by the build system.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Entries string; takes precedence over the config file
    pub entries: Option<String>,
    /// The build system is cleaning, nothing should be fetched
    pub clean_target: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    CleanTarget,
    NoEntries,
    NetworkUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Resolved(ResolveReport),
    Skipped(SkipReason),
}

/// Entries for `mode`, from options first and the config file second.
pub fn declared_entries(
    mode: FetchMode,
    settings: &Settings,
    options: &RunOptions,
) -> FetchResult<Vec<DependencyEntry>> {
    let raw = options
        .entries
        .as_deref()
        .or_else(|| mode.configured_entries(settings))
        .unwrap_or("");
    mode.parse_entries(raw)
}

/// Resolve every declared entry of `mode`.
pub fn run(mode: FetchMode, settings: &Settings, options: &RunOptions) -> FetchResult<RunOutcome> {
    output::banner(mode.banner());

    if options.clean_target {
        output::info("Cleaning target. Skipping.");
        return Ok(RunOutcome::Skipped(SkipReason::CleanTarget));
    }

    // Locators are validated before any network traffic
    let entries = declared_entries(mode, settings, options)?;
    if entries.is_empty() {
        output::info("Empty list of dependencies. Skipping.");
        return Ok(RunOutcome::Skipped(SkipReason::NoEntries));
    }

    let token = match mode {
        FetchMode::GithubAssets => {
            let token = token::load_token(settings.token_file.as_deref())?;
            if token.is_none() {
                output::info("No token found. Public repos only.");
            }
            token
        }
        FetchMode::Dependencies => None,
    };
    let client = HttpClient::new(settings.http_timeout, token);

    if let Some(probe_url) = &settings.probe_url {
        match client.probe(probe_url) {
            Ok(()) => {}
            Err(FetchError::NetworkUnavailable(reason)) => {
                output::warning(&format!(
                    "No network connection found ({}). Skipping (hope the components folder is already up to date)",
                    reason
                ));
                return Ok(RunOutcome::Skipped(SkipReason::NetworkUnavailable(reason)));
            }
            Err(e) => return Err(e),
        }
    }

    fs_utils::ensure_dir(&settings.components_dir)?;
    let mut cache = HashCache::open(&settings.cache_file)?;

    let resolver = Resolver::new(
        HttpSource::new(client, settings.api_base.clone()),
        settings.components_dir.clone(),
    );
    let report = resolver.resolve_all(&entries, &mut cache)?;
    cache.close()?;

    output::success("Dependencies resolved successfully");
    Ok(RunOutcome::Resolved(report))
}
