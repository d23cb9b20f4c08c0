//! GitHub release asset lookup
//!
//! Resolves `(repo, tag, asset name)` to the asset's API URL, which serves
//! the binary when requested with `Accept: application/octet-stream`. This
//! works for private repositories as long as the token can read them.

use super::http::HttpClient;
use crate::core::error::{FetchError, FetchResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    /// API URL of the asset (not `browser_download_url`, which rejects tokens
    /// for private repos)
    url: String,
}

/// Fetch the download URL of a release asset.
pub fn fetch_asset_url(
    client: &HttpClient,
    api_base: &str,
    repo: &str,
    tag: &str,
    asset_name: &str,
) -> FetchResult<String> {
    let url = format!(
        "{}/repos/{}/releases/tags/{}",
        api_base.trim_end_matches('/'),
        repo,
        tag
    );

    let response = client.github_request(&url).call().map_err(|e| match e {
        ureq::Error::Status(status, _) => FetchError::ReleaseNotFound {
            repo: repo.to_string(),
            tag: tag.to_string(),
            status,
        },
        ureq::Error::Transport(t) => FetchError::Http {
            url: url.clone(),
            reason: t.to_string(),
        },
    })?;

    let release: Release = response.into_json().map_err(|e| FetchError::Http {
        url: url.clone(),
        reason: format!("failed to parse GitHub response: {}", e),
    })?;

    release
        .assets
        .into_iter()
        .find(|asset| asset.name == asset_name)
        .map(|asset| asset.url)
        .ok_or_else(|| FetchError::AssetNotFound {
            asset: asset_name.to_string(),
            tag: tag.to_string(),
            repo: repo.to_string(),
        })
}
