//! Where archives come from
//!
//! The resolver only needs "open this entry's archive and tell me its content
//! hash". `HttpSource` answers that for both locator kinds: direct URLs are
//! fetched as-is, GitHub assets are first resolved through the REST API.

use crate::core::entry::{DependencyEntry, Locator};
use crate::core::error::FetchResult;
use crate::helpers::acquire::{ArchiveResponse, HttpClient, fetch_asset_url};

/// Opens the remote archive of a dependency entry.
pub trait RemoteSource {
    /// Issue the request and return once headers are available; the body is
    /// only transferred if the caller reads it.
    fn open(&self, entry: &DependencyEntry) -> FetchResult<ArchiveResponse>;
}

/// Network-backed source for URL and GitHub asset locators.
pub struct HttpSource {
    client: HttpClient,
    api_base: String,
}

impl HttpSource {
    pub fn new(client: HttpClient, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }
}

impl RemoteSource for HttpSource {
    fn open(&self, entry: &DependencyEntry) -> FetchResult<ArchiveResponse> {
        match &entry.locator {
            Locator::Url(url) => self.client.open_archive(url, false),
            Locator::Asset {
                filename,
                tag,
                repo,
            } => {
                let asset_url = fetch_asset_url(&self.client, &self.api_base, repo, tag, filename)?;
                self.client.open_archive(&asset_url, true)
            }
        }
    }
}
