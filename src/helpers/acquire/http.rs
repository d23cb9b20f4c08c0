//! HTTP client for archive downloads and GitHub API calls
//!
//! ## GitHub Authentication
//!
//! When a token is configured, API calls and asset downloads carry
//! `Authorization: Bearer <token>`. Direct tarball URLs are always fetched
//! anonymously.

use crate::core::error::{FetchError, FetchResult};
use std::io::Read;
use std::time::Duration;

const USER_AGENT: &str = concat!("depfetch/", env!("CARGO_PKG_VERSION"));

/// Response header carrying the archive's content hash
pub const CONTENT_MD5: &str = "Content-MD5";

/// An archive response whose body has not been read yet.
///
/// Dropping it without calling `into_reader` closes the connection without
/// downloading the body.
pub struct ArchiveResponse {
    pub url: String,
    pub content_md5: Option<String>,
    pub content_length: Option<u64>,
    body: Box<dyn Read + Send + Sync + 'static>,
}

impl ArchiveResponse {
    /// Build a response from parts. Used by alternative sources and tests.
    pub fn new(
        url: impl Into<String>,
        content_md5: Option<String>,
        content_length: Option<u64>,
        body: Box<dyn Read + Send + Sync + 'static>,
    ) -> Self {
        Self {
            url: url.into(),
            content_md5,
            content_length,
            body,
        }
    }

    pub fn into_reader(self) -> Box<dyn Read + Send + Sync + 'static> {
        self.body
    }
}

impl std::fmt::Debug for ArchiveResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveResponse")
            .field("url", &self.url)
            .field("content_md5", &self.content_md5)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Blocking HTTP client shared by all requests of a run.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    token: Option<String>,
}

impl HttpClient {
    /// `timeout` bounds connecting and each individual read, not the whole
    /// transfer, so large archives are not cut off.
    pub fn new(timeout: Duration, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent, token }
    }

    /// Check that the network is reachable.
    ///
    /// Any HTTP status counts as reachable; only transport failures (DNS,
    /// refused connection, timeout) report `NetworkUnavailable`.
    pub fn probe(&self, url: &str) -> FetchResult<()> {
        match self.agent.head(url).call() {
            Ok(_) | Err(ureq::Error::Status(_, _)) => Ok(()),
            Err(ureq::Error::Transport(t)) => Err(FetchError::NetworkUnavailable(t.to_string())),
        }
    }

    /// Create a GitHub API request with JSON accept header and optional auth.
    pub fn github_request(&self, url: &str) -> ureq::Request {
        self.authorize(
            self.agent
                .get(url)
                .set("Accept", "application/vnd.github+json"),
        )
    }

    /// Open an archive download and read its headers.
    ///
    /// `authenticated` attaches the token (GitHub asset downloads) and asks
    /// for the raw binary instead of asset metadata.
    pub fn open_archive(&self, url: &str, authenticated: bool) -> FetchResult<ArchiveResponse> {
        let mut request = self.agent.get(url);
        if authenticated {
            request = self.authorize(request.set("Accept", "application/octet-stream"));
        }

        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(status, _) => FetchError::DownloadFailed {
                target: url.to_string(),
                status,
            },
            ureq::Error::Transport(t) => FetchError::Http {
                url: url.to_string(),
                reason: t.to_string(),
            },
        })?;

        // Redirects are followed; ureq only reports 2xx/3xx here.
        if response.status() != 200 {
            return Err(FetchError::DownloadFailed {
                target: url.to_string(),
                status: response.status(),
            });
        }

        let content_md5 = response
            .header(CONTENT_MD5)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let content_length = response
            .header("Content-Length")
            .and_then(|s| s.trim().parse().ok());

        Ok(ArchiveResponse {
            url: url.to_string(),
            content_md5,
            content_length,
            body: response.into_reader(),
        })
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }
}
