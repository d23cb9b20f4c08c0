//! Resolver settings
//!
//! Settings come from built-in defaults, optionally overridden by a
//! `depfetch.toml` in the project root, and finally by CLI flags (applied by
//! the binary). Relative paths in the file are resolved against the directory
//! that contains it.
//!
//! ```toml
//! components_dir = "components"
//! cache_file = ".depfetch-cache.toml"
//! probe_url = "https://github.com/"
//! dependencies = """
//!     foo<-https://github.com/acme/foo/releases/download/v1.2/foo.tar.gz
//! """
//! github_assets = "bar<-bar-1.0.tar.gz<-v1.0<-acme/bar"
//! ```

use crate::core::error::{FetchError, FetchResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "depfetch.toml";
pub const DEFAULT_COMPONENTS_DIR: &str = "components";
pub const DEFAULT_CACHE_FILE: &str = ".depfetch-cache.toml";
pub const DEFAULT_PROBE_URL: &str = "https://github.com/";
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Environment variable overriding the HTTP timeout (seconds)
pub const HTTP_TIMEOUT_ENV: &str = "DEPFETCH_HTTP_TIMEOUT";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    components_dir: Option<PathBuf>,
    cache_file: Option<PathBuf>,
    probe_url: Option<String>,
    api_base: Option<String>,
    token_file: Option<PathBuf>,
    http_timeout_secs: Option<u64>,
    dependencies: Option<String>,
    github_assets: Option<String>,
}

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding one subdirectory per component
    pub components_dir: PathBuf,
    /// Persistent hash cache
    pub cache_file: PathBuf,
    /// URL probed for connectivity before fetching; `None` disables the probe
    pub probe_url: Option<String>,
    /// GitHub REST API base URL
    pub api_base: String,
    /// Token file; `None` means `~/.pio_github_token`
    pub token_file: Option<PathBuf>,
    pub http_timeout: Duration,
    /// `name<-url` entries declared in the config file
    pub dependencies: Option<String>,
    /// `component<-filename<-tag<-repo` entries declared in the config file
    pub github_assets: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            components_dir: PathBuf::from(DEFAULT_COMPONENTS_DIR),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            probe_url: Some(DEFAULT_PROBE_URL.to_string()),
            api_base: GITHUB_API_BASE.to_string(),
            token_file: None,
            http_timeout: http_timeout_from_env(),
            dependencies: None,
            github_assets: None,
        }
    }
}

impl Settings {
    /// Load settings from an explicit config file.
    pub fn load(path: &Path) -> FetchResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FetchError::io(format!("cannot read config {}", path.display()), e))?;
        let base = path.parent().unwrap_or(Path::new(""));
        Self::from_toml_str(&content, base).map_err(|reason| FetchError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Load `depfetch.toml` from `root` if present, defaults otherwise.
    pub fn discover(root: &Path) -> FetchResult<Self> {
        let path = root.join(CONFIG_FILENAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default().rebased(root))
        }
    }

    fn from_toml_str(content: &str, base: &Path) -> Result<Self, String> {
        let toml: ConfigToml = toml::from_str(content).map_err(|e| e.to_string())?;
        let mut settings = Self::default();

        if let Some(dir) = toml.components_dir {
            settings.components_dir = dir;
        }
        if let Some(file) = toml.cache_file {
            settings.cache_file = file;
        }
        if let Some(url) = toml.probe_url {
            // An empty probe URL disables the connectivity check
            settings.probe_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(api) = toml.api_base {
            if api.trim().is_empty() {
                return Err("api_base cannot be empty".to_string());
            }
            settings.api_base = api.trim_end_matches('/').to_string();
        }
        if let Some(secs) = toml.http_timeout_secs {
            settings.http_timeout = clamp_timeout(secs);
        }
        settings.token_file = toml.token_file;
        settings.dependencies = toml.dependencies;
        settings.github_assets = toml.github_assets;

        Ok(settings.rebased(base))
    }

    /// Resolve relative paths against `base`.
    fn rebased(mut self, base: &Path) -> Self {
        if base.as_os_str().is_empty() {
            return self;
        }
        let rebase = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.components_dir = rebase(self.components_dir);
        self.cache_file = rebase(self.cache_file);
        self.token_file = self.token_file.map(rebase);
        self
    }
}

fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(5, 300))
}

/// HTTP timeout from `DEPFETCH_HTTP_TIMEOUT`, clamped to 5-300 seconds.
pub fn http_timeout_from_env() -> Duration {
    let secs = std::env::var(HTTP_TIMEOUT_ENV)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    clamp_timeout(secs)
}
