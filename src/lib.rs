//! Build-time resolver for GitHub release components
//!
//! Build systems call `depfetch` before compiling to make sure every external
//! component is present and current. Components are declared as
//! whitespace-separated entries:
//!
//! ```text
//! foo<-https://github.com/acme/foo/releases/download/v1.2/foo.tar.gz
//! bar<-bar-1.0.tar.gz<-v1.0<-acme/bar
//! ```
//!
//! The first form is a release tarball URL, the second a (possibly private)
//! release asset resolved through the GitHub API.
//!
//! # Resolution
//!
//! For each entry the remote archive is opened and its `Content-MD5` header
//! compared with the hash recorded in the cache file. When the component
//! directory is missing or the hashes differ, the archive is downloaded, its
//! single root directory extracted to `components/<name>`, and the new hash
//! recorded. Otherwise the body is never downloaded.
//!
//! # Example
//!
//! ```no_run
//! use depfetch::{FetchMode, RunOptions, Settings, run};
//!
//! let settings = Settings::discover(std::path::Path::new("."))?;
//! let options = RunOptions {
//!     entries: Some("bar<-bar-1.0.tar.gz<-v1.0<-acme/bar".into()),
//!     clean_target: false,
//! };
//! run(FetchMode::GithubAssets, &settings, &options)?;
//! # Ok::<(), depfetch::FetchError>(())
//! ```

pub mod core;
pub mod engine;
pub mod helpers;

pub use crate::core::cache::HashCache;
pub use crate::core::config::Settings;
pub use crate::core::entry::{DependencyEntry, Locator, RemoteId};
pub use crate::core::error::{FetchError, FetchResult};
pub use crate::core::output;
pub use engine::components_list;
pub use engine::{
    EntryOutcome, FetchMode, HttpSource, RemoteSource, ResolveReport, Resolver, RunOptions,
    RunOutcome, SkipReason, run,
};
