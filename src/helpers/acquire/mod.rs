//! ACQUIRE helpers - getting archives
//!
//! - **http**: blocking client, connectivity probe, archive responses
//! - **github**: release asset lookup through the GitHub REST API
//! - **download**: stream a response body to disk

pub mod download;
pub mod github;
pub mod http;

pub use download::download_to_file;
pub use github::fetch_asset_url;
pub use http::{ArchiveResponse, HttpClient};
