//! Fetch and unpack helpers
//!
//! - **acquire**: HTTP client, GitHub asset lookup, streaming downloads
//! - **build**: tar extraction into a single-root component directory
//! - **internal**: progress bars and filesystem utilities

pub mod acquire;
pub mod build;
pub mod internal;
