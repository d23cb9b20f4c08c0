//! BUILD helpers - unpacking archives
//!
//! - **extract_single_root**: extract a tarball and move its root directory into place

pub mod extract;

pub use extract::{ArchiveFormat, extract_archive, extract_single_root};
