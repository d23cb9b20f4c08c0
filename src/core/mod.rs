//! Core infrastructure for dependency resolution
//!
//! Entries, settings, credentials, the hash cache and terminal output.

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod output;
pub mod token;
