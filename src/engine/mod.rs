//! Dependency resolution engine
//!
//! - **source**: opens remote archives (direct URLs, GitHub assets)
//! - **resolver**: hash-gated download and extraction per entry
//! - **run**: a complete build-step invocation
//! - **components_list**: the `COMPONENTS_LIST` define

pub mod components_list;
pub mod resolver;
pub mod run;
pub mod source;

pub use resolver::{EntryOutcome, ResolveReport, Resolver};
pub use run::{FetchMode, RunOptions, RunOutcome, SkipReason, declared_entries, run};
pub use source::{HttpSource, RemoteSource};
