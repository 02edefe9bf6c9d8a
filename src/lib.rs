//! Linkcard Core Library
//!
//! Turns arbitrary user-submitted URLs into display records for a reading
//! list: a title, a publisher label and an icon URL. Resolution is best-effort
//! and total: every call returns a record, even when every remote source fails.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Pure transforms: URL normalization, DOI extraction, slug titles
//! - [`resolver`] - Rule tables, fetch strategies and the resolution orchestrator
//! - [`config`] - Timeouts, body limits, registry endpoint and ordering policy
//! - [`intake`] - Input validation and hand-off of records to a storage sink

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod intake;
pub mod parser;
pub mod resolver;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, ResolverConfig};
pub use intake::{
    ArticleRecord, IntakeError, JsonLinesSink, MemorySink, RecordSink, prepare, submit,
};
pub use parser::{NormalizedUrl, SlugStyle, extract_doi_from_url, slug_to_title};
pub use resolver::{
    IconFetchPolicy, MetadataResolver, ResolutionOrder, ResolveError, ResolvedMetadata, RuleBook,
    StrategyOutcome, TitleSource,
};
