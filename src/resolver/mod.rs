//! Metadata resolution pipeline: turns an arbitrary URL into a display record.
//!
//! # Architecture
//!
//! - [`RuleBook`] - Immutable provider and publisher tables; classifies and rewrites URLs
//! - [`MetadataResolver`] - Walks the strategy chain for a [`ResolutionOrder`]
//! - [`StrategyOutcome`] - Per-strategy result: found data or the reason there was none
//! - [`ResolvedMetadata`] - The total result of [`MetadataResolver::resolve`]
//!
//! Strategies (oEmbed, page scrape, PDF info, DOI registry, slug heuristic) are
//! independently fail-soft. No error escapes `resolve`; the worst case is the
//! normalized URL as title and the hostname as publisher.
//!
//! # Example
//!
//! ```no_run
//! use linkcard_core::resolver::{MetadataResolver, ResolutionOrder};
//! use linkcard_core::ResolverConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResolverConfig {
//!     order: ResolutionOrder::ScrapeFirst,
//!     ..ResolverConfig::default()
//! };
//! let resolver = MetadataResolver::new(config)?;
//! let record = resolver.resolve("https://arxiv.org/pdf/1706.03762").await;
//! println!("{} - {}", record.publisher, record.title);
//! # Ok(())
//! # }
//! ```

mod crossref;
mod error;
mod html;
mod http_client;
mod icon;
mod oembed;
mod orchestrator;
mod pdf;
mod policy;
mod rules;
pub(crate) mod utils;

pub use error::ResolveError;
pub use html::{MIN_USABLE_TITLE_CHARS, ScrapedPage, extract_title, is_usable_title};
pub use http_client::FetchedDocument;
pub use icon::{IconCandidate, IconLinks, icon_area, pick_largest};
pub use oembed::OembedResult;
pub use orchestrator::{MetadataResolver, ResolvedMetadata, TitleSource};
pub use pdf::extract_pdf_title;
pub use policy::{IconFetchPolicy, ResolutionOrder};
pub use rules::{
    ProviderRule, PublisherRule, ResolutionTarget, ResponseShape, RuleBook, URL_PLACEHOLDER,
    UrlClassification, UrlRewrite,
};

/// Result of one resolution strategy.
///
/// Misses carry their reason so the orchestrator can log it; they are never
/// surfaced to callers of [`MetadataResolver::resolve`].
#[derive(Debug)]
pub enum StrategyOutcome<T> {
    /// The strategy produced data.
    Found(T),
    /// The strategy produced nothing usable.
    NoResult(ResolveError),
}

impl<T> StrategyOutcome<T> {
    /// Returns the found value, discarding the miss reason.
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NoResult(_) => None,
        }
    }

    /// True for [`StrategyOutcome::Found`].
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Maps the found value.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StrategyOutcome<U> {
        match self {
            Self::Found(value) => StrategyOutcome::Found(f(value)),
            Self::NoResult(error) => StrategyOutcome::NoResult(error),
        }
    }
}

impl<T> From<Result<T, ResolveError>> for StrategyOutcome<T> {
    fn from(result: Result<T, ResolveError>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(error) => Self::NoResult(error),
        }
    }
}
