//! Orchestration policy knobs.
//!
//! Two strategy orders exist in the wild for this pipeline; rather than
//! hard-wire one, the order is a policy value pinned by tests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order in which the orchestrator walks its strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionOrder {
    /// oEmbed, then scrape (PDF aware). A fetched page with an unusable title
    /// falls to the slug heuristic; no fetch result at all falls to the DOI
    /// registry, then the slug for unscrapable publishers, then the URL.
    #[default]
    Standard,
    /// oEmbed, then the DOI registry (title or bare DOI) whenever the URL
    /// carries a DOI, then scrape, then slug or URL.
    DoiBeforeScrape,
    /// Scrape first; oEmbed and the DOI registry only when scraping produced no title.
    ScrapeFirst,
}

impl ResolutionOrder {
    /// Stable label used in config files and CLI flags.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::DoiBeforeScrape => "doi-before-scrape",
            Self::ScrapeFirst => "scrape-first",
        }
    }
}

impl fmt::Display for ResolutionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "doi-before-scrape" => Ok(Self::DoiBeforeScrape),
            "scrape-first" => Ok(Self::ScrapeFirst),
            other => Err(format!(
                "unknown resolution order '{other}' (expected standard, doi-before-scrape or scrape-first)"
            )),
        }
    }
}

/// Whether to fetch the target page for an icon after oEmbed returned a
/// title but no icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconFetchPolicy {
    /// Always fetch, even for publishers marked unscrapable.
    Always,
    /// Fetch unless the publisher is marked unscrapable.
    #[default]
    UnlessUnscrapable,
    /// Never fetch; use the default `/favicon.ico`.
    Never,
}

impl IconFetchPolicy {
    /// Stable label used in config files and CLI flags.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::UnlessUnscrapable => "unless-unscrapable",
            Self::Never => "never",
        }
    }

    /// Returns true when an icon-only fetch should happen for a publisher.
    #[must_use]
    pub fn allows_fetch(self, publisher_unscrapable: bool) -> bool {
        match self {
            Self::Always => true,
            Self::UnlessUnscrapable => !publisher_unscrapable,
            Self::Never => false,
        }
    }
}

impl fmt::Display for IconFetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IconFetchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "unless-unscrapable" => Ok(Self::UnlessUnscrapable),
            "never" => Ok(Self::Never),
            other => Err(format!(
                "unknown icon policy '{other}' (expected always, unless-unscrapable or never)"
            )),
        }
    }
}
