//! Resolver configuration: timeouts, body limits, registry endpoint and policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::{IconFetchPolicy, ResolutionOrder};

/// Default Crossref API base URL.
pub const DEFAULT_CROSSREF_BASE_URL: &str = "https://api.crossref.org";

/// Default TCP connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1_000;
/// Default page fetch timeout in milliseconds.
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 1_500;
/// Default web manifest fetch timeout in milliseconds.
pub const DEFAULT_MANIFEST_TIMEOUT_MS: u64 = 500;
/// Default oEmbed request timeout in milliseconds.
pub const DEFAULT_OEMBED_TIMEOUT_MS: u64 = 1_500;
/// Default DOI registry timeout in milliseconds.
pub const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 1_000;
/// Default cap on response bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

const MAX_TIMEOUT_MS: u64 = 30_000;

/// Invalid configuration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A timeout is zero or above the allowed maximum
    #[error("invalid `{field}`: {value}ms. Expected range: 1..={max}ms")]
    TimeoutOutOfRange {
        /// Config field name
        field: &'static str,
        /// Offending value
        value: u64,
        /// Upper bound
        max: u64,
    },

    /// The body limit is zero
    #[error("invalid `max_body_bytes`: must be greater than zero")]
    ZeroBodyLimit,

    /// The registry base URL is empty or not http(s)
    #[error("invalid `crossref_base_url` '{0}': expected an http(s) URL")]
    BadBaseUrl(String),
}

/// Resolver settings. Every field has a default, so partial config files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// TCP connect timeout for every request.
    pub connect_timeout_ms: u64,
    /// Total timeout for page fetches (scrape and icon-only fetches).
    pub page_timeout_ms: u64,
    /// Total timeout for web manifest fetches.
    pub manifest_timeout_ms: u64,
    /// Total timeout for oEmbed requests.
    pub oembed_timeout_ms: u64,
    /// Total timeout for DOI registry lookups.
    pub registry_timeout_ms: u64,
    /// Response bodies are truncated at this many bytes.
    pub max_body_bytes: usize,
    /// Crossref API base URL.
    pub crossref_base_url: String,
    /// Contact address for the Crossref polite pool.
    pub crossref_mailto: Option<String>,
    /// Strategy order.
    pub order: ResolutionOrder,
    /// Icon-only fetch policy after a title-only oEmbed hit.
    pub icon_policy: IconFetchPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            page_timeout_ms: DEFAULT_PAGE_TIMEOUT_MS,
            manifest_timeout_ms: DEFAULT_MANIFEST_TIMEOUT_MS,
            oembed_timeout_ms: DEFAULT_OEMBED_TIMEOUT_MS,
            registry_timeout_ms: DEFAULT_REGISTRY_TIMEOUT_MS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            crossref_base_url: DEFAULT_CROSSREF_BASE_URL.to_string(),
            crossref_mailto: None,
            order: ResolutionOrder::default(),
            icon_policy: IconFetchPolicy::default(),
        }
    }
}

impl ResolverConfig {
    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("page_timeout_ms", self.page_timeout_ms),
            ("manifest_timeout_ms", self.manifest_timeout_ms),
            ("oembed_timeout_ms", self.oembed_timeout_ms),
            ("registry_timeout_ms", self.registry_timeout_ms),
        ] {
            if !(1..=MAX_TIMEOUT_MS).contains(&value) {
                return Err(ConfigError::TimeoutOutOfRange {
                    field,
                    value,
                    max: MAX_TIMEOUT_MS,
                });
            }
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        let base = self.crossref_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::BadBaseUrl(self.crossref_base_url.clone()));
        }
        Ok(())
    }

    /// Applies one timeout to every page, manifest, oEmbed and registry request.
    #[must_use]
    pub fn with_uniform_timeout(mut self, timeout_ms: u64) -> Self {
        self.page_timeout_ms = timeout_ms;
        self.manifest_timeout_ms = timeout_ms;
        self.oembed_timeout_ms = timeout_ms;
        self.registry_timeout_ms = timeout_ms;
        self
    }

    /// Connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Page fetch timeout as a `Duration`.
    #[must_use]
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    /// Manifest fetch timeout as a `Duration`.
    #[must_use]
    pub fn manifest_timeout(&self) -> Duration {
        Duration::from_millis(self.manifest_timeout_ms)
    }

    /// oEmbed timeout as a `Duration`.
    #[must_use]
    pub fn oembed_timeout(&self) -> Duration {
        Duration::from_millis(self.oembed_timeout_ms)
    }

    /// Registry timeout as a `Duration`.
    #[must_use]
    pub fn registry_timeout(&self) -> Duration {
        Duration::from_millis(self.registry_timeout_ms)
    }
}
