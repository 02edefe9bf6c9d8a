//! Crossref DOI lookups - resolves a DOI to its registered title.
//!
//! Queries `{base}/works/{doi}` and takes the first entry of `message.title`.
//! The orchestrator falls back to the bare DOI when this comes back empty.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::ResolverConfig;

use super::http_client::HttpFetcher;
use super::utils::clean_text;
use super::{ResolveError, StrategyOutcome};

/// Top-level Crossref works response.
#[derive(Debug, Deserialize)]
pub(crate) struct CrossrefResponse {
    pub status: String,
    pub message: CrossrefMessage,
}

/// The `message` field of a works response; only the title is read.
#[derive(Debug, Deserialize)]
pub(crate) struct CrossrefMessage {
    pub title: Option<Vec<String>>,
}

/// Crossref REST client bound to one base URL.
///
/// When a `mailto` is configured it is sent as a query parameter, which puts
/// requests in Crossref's polite pool.
#[derive(Clone)]
pub(crate) struct CrossrefClient {
    fetcher: HttpFetcher,
    base_url: String,
    mailto: Option<String>,
    timeout: Duration,
}

impl CrossrefClient {
    pub(crate) fn new(fetcher: HttpFetcher, config: &ResolverConfig) -> Self {
        Self {
            fetcher,
            base_url: config.crossref_base_url.trim_end_matches('/').to_string(),
            mailto: config
                .crossref_mailto
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            timeout: config.registry_timeout(),
        }
    }

    fn works_url(&self, doi: &str) -> String {
        let mut url = format!("{}/works/{}", self.base_url, urlencoding::encode(doi));
        if let Some(mailto) = &self.mailto {
            url.push_str("?mailto=");
            url.push_str(&urlencoding::encode(mailto));
        }
        url
    }

    /// Looks up the registered title for `doi`.
    #[tracing::instrument(skip(self), fields(strategy = "doi"))]
    pub(crate) async fn title_for(&self, doi: &str) -> StrategyOutcome<String> {
        let url = self.works_url(doi);
        debug!(api_url = %url, "calling Crossref API");

        let response: CrossrefResponse = match self.fetcher.fetch_json(&url, self.timeout).await {
            Ok(response) => response,
            Err(error) => return StrategyOutcome::NoResult(error),
        };
        if response.status != "ok" {
            return StrategyOutcome::NoResult(ResolveError::malformed(
                "json",
                &url,
                format!("unexpected Crossref response status '{}'", response.status),
            ));
        }

        response
            .message
            .title
            .unwrap_or_default()
            .iter()
            .map(|title| clean_text(title))
            .find(|title| !title.is_empty())
            .map_or_else(
                || StrategyOutcome::NoResult(ResolveError::missing("title", doi)),
                StrategyOutcome::Found,
            )
    }
}

impl std::fmt::Debug for CrossrefClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossrefClient")
            .field("base_url", &self.base_url)
            .field("mailto", &self.mailto)
            .finish_non_exhaustive()
    }
}
