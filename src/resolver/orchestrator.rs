//! The resolution state machine: sequences oEmbed, scraping, PDF, DOI and slug
//! strategies into one total operation.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::parser::{NormalizedUrl, SlugStyle, slug_to_title};

use super::crossref::CrossrefClient;
use super::html::{ScrapedPage, is_usable_title};
use super::http_client::{FetchedDocument, HttpFetcher, build_http_client};
use super::icon::resolve_icon;
use super::oembed::{OembedResult, fetch_oembed};
use super::pdf::extract_pdf_title;
use super::rules::{ResolutionTarget, RuleBook};
use super::{ResolutionOrder, ResolveError, StrategyOutcome};

/// Which strategy supplied the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleSource {
    /// oEmbed provider response.
    Oembed,
    /// HTML `og:title` or `<title>`.
    Page,
    /// PDF document-info title.
    Pdf,
    /// DOI registry title.
    Registry,
    /// The bare DOI, after a registry miss.
    Doi,
    /// Derived from the URL slug.
    Slug,
    /// The normalized input URL itself.
    Url,
}

impl TitleSource {
    /// Stable label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oembed => "oembed",
            Self::Page => "page",
            Self::Pdf => "pdf",
            Self::Registry => "registry",
            Self::Doi => "doi",
            Self::Slug => "slug",
            Self::Url => "url",
        }
    }
}

/// Display record for one URL.
///
/// `title` and `publisher` are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMetadata {
    /// Human-readable title.
    pub title: String,
    /// Publisher label: bare hostname, a provider override, or `"—"`.
    pub publisher: String,
    /// Absolute icon URL, absent only when the input had no host.
    pub icon_url: Option<String>,
    /// Strategy that produced the title.
    pub source: TitleSource,
}

/// Result of fetching the scrape target.
#[derive(Debug, Default)]
struct PageHarvest {
    title: Option<String>,
    title_source: Option<TitleSource>,
    icon_url: Option<String>,
}

impl PageHarvest {
    fn usable_title(&self) -> Option<(&str, TitleSource)> {
        let title = self.title.as_deref().filter(|t| is_usable_title(t))?;
        Some((title, self.title_source?))
    }
}

/// Resolves arbitrary URLs into [`ResolvedMetadata`].
///
/// Cheap to share behind an `Arc`; holds one HTTP client and an immutable
/// rule book. Concurrent calls are independent.
///
/// # Example
///
/// ```no_run
/// use linkcard_core::{MetadataResolver, ResolverConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = MetadataResolver::new(ResolverConfig::default())?;
/// let record = resolver.resolve("youtu.be/dQw4w9WgXcQ").await;
/// println!("{} ({})", record.title, record.publisher);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    config: ResolverConfig,
    rules: Arc<RuleBook>,
    fetcher: HttpFetcher,
    crossref: CrossrefClient,
}

impl MetadataResolver {
    /// Creates a resolver with the built-in rule book.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] when the HTTP client cannot be built.
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        Self::with_rules(config, RuleBook::builtin())
    }

    /// Creates a resolver with a custom rule book.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] when the HTTP client cannot be built.
    pub fn with_rules(config: ResolverConfig, rules: Arc<RuleBook>) -> Result<Self, ResolveError> {
        let client = build_http_client(&config)?;
        let fetcher = HttpFetcher::new(client, config.max_body_bytes);
        let crossref = CrossrefClient::new(fetcher.clone(), &config);
        Ok(Self {
            config,
            rules,
            fetcher,
            crossref,
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Active rule book.
    #[must_use]
    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Resolves `url` into a display record. Never fails.
    #[tracing::instrument(skip(self), fields(order = %self.config.order))]
    pub async fn resolve(&self, url: &str) -> ResolvedMetadata {
        let target = self.rules.plan(NormalizedUrl::parse(url));
        let record = match self.config.order {
            ResolutionOrder::Standard => self.resolve_standard(&target).await,
            ResolutionOrder::DoiBeforeScrape => self.resolve_doi_before_scrape(&target).await,
            ResolutionOrder::ScrapeFirst => self.resolve_scrape_first(&target).await,
        };
        info!(
            source = record.source.as_str(),
            publisher = %record.publisher,
            has_icon = record.icon_url.is_some(),
            "resolved"
        );
        record
    }

    /// oEmbed, then scrape/PDF. A fetched page without a usable title falls to
    /// the slug; no fetch result at all falls to the DOI registry first.
    async fn resolve_standard(&self, target: &ResolutionTarget) -> ResolvedMetadata {
        if let Some(oembed) = self.try_oembed(target).await {
            let icon = self.icon_after_oembed(target, &oembed, false).await;
            return self.oembed_record(target, oembed, icon);
        }

        match self.scrape(target).await {
            StrategyOutcome::Found(page) => {
                if let Some((title, source)) = page.usable_title() {
                    return self.record(target, title.to_string(), source, page.icon_url);
                }
                debug!("page fetched but title unusable");
                let (title, source) = self.fallback_title(target, true);
                self.record(target, title, source, page.icon_url)
            }
            StrategyOutcome::NoResult(error) => {
                debug!(%error, "scrape produced no result");
                let (title, source) = match self.try_doi(target).await {
                    Some(found) => found,
                    None => self.fallback_title(target, false),
                };
                self.record(target, title, source, None)
            }
        }
    }

    /// oEmbed, then the DOI registry whenever the URL carries a DOI, then scrape.
    async fn resolve_doi_before_scrape(&self, target: &ResolutionTarget) -> ResolvedMetadata {
        if let Some(oembed) = self.try_oembed(target).await {
            let icon = self.icon_after_oembed(target, &oembed, false).await;
            return self.oembed_record(target, oembed, icon);
        }

        if let Some((title, source)) = self.try_doi(target).await {
            return self.record(target, title, source, None);
        }

        let (fetched, icon) = match self.scrape(target).await {
            StrategyOutcome::Found(page) => {
                if let Some((title, source)) = page.usable_title() {
                    return self.record(target, title.to_string(), source, page.icon_url);
                }
                (true, page.icon_url)
            }
            StrategyOutcome::NoResult(error) => {
                debug!(%error, "scrape produced no result");
                (false, None)
            }
        };
        let (title, source) = self.fallback_title(target, fetched);
        self.record(target, title, source, icon)
    }

    /// Scrape first; oEmbed and the DOI registry only when it yields no title.
    async fn resolve_scrape_first(&self, target: &ResolutionTarget) -> ResolvedMetadata {
        let (fetched, page_icon) = match self.scrape(target).await {
            StrategyOutcome::Found(page) => {
                if let Some((title, source)) = page.usable_title() {
                    return self.record(target, title.to_string(), source, page.icon_url);
                }
                (true, page.icon_url)
            }
            StrategyOutcome::NoResult(error) => {
                debug!(%error, "scrape produced no result");
                (false, None)
            }
        };

        if let Some(oembed) = self.try_oembed(target).await {
            let icon = match page_icon {
                Some(icon) => Some(icon),
                None => self.icon_after_oembed(target, &oembed, fetched).await,
            };
            return self.oembed_record(target, oembed, icon);
        }

        let (title, source) = match self.try_doi(target).await {
            Some(found) => found,
            None => self.fallback_title(target, fetched),
        };
        self.record(target, title, source, page_icon)
    }

    async fn try_oembed(&self, target: &ResolutionTarget) -> Option<OembedResult> {
        let rule = self.rules.provider_for(&target.publisher)?;
        match fetch_oembed(
            &self.fetcher,
            rule,
            target.input.as_str(),
            self.config.oembed_timeout(),
        )
        .await
        {
            StrategyOutcome::Found(result) => Some(result),
            StrategyOutcome::NoResult(error) => {
                debug!(%error, "oEmbed produced no result");
                None
            }
        }
    }

    /// Registry title, else the bare DOI. `None` when the URL has no DOI.
    async fn try_doi(&self, target: &ResolutionTarget) -> Option<(String, TitleSource)> {
        let doi = target.classification.doi.as_deref()?;
        match self
            .crossref
            .title_for(doi)
            .await
            .map(|title| (title, TitleSource::Registry))
        {
            StrategyOutcome::Found(found) => Some(found),
            StrategyOutcome::NoResult(error) => {
                debug!(%error, doi, "registry lookup failed; using bare DOI");
                Some((doi.to_string(), TitleSource::Doi))
            }
        }
    }

    /// Fetches the scrape target and harvests title and icon.
    #[tracing::instrument(skip(self, target), fields(strategy = "scrape"))]
    async fn scrape(&self, target: &ResolutionTarget) -> StrategyOutcome<PageHarvest> {
        if target.classification.skip_fetch {
            return StrategyOutcome::NoResult(ResolveError::skipped(
                "scrape",
                target.input.as_str(),
                "publisher is not scrapable",
            ));
        }
        let Some(fetch_url) = target.fetch_url.as_ref() else {
            return StrategyOutcome::NoResult(ResolveError::skipped(
                "scrape",
                target.input.as_str(),
                "input has no usable host",
            ));
        };

        let document = match self
            .fetcher
            .fetch_page(fetch_url, self.config.page_timeout())
            .await
        {
            Ok(document) => document,
            Err(error) => return StrategyOutcome::NoResult(error),
        };

        if document.is_pdf() || target.classification.is_pdf_path {
            let title = extract_pdf_title(&document.body, fetch_url.as_str());
            if let StrategyOutcome::NoResult(error) = &title {
                debug!(%error, "no PDF title");
            }
            return StrategyOutcome::Found(PageHarvest {
                title: title.found(),
                title_source: Some(TitleSource::Pdf),
                icon_url: None,
            });
        }

        let (page, icon_url) = self.harvest_html(&document).await;
        StrategyOutcome::Found(PageHarvest {
            title: page.title,
            title_source: Some(TitleSource::Page),
            icon_url,
        })
    }

    async fn harvest_html(&self, document: &FetchedDocument) -> (ScrapedPage, Option<String>) {
        let page = ScrapedPage::parse(&document.text());
        let icon = resolve_icon(
            &page.links,
            &document.final_url,
            &self.fetcher,
            self.config.manifest_timeout(),
        )
        .await;
        (page, icon)
    }

    /// Icon for an oEmbed hit that carried none, governed by the icon policy.
    async fn icon_after_oembed(
        &self,
        target: &ResolutionTarget,
        oembed: &OembedResult,
        already_fetched: bool,
    ) -> Option<String> {
        if oembed.icon_url.is_some() || already_fetched {
            return None;
        }
        if !self
            .config
            .icon_policy
            .allows_fetch(target.classification.skip_fetch)
        {
            debug!(policy = %self.config.icon_policy, "icon-only fetch not allowed");
            return None;
        }
        let fetch_url = target.fetch_url.as_ref()?;
        match self
            .fetcher
            .fetch_page(fetch_url, self.config.page_timeout())
            .await
        {
            Ok(document) if !document.is_pdf() => self.harvest_html(&document).await.1,
            Ok(_) => None,
            Err(error) => {
                debug!(%error, "icon-only fetch failed");
                None
            }
        }
    }

    /// Slug title when the publisher has a slug style (or the page was fetched),
    /// else the normalized URL.
    fn fallback_title(&self, target: &ResolutionTarget, fetched: bool) -> (String, TitleSource) {
        let style = target
            .classification
            .slug_style
            .or_else(|| fetched.then_some(SlugStyle::Plain));
        style
            .map(|style| slug_to_title(target.input.path(), style))
            .filter(|title| !title.is_empty())
            .map_or_else(
                || (target.input.as_str().to_string(), TitleSource::Url),
                |title| (title, TitleSource::Slug),
            )
    }

    fn oembed_record(
        &self,
        target: &ResolutionTarget,
        oembed: OembedResult,
        icon: Option<String>,
    ) -> ResolvedMetadata {
        let icon_url = oembed.icon_url.or(icon);
        let mut record = self.record(target, oembed.title, TitleSource::Oembed, icon_url);
        if let Some(publisher) = oembed.publisher_override {
            record.publisher = publisher;
        }
        record
    }

    fn record(
        &self,
        target: &ResolutionTarget,
        title: String,
        source: TitleSource,
        icon_url: Option<String>,
    ) -> ResolvedMetadata {
        let (title, source) = if title.trim().is_empty() {
            (target.input.as_str().to_string(), TitleSource::Url)
        } else {
            (title, source)
        };
        ResolvedMetadata {
            title,
            publisher: target.publisher.clone(),
            icon_url: icon_url.or_else(|| target.input.default_favicon()),
            source,
        }
    }
}
