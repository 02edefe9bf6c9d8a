//! Static per-publisher rule tables and URL classification.
//!
//! Provider quirks are data, not branches: adding a publisher means adding a
//! row to [`RuleBook::builtin`], never editing the orchestrator. A book is
//! immutable once built and shared behind an `Arc`.

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::parser::{NormalizedUrl, SlugStyle, extract_doi_from_url, is_pdf_path};

use super::utils::host_matches_suffix;

/// Placeholder in [`ProviderRule::endpoint_template`] replaced by the percent-encoded target URL.
pub const URL_PLACEHOLDER: &str = "{url}";

/// How to interpret an oEmbed JSON response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseShape {
    /// `"{title} by {author_name}"` (video and audio platforms).
    AuthorByline,
    /// Link-aggregator post: unescaped `title`.
    RedditPost,
    /// Social post: `"{author}: {post text}"` from the embedded HTML paragraph.
    SocialPost,
    /// Audio track: `title` plus `thumbnail_url` as the icon.
    AudioTrack,
}

/// Maps a host suffix to an oEmbed endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRule {
    /// Host suffix matched on label boundaries against the publisher.
    pub host_suffix: String,
    /// Endpoint URL containing [`URL_PLACEHOLDER`].
    pub endpoint_template: String,
    /// Response interpretation.
    pub shape: ResponseShape,
    /// Publisher label to report instead of the hostname (e.g. `spotify.com` for `open.spotify.com`).
    pub canonical_publisher: Option<String>,
}

impl ProviderRule {
    /// Creates a rule with no publisher override.
    #[must_use]
    pub fn new(
        host_suffix: impl Into<String>,
        endpoint_template: impl Into<String>,
        shape: ResponseShape,
    ) -> Self {
        Self {
            host_suffix: host_suffix.into(),
            endpoint_template: endpoint_template.into(),
            shape,
            canonical_publisher: None,
        }
    }

    /// Sets the publisher label reported for this provider.
    #[must_use]
    pub fn with_canonical_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.canonical_publisher = Some(publisher.into());
        self
    }

    /// Builds the endpoint URL for `target`.
    #[must_use]
    pub fn endpoint_for(&self, target: &str) -> String {
        self.endpoint_template
            .replace(URL_PLACEHOLDER, &urlencoding::encode(target))
    }
}

/// URL rewrite applied before fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRewrite {
    /// Comment threads (`/comments/` paths) are fetched from a server-rendered mirror host.
    CommentMirror {
        /// Mirror host, e.g. `old.reddit.com`.
        mirror_host: String,
    },
    /// Preprint PDF paths (`/pdf/{id}`) are fetched from the abstract page (`/abs/{id}`).
    AbstractPage,
}

/// Per-publisher capabilities beyond oEmbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherRule {
    /// Host suffix matched on label boundaries against the publisher.
    pub host_suffix: String,
    /// Never fetch pages from this publisher (paywalled or script-rendered).
    pub skip_fetch: bool,
    /// Slug style used when no structured title is available.
    pub slug_style: Option<SlugStyle>,
    /// Rewrite applied to the fetch URL.
    pub rewrite: Option<UrlRewrite>,
}

impl PublisherRule {
    /// Creates a rule with no capabilities set.
    #[must_use]
    pub fn new(host_suffix: impl Into<String>) -> Self {
        Self {
            host_suffix: host_suffix.into(),
            skip_fetch: false,
            slug_style: None,
            rewrite: None,
        }
    }

    /// Marks the publisher as unscrapable.
    #[must_use]
    pub fn skip_fetch(mut self) -> Self {
        self.skip_fetch = true;
        self
    }

    /// Sets the slug style.
    #[must_use]
    pub fn slug(mut self, style: SlugStyle) -> Self {
        self.slug_style = Some(style);
        self
    }

    /// Sets the fetch URL rewrite.
    #[must_use]
    pub fn rewrite(mut self, rewrite: UrlRewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }
}

/// Flags derived from an input URL; drives which strategies run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlClassification {
    /// Link-aggregator comment thread rewritten to a mirror host.
    pub is_comment_thread: bool,
    /// Preprint PDF rewritten to its abstract page.
    pub is_preprint_pdf: bool,
    /// Fetch URL path looks like a PDF.
    pub is_pdf_path: bool,
    /// DOI found in the URL path.
    pub doi: Option<String>,
    /// A known oEmbed provider matches the publisher.
    pub has_oembed_provider: bool,
    /// Publisher is in the unscrapable set.
    pub skip_fetch: bool,
    /// Slug style for the publisher, if it has one.
    pub slug_style: Option<SlugStyle>,
}

/// An input URL with rewrites applied, ready for the strategy chain.
#[derive(Debug, Clone)]
pub struct ResolutionTarget {
    /// The normalized user input.
    pub input: NormalizedUrl,
    /// URL to fetch for scraping (possibly rewritten); `None` when unparseable.
    pub fetch_url: Option<Url>,
    /// Rewrite-aware publisher label.
    pub publisher: String,
    /// Derived flags.
    pub classification: UrlClassification,
}

static BUILTIN_RULES: LazyLock<Arc<RuleBook>> = LazyLock::new(|| {
    let providers = vec![
        ProviderRule::new(
            "open.spotify.com",
            "https://open.spotify.com/oembed?url={url}",
            ResponseShape::AudioTrack,
        )
        .with_canonical_publisher("spotify.com"),
        ProviderRule::new(
            "youtube.com",
            "https://www.youtube.com/oembed?url={url}&format=json",
            ResponseShape::AuthorByline,
        ),
        ProviderRule::new(
            "youtu.be",
            "https://www.youtube.com/oembed?url={url}&format=json",
            ResponseShape::AuthorByline,
        ),
        ProviderRule::new(
            "twitter.com",
            "https://publish.twitter.com/oembed?url={url}",
            ResponseShape::SocialPost,
        ),
        ProviderRule::new(
            "x.com",
            "https://publish.twitter.com/oembed?url={url}",
            ResponseShape::SocialPost,
        ),
        ProviderRule::new(
            "vimeo.com",
            "https://vimeo.com/api/oembed.json?url={url}",
            ResponseShape::AuthorByline,
        ),
        ProviderRule::new(
            "soundcloud.com",
            "https://soundcloud.com/oembed?url={url}&format=json",
            ResponseShape::AuthorByline,
        ),
        ProviderRule::new(
            "reddit.com",
            "https://www.reddit.com/oembed?url={url}&format=json",
            ResponseShape::RedditPost,
        ),
    ];

    let publishers = vec![
        PublisherRule::new("wsj.com")
            .skip_fetch()
            .slug(SlugStyle::TrailingId),
        PublisherRule::new("medium.com").slug(SlugStyle::TrailingId),
        PublisherRule::new("washingtonpost.com")
            .skip_fetch()
            .slug(SlugStyle::Plain),
        PublisherRule::new("facebook.com")
            .skip_fetch()
            .slug(SlugStyle::Plain),
        PublisherRule::new("x.com")
            .skip_fetch()
            .slug(SlugStyle::MicroPost),
        PublisherRule::new("twitter.com")
            .skip_fetch()
            .slug(SlugStyle::MicroPost),
        PublisherRule::new("reddit.com").rewrite(UrlRewrite::CommentMirror {
            mirror_host: "old.reddit.com".to_string(),
        }),
        PublisherRule::new("arxiv.org").rewrite(UrlRewrite::AbstractPage),
    ];

    Arc::new(RuleBook::new(providers, publishers))
});

/// Immutable oEmbed provider and publisher rule tables.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    providers: Vec<ProviderRule>,
    publishers: Vec<PublisherRule>,
}

impl RuleBook {
    /// Creates a book from explicit tables. Earlier rows win on overlap.
    #[must_use]
    pub fn new(providers: Vec<ProviderRule>, publishers: Vec<PublisherRule>) -> Self {
        Self {
            providers,
            publishers,
        }
    }

    /// The process-wide built-in tables, constructed once.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_RULES)
    }

    /// oEmbed provider rows in match order.
    #[must_use]
    pub fn providers(&self) -> &[ProviderRule] {
        &self.providers
    }

    /// Publisher rows in match order.
    #[must_use]
    pub fn publishers(&self) -> &[PublisherRule] {
        &self.publishers
    }

    /// First oEmbed provider whose suffix matches `publisher`.
    #[must_use]
    pub fn provider_for(&self, publisher: &str) -> Option<&ProviderRule> {
        self.providers
            .iter()
            .find(|rule| host_matches_suffix(publisher, &rule.host_suffix))
    }

    /// First publisher rule whose suffix matches `publisher`.
    #[must_use]
    pub fn publisher_rule(&self, publisher: &str) -> Option<&PublisherRule> {
        self.publishers
            .iter()
            .find(|rule| host_matches_suffix(publisher, &rule.host_suffix))
    }

    /// Applies rewrites and derives the classification for `input`.
    #[tracing::instrument(skip(self, input), fields(input = %input))]
    #[must_use]
    pub fn plan(&self, input: NormalizedUrl) -> ResolutionTarget {
        let mut publisher = input.publisher().to_string();
        let mut fetch_url = input.url().cloned();
        let mut classification = UrlClassification {
            doi: extract_doi_from_url(input.as_str()),
            ..UrlClassification::default()
        };

        if let Some(rule) = self.publisher_rule(&publisher) {
            classification.skip_fetch = rule.skip_fetch;
            classification.slug_style = rule.slug_style;

            match (&rule.rewrite, fetch_url.as_mut()) {
                (Some(UrlRewrite::CommentMirror { mirror_host }), Some(url))
                    if url.path().contains("/comments/") =>
                {
                    if url.set_host(Some(mirror_host.as_str())).is_ok() {
                        classification.is_comment_thread = true;
                        publisher.clone_from(&rule.host_suffix);
                    }
                }
                (Some(UrlRewrite::AbstractPage), Some(url)) if url.path().contains("/pdf/") => {
                    let abstract_path = abstract_path_for(url.path());
                    url.set_path(&abstract_path);
                    classification.is_preprint_pdf = true;
                }
                _ => {}
            }
        }

        classification.is_pdf_path = fetch_url.as_ref().is_some_and(|url| is_pdf_path(url.path()));
        classification.has_oembed_provider = self.provider_for(&publisher).is_some();

        debug!(
            publisher = %publisher,
            fetch_url = fetch_url.as_ref().map(Url::as_str),
            ?classification,
            "classified URL"
        );
        ResolutionTarget {
            input,
            fetch_url,
            publisher,
            classification,
        }
    }
}

fn abstract_path_for(path: &str) -> String {
    let rewritten = path.replacen("/pdf/", "/abs/", 1);
    let lower = rewritten.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        rewritten[..rewritten.len() - 4].to_string()
    } else {
        rewritten
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn plan(input: &str) -> ResolutionTarget {
        RuleBook::builtin().plan(NormalizedUrl::parse(input))
    }

    #[test]
    fn test_builtin_provider_lookup_by_suffix() {
        let book = RuleBook::builtin();
        assert_eq!(
            book.provider_for("m.youtube.com").unwrap().shape,
            ResponseShape::AuthorByline
        );
        assert_eq!(
            book.provider_for("open.spotify.com").unwrap().canonical_publisher.as_deref(),
            Some("spotify.com")
        );
        assert_eq!(book.provider_for("x.com").unwrap().shape, ResponseShape::SocialPost);
        assert!(book.provider_for("fox.com").is_none());
        assert!(book.provider_for("spotify.com").is_none());
    }

    #[test]
    fn test_endpoint_for_percent_encodes_target() {
        let rule = ProviderRule::new(
            "vimeo.com",
            "https://vimeo.com/api/oembed.json?url={url}",
            ResponseShape::AuthorByline,
        );
        assert_eq!(
            rule.endpoint_for("https://vimeo.com/123?h=a&b=c"),
            "https://vimeo.com/api/oembed.json?url=https%3A%2F%2Fvimeo.com%2F123%3Fh%3Da%26b%3Dc"
        );
    }

    #[test]
    fn test_plan_reddit_comment_thread_uses_mirror() {
        let target = plan("https://www.reddit.com/r/rust/comments/abc123/some_title/");
        assert!(target.classification.is_comment_thread);
        assert_eq!(target.publisher, "reddit.com");
        assert_eq!(
            target.fetch_url.unwrap().as_str(),
            "https://old.reddit.com/r/rust/comments/abc123/some_title/"
        );
        assert!(target.classification.has_oembed_provider);
        assert_eq!(
            target.input.as_str(),
            "https://www.reddit.com/r/rust/comments/abc123/some_title/"
        );
    }

    #[test]
    fn test_plan_reddit_subdomain_publisher_overridden() {
        let target = plan("https://np.reddit.com/r/rust/comments/abc123/x/");
        assert_eq!(target.publisher, "reddit.com");
    }

    #[test]
    fn test_plan_reddit_listing_not_rewritten() {
        let target = plan("https://www.reddit.com/r/rust/");
        assert!(!target.classification.is_comment_thread);
        assert_eq!(target.fetch_url.unwrap().host_str(), Some("www.reddit.com"));
    }

    #[test]
    fn test_plan_arxiv_pdf_rewritten_to_abstract() {
        let target = plan("https://arxiv.org/pdf/2301.01234v2.pdf");
        assert!(target.classification.is_preprint_pdf);
        assert!(!target.classification.is_pdf_path);
        assert_eq!(
            target.fetch_url.unwrap().as_str(),
            "https://arxiv.org/abs/2301.01234v2"
        );
        assert_eq!(target.publisher, "arxiv.org");
    }

    #[test]
    fn test_plan_unscrapable_publisher_flags() {
        let target = plan("https://www.wsj.com/articles/my-great-story-123456");
        assert!(target.classification.skip_fetch);
        assert_eq!(target.classification.slug_style, Some(SlugStyle::TrailingId));
        assert!(!target.classification.has_oembed_provider);

        let target = plan("https://x.com/jane/status/42");
        assert!(target.classification.skip_fetch);
        assert!(target.classification.has_oembed_provider);
    }

    #[test]
    fn test_plan_detects_doi_and_pdf_path() {
        let target = plan("https://www.science.org/doi/pdf/10.1126/science.abcd1234");
        assert_eq!(
            target.classification.doi.as_deref(),
            Some("10.1126/science.abcd1234")
        );
        assert!(target.classification.is_pdf_path);
    }

    #[test]
    fn test_plan_unparseable_input() {
        let target = plan("https://");
        assert!(target.fetch_url.is_none());
        assert_eq!(target.publisher, crate::parser::PUBLISHER_PLACEHOLDER);
        assert!(!target.classification.has_oembed_provider);
    }

    #[test]
    fn test_custom_rule_book_earlier_rows_win() {
        let book = RuleBook::new(
            vec![
                ProviderRule::new("example.com", "https://a/{url}", ResponseShape::RedditPost),
                ProviderRule::new("example.com", "https://b/{url}", ResponseShape::AuthorByline),
            ],
            vec![],
        );
        assert_eq!(
            book.provider_for("example.com").unwrap().endpoint_template,
            "https://a/{url}"
        );
    }
}
