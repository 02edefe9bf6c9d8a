//! oEmbed lookups for known media and social providers.
//!
//! The provider row decides the endpoint and how its JSON is read; see
//! [`ResponseShape`].

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::Html;
use serde::Deserialize;
use tracing::debug;

use super::http_client::HttpFetcher;
use super::rules::{ProviderRule, ResponseShape};
use super::utils::{clean_text, compile_static_regex};
use super::{ResolveError, StrategyOutcome};

static FIRST_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>"));

static TRAILING_SHORT_LINK: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"https?://t\.co/\S+$"));

/// Fields read from an oEmbed response. Everything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct OembedPayload {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub html: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// What an oEmbed provider contributed to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OembedResult {
    /// Display title.
    pub title: String,
    /// Icon supplied by the provider (audio tracks only).
    pub icon_url: Option<String>,
    /// Publisher label that replaces the hostname.
    pub publisher_override: Option<String>,
}

/// Calls the provider endpoint for `target` and interprets the response.
#[tracing::instrument(skip(fetcher, rule), fields(strategy = "oembed", provider = %rule.host_suffix))]
pub(crate) async fn fetch_oembed(
    fetcher: &HttpFetcher,
    rule: &ProviderRule,
    target: &str,
    timeout: Duration,
) -> StrategyOutcome<OembedResult> {
    let endpoint = rule.endpoint_for(target);
    debug!(endpoint = %endpoint, "calling oEmbed endpoint");
    match fetcher.fetch_json::<OembedPayload>(&endpoint, timeout).await {
        Ok(payload) => interpret(rule, payload, target),
        Err(error) => StrategyOutcome::NoResult(error),
    }
}

/// Applies the provider's response shape to a decoded payload.
pub(crate) fn interpret(
    rule: &ProviderRule,
    payload: OembedPayload,
    target: &str,
) -> StrategyOutcome<OembedResult> {
    let title = non_empty(payload.title.as_deref());
    let author = non_empty(payload.author_name.as_deref());

    let (title, icon_url) = match rule.shape {
        ResponseShape::RedditPost => (title, None),
        ResponseShape::SocialPost => {
            let text = payload.html.as_deref().and_then(social_post_text);
            let title = match (author, text) {
                (Some(author), Some(text)) => Some(format!("{author}: {text}")),
                (None, Some(text)) => Some(text),
                (author, None) => author,
            };
            (title, None)
        }
        ResponseShape::AudioTrack => (title, non_empty(payload.thumbnail_url.as_deref())),
        ResponseShape::AuthorByline => {
            let title = match (title, author) {
                (Some(title), Some(author)) => Some(format!("{title} by {author}")),
                (title, _) => title,
            };
            (title, None)
        }
    };

    match title {
        Some(title) => StrategyOutcome::Found(OembedResult {
            title,
            icon_url,
            publisher_override: rule.canonical_publisher.clone(),
        }),
        None => StrategyOutcome::NoResult(ResolveError::missing("title", target)),
    }
}

/// Plain text of the first `<p>` in an embed snippet, minus a trailing short link.
fn social_post_text(snippet: &str) -> Option<String> {
    let inner = FIRST_PARAGRAPH.captures(snippet)?.get(1)?.as_str();
    let fragment = Html::parse_fragment(inner);
    let text = fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let text = clean_text(&text);
    let text = TRAILING_SHORT_LINK.replace(&text, "");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(clean_text).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::resolver::http_client::build_http_client;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn rule(shape: ResponseShape) -> ProviderRule {
        ProviderRule::new("example.com", "https://example.com/oembed?url={url}", shape)
    }

    fn payload(json: serde_json::Value) -> OembedPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_social_post_author_and_paragraph_text() {
        let outcome = interpret(
            &rule(ResponseShape::SocialPost),
            payload(serde_json::json!({
                "author_name": "Jane",
                "html": "<blockquote class=\"twitter-tweet\"><p>Hello <a>world</a> https://t.co/xyz</p>&mdash; Jane (@jane)</blockquote>"
            })),
            "https://x.com/jane/status/1",
        );
        assert_eq!(outcome.found().unwrap().title, "Jane: Hello world");
    }

    #[test]
    fn test_social_post_unescapes_and_falls_back_to_author() {
        let outcome = interpret(
            &rule(ResponseShape::SocialPost),
            payload(serde_json::json!({
                "author_name": "Jane",
                "html": "<p lang=\"en\" dir=\"ltr\">Fish &amp;amp; chips</p>"
            })),
            "t",
        );
        assert_eq!(outcome.found().unwrap().title, "Jane: Fish & chips");

        let outcome = interpret(
            &rule(ResponseShape::SocialPost),
            payload(serde_json::json!({"author_name": "Jane", "html": "<div>no paragraph</div>"})),
            "t",
        );
        assert_eq!(outcome.found().unwrap().title, "Jane");

        let outcome = interpret(&rule(ResponseShape::SocialPost), payload(serde_json::json!({})), "t");
        assert!(!outcome.is_found());
    }

    #[test]
    fn test_reddit_post_title_unescaped() {
        let outcome = interpret(
            &rule(ResponseShape::RedditPost),
            payload(serde_json::json!({"title": " Rust &amp; WebAssembly ", "author_name": "u"})),
            "t",
        );
        assert_eq!(outcome.found().unwrap().title, "Rust & WebAssembly");
    }

    #[test]
    fn test_audio_track_icon_and_publisher_override() {
        let rule = rule(ResponseShape::AudioTrack).with_canonical_publisher("spotify.com");
        let outcome = interpret(
            &rule,
            payload(serde_json::json!({
                "title": "Song",
                "thumbnail_url": "https://i.scdn.co/image/ab&amp;x"
            })),
            "t",
        );
        let result = outcome.found().unwrap();
        assert_eq!(result.title, "Song");
        assert_eq!(result.icon_url.as_deref(), Some("https://i.scdn.co/image/ab&x"));
        assert_eq!(result.publisher_override.as_deref(), Some("spotify.com"));
    }

    #[test]
    fn test_author_byline_variants() {
        let by = rule(ResponseShape::AuthorByline);
        let outcome = interpret(
            &by,
            payload(serde_json::json!({"title": "Talk", "author_name": "RustConf"})),
            "t",
        );
        assert_eq!(outcome.found().unwrap().title, "Talk by RustConf");

        let outcome = interpret(&by, payload(serde_json::json!({"title": "Talk"})), "t");
        assert_eq!(outcome.found().unwrap().title, "Talk");

        let outcome = interpret(&by, payload(serde_json::json!({"author_name": "RustConf"})), "t");
        assert!(matches!(
            outcome,
            StrategyOutcome::NoResult(ResolveError::MissingField { field: "title", .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_oembed_encodes_target_into_endpoint() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .and(query_param("url", "https://vimeo.com/123?h=a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "video",
                "title": "Clip",
                "author_name": "Studio"
            })))
            .mount(&mock_server)
            .await;

        let rule = ProviderRule::new(
            "vimeo.com",
            format!("{}/oembed?url={{url}}", mock_server.uri()),
            ResponseShape::AuthorByline,
        );
        let fetcher = HttpFetcher::new(build_http_client(&ResolverConfig::default()).unwrap(), 4096);
        let outcome = fetch_oembed(
            &fetcher,
            &rule,
            "https://vimeo.com/123?h=a",
            Duration::from_secs(2),
        )
        .await;
        assert_eq!(outcome.found().unwrap().title, "Clip by Studio");
    }

    #[tokio::test]
    async fn test_fetch_oembed_error_status_is_no_result() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let rule = ProviderRule::new(
            "x.com",
            format!("{}/oembed?url={{url}}", mock_server.uri()),
            ResponseShape::SocialPost,
        );
        let fetcher = HttpFetcher::new(build_http_client(&ResolverConfig::default()).unwrap(), 4096);
        let outcome = fetch_oembed(&fetcher, &rule, "https://x.com/a/status/1", Duration::from_secs(2)).await;
        assert!(matches!(
            outcome,
            StrategyOutcome::NoResult(ResolveError::HttpStatus { status: 403, .. })
        ));
    }
}
