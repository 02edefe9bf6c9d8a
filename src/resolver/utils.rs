//! Shared utilities for resolver modules: host matching, static patterns, and text cleanup.

use regex::Regex;
use scraper::Selector;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Compiles a CSS selector at static init; panics on invalid selector.
pub fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector)
        .unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e:?}"))
}

/// Normalizes a host string: trim, strip a leading "www.", strip trailing '.', lowercase.
#[must_use]
pub fn canonical_host(host: &str) -> String {
    let lowered = host.trim().trim_end_matches('.').to_ascii_lowercase();
    match lowered.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

/// Returns true if `host` equals `suffix` or is a subdomain of it.
///
/// Matching is on label boundaries, so `fox.com` does not match `x.com`.
#[must_use]
pub fn host_matches_suffix(host: &str, suffix: &str) -> bool {
    let host = canonical_host(host);
    let suffix = canonical_host(suffix);
    if suffix.is_empty() {
        return false;
    }
    host == suffix
        || host
            .strip_suffix(suffix.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Resolves a possibly relative href against a base URL.
///
/// Protocol-relative `//host/x` inherits the base scheme. Returns `None` for
/// empty hrefs and for results that are not http(s).
#[must_use]
pub fn absolutize_url(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let joined = base_url.join(href).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// `{scheme}://{host}/favicon.ico` for the given URL, keeping a non-default port.
#[must_use]
pub fn default_favicon(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    Some(format!("{}://{host}{port}/favicon.ico", url.scheme()))
}

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes HTML entities, then collapses whitespace.
///
/// Page titles are already entity-decoded once by the HTML parser; running the
/// decoder again catches double-escaped markup (`&amp;amp;`) that many CMSes emit.
#[must_use]
pub fn clean_text(value: &str) -> String {
    collapse_whitespace(&html_escape::decode_html_entities(value))
}
