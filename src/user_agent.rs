//! Request identities: browser-like headers for page fetches, a tool
//! User-Agent for API calls (oEmbed, Crossref).

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA, USER_AGENT,
};

/// Project URL for User-Agent identification on API traffic.
const PROJECT_UA_URL: &str = "https://github.com/fierce/linkcard";

/// Browser User-Agent sent on page fetches; many publishers reject obvious bots outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// User-Agent for API requests (identifies the tool).
#[must_use]
pub(crate) fn api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("linkcard/{version} (link-preview; +{PROJECT_UA_URL})")
}

/// Header set for page fetches.
#[must_use]
pub(crate) fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_user_agent_contains_version_and_project_url() {
        let ua = api_user_agent();
        assert!(ua.contains(PROJECT_UA_URL), "API UA must contain project URL");
        assert_eq!(
            Some(env!("CARGO_PKG_VERSION")),
            ua.strip_prefix("linkcard/").and_then(|s| s.split(' ').next()),
            "API UA must contain crate version"
        );
    }

    #[test]
    fn test_browser_headers_look_like_a_browser() {
        let headers = browser_headers();
        let ua = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or_default();
        assert!(ua.starts_with("Mozilla/5.0"));
        assert!(!ua.contains("linkcard"), "page fetches must not identify the tool");
        assert!(headers.contains_key(ACCEPT));
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
        assert_eq!(headers.get(PRAGMA).unwrap(), "no-cache");
    }
}
