//! DOI extraction from publisher URL paths.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::resolver::utils::compile_static_regex;

/// DOI embedded after a `/doi/` segment, optionally behind `abs/`, `full/`,
/// `pdf/` or `suppl/`. The suffix runs until a slash, whitespace, query or fragment.
static DOI_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"/doi/(?:abs/|full/|pdf/|suppl/)?(10\.\d{4,9}/[^\s/?#]+)")
});

/// Extracts a DOI from a publisher URL such as `https://www.science.org/doi/full/10.1126/science.abc`.
///
/// Percent-encoded characters in the DOI suffix are decoded.
///
/// # Examples
///
/// ```
/// use linkcard_core::parser::extract_doi_from_url;
///
/// assert_eq!(
///     extract_doi_from_url("https://www.science.org/doi/full/10.1126/science.abcd1234"),
///     Some("10.1126/science.abcd1234".to_string())
/// );
/// assert_eq!(extract_doi_from_url("https://example.com/blog/post"), None);
/// ```
#[must_use]
pub fn extract_doi_from_url(url: &str) -> Option<String> {
    let captured = DOI_PATH_PATTERN.captures(url)?.get(1)?.as_str();
    let doi = match urlencoding::decode(captured) {
        Ok(decoded) => decoded.trim().to_string(),
        Err(_) => captured.to_string(),
    };
    trace!(doi = %doi, "found DOI in URL path");
    Some(doi)
}
