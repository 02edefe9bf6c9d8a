//! URL normalization: scheme defaulting, host parsing and publisher labels.

use tracing::trace;
use url::Url;

use crate::resolver::utils::{canonical_host, default_favicon};

/// Publisher label used when the input has no parseable hostname.
pub const PUBLISHER_PLACEHOLDER: &str = "—";

/// A user-supplied URL after scheme defaulting and parsing.
///
/// Normalization never fails. When the string cannot be parsed as a URL with a
/// host, [`NormalizedUrl::url`] is `None` and the publisher is
/// [`PUBLISHER_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    raw: String,
    parsed: Option<Url>,
    publisher: String,
}

impl NormalizedUrl {
    /// Normalizes raw input.
    ///
    /// Leading/trailing whitespace is trimmed and `https://` is prepended when
    /// the input has no `http://` or `https://` prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkcard_core::parser::NormalizedUrl;
    ///
    /// let url = NormalizedUrl::parse("www.example.com/story");
    /// assert_eq!(url.as_str(), "https://www.example.com/story");
    /// assert_eq!(url.publisher(), "example.com");
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let raw = if has_web_scheme(trimmed) {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let parsed = Url::parse(&raw)
            .ok()
            .filter(|url| url.host_str().is_some_and(|host| !host.is_empty()));
        let publisher = parsed
            .as_ref()
            .and_then(Url::host_str)
            .map(canonical_host)
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| PUBLISHER_PLACEHOLDER.to_string());

        trace!(raw = %raw, publisher = %publisher, parsed = parsed.is_some(), "normalized URL");
        Self {
            raw,
            parsed,
            publisher,
        }
    }

    /// The normalized string form (scheme-prefixed input). Used as the title of last resort.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed URL, when the input had a usable host.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.parsed.as_ref()
    }

    /// Bare hostname without a leading `www.`, or the placeholder glyph.
    #[must_use]
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    /// True when the input had a parseable hostname.
    #[must_use]
    pub fn has_host(&self) -> bool {
        self.parsed.is_some()
    }

    /// URL path, or an empty string when unparseable.
    #[must_use]
    pub fn path(&self) -> &str {
        self.parsed.as_ref().map_or("", Url::path)
    }

    /// `{scheme}://{host}/favicon.ico` for the input, when it has a host.
    #[must_use]
    pub fn default_favicon(&self) -> Option<String> {
        self.parsed.as_ref().and_then(default_favicon)
    }
}

impl std::fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn has_web_scheme(value: &str) -> bool {
    let lower = value
        .get(..8)
        .map_or_else(|| value.to_ascii_lowercase(), str::to_ascii_lowercase);
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Returns true when the path looks like a PDF: a `.pdf` extension
/// (case-insensitive) or a `/pdf/` segment.
#[must_use]
pub fn is_pdf_path(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".pdf") || path.contains("/pdf/")
}
