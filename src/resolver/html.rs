//! Title and icon-link extraction from fetched HTML.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::icon::IconLinks;
use super::utils::{clean_text, compile_static_selector};

/// Titles shorter than this (in characters) are treated as missing.
pub const MIN_USABLE_TITLE_CHARS: usize = 4;

static OG_TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector(r#"meta[property="og:title"], meta[name="og:title"]"#)
});
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("title"));

/// Everything the orchestrator needs from an HTML document.
///
/// Owned data only; the parsed DOM is dropped before any network call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedPage {
    /// `og:title`, else `<title>`, cleaned.
    pub title: Option<String>,
    /// Icon-related `<link>` elements.
    pub links: IconLinks,
}

impl ScrapedPage {
    /// Parses `body` and extracts the title and icon links.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let document = Html::parse_document(body);
        Self {
            title: extract_title(&document),
            links: IconLinks::scan(&document),
        }
    }

    /// The title if it is long enough to display.
    #[must_use]
    pub fn usable_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| is_usable_title(t))
    }
}

/// `og:title` content (property or name form) when non-empty, else the
/// document `<title>` text.
#[must_use]
pub fn extract_title(document: &Html) -> Option<String> {
    let og = document
        .select(&OG_TITLE_SELECTOR)
        .filter_map(|meta| meta.value().attr("content"))
        .map(clean_text)
        .find(|content| !content.is_empty());
    if og.is_some() {
        return og;
    }

    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| clean_text(&title.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

/// True when `title` has at least [`MIN_USABLE_TITLE_CHARS`] characters.
#[must_use]
pub fn is_usable_title(title: &str) -> bool {
    title.trim().chars().count() >= MIN_USABLE_TITLE_CHARS
}
