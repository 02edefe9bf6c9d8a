//! Headline-style titles derived from URL slugs.
//!
//! Used for publishers whose pages cannot be scraped (paywalls, script-rendered
//! front ends) and when a scraped title is too short to be useful.

use serde::{Deserialize, Serialize};

/// Words kept lowercase unless they open or close the title.
const SMALL_WORDS: [&str; 16] = [
    "a", "an", "and", "as", "at", "but", "by", "for", "in", "of", "on", "or", "the", "to", "via",
    "vs",
];

/// Publisher-specific slug handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlugStyle {
    /// Titlecase the last path segment.
    #[default]
    Plain,
    /// The slug ends in an article id token (`my-story-123456`); drop it.
    TrailingId,
    /// Micro-blog post URL (`/{author}/status/{id}`); render `"{author}: Post #{id}"`.
    MicroPost,
}

/// Derives a title from a URL path.
///
/// Returns an empty string when nothing usable remains, so the caller can fall
/// back to the raw URL.
///
/// # Examples
///
/// ```
/// use linkcard_core::parser::{SlugStyle, slug_to_title};
///
/// assert_eq!(
///     slug_to_title("/articles/my-great-story-123456", SlugStyle::TrailingId),
///     "My Great Story"
/// );
/// assert_eq!(slug_to_title("/jane/status/1789", SlugStyle::MicroPost), "jane: Post #1789");
/// ```
#[must_use]
pub fn slug_to_title(path: &str, style: SlugStyle) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(last) = segments.last() else {
        return String::new();
    };
    let candidate = strip_page_suffixes(&decode_segment(last));

    if style == SlugStyle::MicroPost
        && segments.len() >= 2
        && !candidate.is_empty()
        && candidate.chars().all(|c| c.is_ascii_digit())
    {
        let author = decode_segment(segments[0]);
        return format!("{author}: Post #{candidate}");
    }

    let spaced = candidate.replace(['_', '-'], " ");
    let mut words: Vec<&str> = spaced.split_whitespace().collect();
    if style == SlugStyle::TrailingId {
        words.pop();
    }
    titlecase(&words)
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned())
}

fn strip_page_suffixes(segment: &str) -> String {
    let without_query = segment
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let lower = without_query.to_ascii_lowercase();
    for ext in [".html", ".htm"] {
        if lower.ends_with(ext) {
            return without_query[..without_query.len() - ext.len()].to_string();
        }
    }
    without_query.to_string()
}

fn titlecase(words: &[&str]) -> String {
    let cleaned: Vec<&str> = words
        .iter()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|w| !w.is_empty())
        .collect();
    let last_index = cleaned.len().saturating_sub(1);

    cleaned
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i != 0 && i != last_index && SMALL_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(&lower)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
