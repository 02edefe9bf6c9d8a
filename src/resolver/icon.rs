//! Site icon discovery from `<link>` elements and web manifests.
//!
//! Priority: SVG icon, largest apple-touch icon, largest plain icon, largest
//! manifest icon, then `/favicon.ico` on the document's host.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::http_client::HttpFetcher;
use super::utils::{absolutize_url, compile_static_selector, default_favicon};

/// Area assumed for an icon without a parseable size hint.
const DEFAULT_ICON_AREA: u64 = 64 * 64;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("link[rel][href]"));

/// A declared icon before URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCandidate {
    /// Raw `href` (or manifest `src`).
    pub href: String,
    /// Raw `sizes` attribute, e.g. `"16x16 32x32"`.
    pub size_hint: Option<String>,
}

impl IconCandidate {
    /// Creates a candidate.
    #[must_use]
    pub fn new(href: impl Into<String>, size_hint: Option<&str>) -> Self {
        Self {
            href: href.into(),
            size_hint: size_hint.map(str::to_string),
        }
    }

    /// Scored area of this candidate; see [`icon_area`].
    #[must_use]
    pub fn area(&self) -> u64 {
        icon_area(self.size_hint.as_deref())
    }
}

/// Scores a `sizes` hint: the largest `WxH` token's area, or 64×64 when no
/// token parses.
#[must_use]
pub fn icon_area(size_hint: Option<&str>) -> u64 {
    size_hint
        .into_iter()
        .flat_map(str::split_whitespace)
        .filter_map(|token| {
            let token = token.to_ascii_lowercase();
            let (w, h) = token.split_once('x')?;
            let w = w.parse::<u64>().ok()?;
            let h = h.parse::<u64>().ok()?;
            Some(w.saturating_mul(h))
        })
        .max()
        .unwrap_or(DEFAULT_ICON_AREA)
}

/// Picks the largest candidate, resolved against `base`.
///
/// Ties keep the earliest candidate. Candidates whose href does not resolve to
/// an http(s) URL are ignored.
#[must_use]
pub fn pick_largest(candidates: &[IconCandidate], base: &Url) -> Option<String> {
    let mut best: Option<(u64, String)> = None;
    for candidate in candidates {
        let Some(resolved) = absolutize_url(&candidate.href, base) else {
            continue;
        };
        let area = candidate.area();
        if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
            best = Some((area, resolved));
        }
    }
    best.map(|(_, url)| url)
}

/// Icon-related `<link>` elements extracted from a document.
///
/// Plain owned data so it can be held across `.await` points, unlike the
/// parsed DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconLinks {
    /// First `rel` containing "icon" with a `type` containing "svg".
    pub svg: Option<String>,
    /// All `rel` containing "apple-touch-icon".
    pub apple_touch: Vec<IconCandidate>,
    /// All other `rel` containing "icon", SVG excluded.
    pub icons: Vec<IconCandidate>,
    /// First `rel` containing "manifest".
    pub manifest: Option<String>,
}

impl IconLinks {
    /// Scans the document's `<link>` elements.
    #[must_use]
    pub fn scan(document: &Html) -> Self {
        let mut links = Self::default();
        for element in document.select(&LINK_SELECTOR) {
            let value = element.value();
            let (Some(rel), Some(href)) = (value.attr("rel"), value.attr("href")) else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() {
                continue;
            }
            let rel = rel.to_ascii_lowercase();
            let is_svg = value
                .attr("type")
                .is_some_and(|t| t.to_ascii_lowercase().contains("svg"));
            let candidate = IconCandidate::new(href, value.attr("sizes"));

            if rel.contains("apple-touch-icon") {
                links.apple_touch.push(candidate);
            } else if rel.contains("icon") {
                if is_svg {
                    if links.svg.is_none() {
                        links.svg = Some(candidate.href);
                    }
                } else {
                    links.icons.push(candidate);
                }
            } else if rel.contains("manifest") && links.manifest.is_none() {
                links.manifest = Some(candidate.href);
            }
        }
        links
    }

    /// Best icon declared directly in the document (steps before the manifest).
    #[must_use]
    pub fn best_declared(&self, base: &Url) -> Option<String> {
        self.svg
            .as_deref()
            .and_then(|href| absolutize_url(href, base))
            .or_else(|| pick_largest(&self.apple_touch, base))
            .or_else(|| pick_largest(&self.icons, base))
    }

    /// Absolute manifest URL, when one is linked.
    #[must_use]
    pub fn manifest_url(&self, base: &Url) -> Option<Url> {
        let href = self.manifest.as_deref()?;
        absolutize_url(href, base).and_then(|u| Url::parse(&u).ok())
    }
}

#[derive(Debug, Deserialize)]
struct WebManifest {
    #[serde(default)]
    icons: Vec<ManifestIcon>,
}

#[derive(Debug, Deserialize)]
struct ManifestIcon {
    src: Option<String>,
    sizes: Option<String>,
}

impl WebManifest {
    fn candidates(&self) -> Vec<IconCandidate> {
        self.icons
            .iter()
            .filter_map(|icon| {
                let src = icon.src.as_deref()?.trim();
                (!src.is_empty()).then(|| IconCandidate::new(src, icon.sizes.as_deref()))
            })
            .collect()
    }
}

/// Resolves the best icon for a fetched document.
///
/// `base` is the document's effective URL. Manifest failures fall through to
/// `/favicon.ico`; this returns `None` only when `base` has no host.
#[tracing::instrument(skip(links, fetcher), fields(base = %base))]
pub(crate) async fn resolve_icon(
    links: &IconLinks,
    base: &Url,
    fetcher: &HttpFetcher,
    manifest_timeout: Duration,
) -> Option<String> {
    if let Some(icon) = links.best_declared(base) {
        return Some(icon);
    }

    if let Some(manifest_url) = links.manifest_url(base) {
        match fetcher
            .fetch_json::<WebManifest>(manifest_url.as_str(), manifest_timeout)
            .await
        {
            Ok(manifest) => {
                if let Some(icon) = pick_largest(&manifest.candidates(), &manifest_url) {
                    return Some(icon);
                }
                debug!(manifest = %manifest_url, "manifest lists no usable icons");
            }
            Err(error) => debug!(manifest = %manifest_url, %error, "manifest fetch failed"),
        }
    }

    default_favicon(base)
}
