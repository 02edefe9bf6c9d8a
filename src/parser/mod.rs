//! Pure input transforms: URL normalization, DOI extraction and slug titles.
//!
//! Nothing in this module performs I/O; every function is a deterministic
//! function of its input.
//!
//! - [`NormalizedUrl`] - scheme defaulting, host parsing, publisher label
//! - [`extract_doi_from_url`] - DOI embedded in a publisher's `/doi/` path
//! - [`slug_to_title`] - headline-style title from the last path segment

mod doi;
mod slug;
mod url;

pub use doi::extract_doi_from_url;
pub use slug::{SlugStyle, slug_to_title};
pub use url::{NormalizedUrl, PUBLISHER_PLACEHOLDER, is_pdf_path};
