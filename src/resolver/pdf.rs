//! Document-info title extraction for PDF responses.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use lopdf::{Document, Object};
use tracing::debug;

use super::utils::collapse_whitespace;
use super::{ResolveError, StrategyOutcome};

/// Reads the `/Title` entry of the document-info dictionary.
///
/// `source` is only used for error context. Parse failures and a missing or
/// blank title come back as [`StrategyOutcome::NoResult`].
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn extract_pdf_title(bytes: &[u8], source: &str) -> StrategyOutcome<String> {
    let document = match Document::load_mem(bytes) {
        Ok(document) => document,
        Err(error) => {
            debug!(%error, "PDF parse failed");
            return StrategyOutcome::NoResult(ResolveError::malformed("pdf", source, error));
        }
    };

    match info_title(&document) {
        Some(title) => StrategyOutcome::Found(title),
        None => StrategyOutcome::NoResult(ResolveError::missing("title", source)),
    }
}

fn info_title(document: &Document) -> Option<String> {
    let info = resolve(document, document.trailer.get(b"Info").ok()?)?;
    let title = resolve(document, info.as_dict().ok()?.get(b"Title").ok()?)?;
    let Object::String(raw, _) = title else {
        return None;
    };
    let title = collapse_whitespace(&decode_text_string(raw));
    (!title.is_empty()).then_some(title)
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Decodes a PDF text string: UTF-16 or UTF-8 with a byte-order mark, else
/// UTF-8, else single-byte (PDFDocEncoding approximated as windows-1252).
fn decode_text_string(raw: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(raw) {
        return encoding
            .decode_without_bom_handling(&raw[bom_len..])
            .0
            .into_owned();
    }
    UTF_8
        .decode_without_bom_handling_and_without_replacement(raw)
        .map_or_else(
            || WINDOWS_1252.decode_without_bom_handling(raw).0.into_owned(),
            Cow::into_owned,
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{Dictionary, StringFormat, dictionary};

    /// Builds a one-page PDF, optionally with a document-info title.
    pub(crate) fn pdf_with_title(title: Option<Object>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), 612_i64.into(), 792_i64.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1_i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = title {
            let mut info = Dictionary::new();
            info.set("Title", title);
            info.set("Producer", Object::string_literal("test"));
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extract_pdf_title_literal_string() {
        let bytes = pdf_with_title(Some(Object::string_literal("  Attention   Is All You Need ")));
        let outcome = extract_pdf_title(&bytes, "https://example.com/paper.pdf");
        assert_eq!(outcome.found().unwrap(), "Attention Is All You Need");
    }

    #[test]
    fn test_extract_pdf_title_utf16_with_bom() {
        let mut raw = vec![0xFE, 0xFF];
        for unit in "Über Graphen".encode_utf16() {
            raw.extend_from_slice(&unit.to_be_bytes());
        }
        let bytes = pdf_with_title(Some(Object::String(raw, StringFormat::Hexadecimal)));
        let outcome = extract_pdf_title(&bytes, "paper.pdf");
        assert_eq!(outcome.found().unwrap(), "Über Graphen");
    }

    #[test]
    fn test_extract_pdf_title_missing_or_blank() {
        let bytes = pdf_with_title(None);
        assert!(matches!(
            extract_pdf_title(&bytes, "a.pdf"),
            StrategyOutcome::NoResult(ResolveError::MissingField { field: "title", .. })
        ));

        let bytes = pdf_with_title(Some(Object::string_literal("   ")));
        assert!(!extract_pdf_title(&bytes, "a.pdf").is_found());
    }

    #[test]
    fn test_extract_pdf_title_garbage_is_malformed() {
        let outcome = extract_pdf_title(b"<html>not a pdf</html>", "a.pdf");
        assert!(matches!(
            outcome,
            StrategyOutcome::NoResult(ResolveError::Malformed { format: "pdf", .. })
        ));
    }

    #[test]
    fn test_decode_text_string_single_byte_fallback() {
        assert_eq!(decode_text_string(b"caf\xe9"), "café");
        assert_eq!(decode_text_string("naïve".as_bytes()), "naïve");
        assert_eq!(decode_text_string(b"\x93quoted\x94"), "\u{201c}quoted\u{201d}");
    }

    #[test]
    fn test_decode_text_string_little_endian_bom() {
        let mut raw = vec![0xFF, 0xFE];
        for unit in "Größe".encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text_string(&raw), "Größe");
    }
}
