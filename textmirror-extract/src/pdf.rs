//! PDF text extraction behind the [`TextExtractor`] seam.

use std::path::Path;

use crate::error::ExtractError;

/// One-shot text extraction for a single source document.
///
/// Implementations read the source and return its text; writing the derived
/// artifact is the caller's job. The trait is object-safe so the daemon and
/// the reconciler can share one extractor instance, and so tests can swap in
/// a scripted implementation.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, source: &Path) -> Result<String, ExtractError>;
}

/// Extractor backed by the `pdf-extract` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, source: &Path) -> Result<String, ExtractError> {
        // Read the bytes ourselves so unreadable-source and invalid-document
        // failures stay distinguishable.
        let bytes = std::fs::read(source).map_err(|e| ExtractError::Unreadable {
            path: source.to_path_buf(),
            source: e,
        })?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::InvalidDocument {
            path: source.to_path_buf(),
            source: e,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use tempfile::TempDir;

    /// Build a small valid single-page PDF containing `text`.
    fn write_sample_pdf(path: &Path, text: &str) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).expect("save pdf");
    }

    #[test]
    fn extracts_text_from_valid_pdf() {
        let dir = TempDir::new().expect("tempdir");
        let pdf = dir.path().join("sample.pdf");
        write_sample_pdf(&pdf, "Hello mirror");

        let text = PdfTextExtractor.extract(&pdf).expect("extract");
        assert!(
            text.contains("Hello mirror"),
            "extracted text should contain the page text, got: {text:?}"
        );
    }

    #[test]
    fn missing_source_is_unreadable() {
        let err = PdfTextExtractor
            .extract(&PathBuf::from("/nonexistent/missing.pdf"))
            .expect_err("must fail");
        assert!(matches!(err, ExtractError::Unreadable { .. }));
    }

    #[test]
    fn garbage_bytes_are_invalid_document() {
        let dir = TempDir::new().expect("tempdir");
        let fake = dir.path().join("fake.pdf");
        std::fs::write(&fake, b"this is not a pdf at all").expect("write");

        let err = PdfTextExtractor.extract(&fake).expect_err("must fail");
        assert!(matches!(err, ExtractError::InvalidDocument { .. }));
    }
}
