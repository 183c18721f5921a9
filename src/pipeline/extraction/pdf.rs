use lopdf::Document;

use super::types::TextExtractor;
use super::ExtractionError;

/// PDF text extractor using lopdf.
/// Handles digital PDFs with embedded text layers; scanned pages come back
/// empty.
pub struct LopdfTextExtractor;

impl LopdfTextExtractor {
    /// Fallible per-page extraction. The whole document must parse; a page
    /// whose content stream fails is returned as an empty string.
    pub fn try_page_texts(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let texts = page_numbers
            .iter()
            .map(|&number| match doc.extract_text(&[number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(page = number, error = %e, "Page text extraction failed");
                    String::new()
                }
            })
            .collect();

        Ok(texts)
    }
}

impl TextExtractor for LopdfTextExtractor {
    fn page_texts(&self, pdf_bytes: &[u8]) -> Vec<String> {
        match self.try_page_texts(pdf_bytes) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(error = %e, size = pdf_bytes.len(), "PDF unreadable, no text extracted");
                Vec::new()
            }
        }
    }
}

/// Number of pages in a PDF, `None` when it cannot be parsed.
pub fn page_count(pdf_bytes: &[u8]) -> Option<usize> {
    Document::load_mem(pdf_bytes)
        .ok()
        .map(|doc| doc.get_pages().len())
}

// ── Mock for testing ──────────────────────────────────────

/// Text extractor returning fixed page texts regardless of input.
///
/// Used by segmentation and batch tests that care about page text, not
/// about PDF parsing.
pub struct MockTextExtractor {
    pages: Vec<String>,
}

impl MockTextExtractor {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl TextExtractor for MockTextExtractor {
    fn page_texts(&self, _pdf_bytes: &[u8]) -> Vec<String> {
        self.pages.clone()
    }
}

/// Build a PDF with one page per entry; each `\n`-separated line becomes
/// its own text object so extraction yields one line per row.
#[cfg(test)]
pub(crate) fn make_test_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Object, Stream};

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page_text in pages {
        let mut content = String::new();
        for (i, line) in page_text.lines().enumerate() {
            let escaped = line
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            let y = 740 - (i as i32) * 16;
            content.push_str(&format!("BT /F1 11 Tf 72 {y} Td ({escaped}) Tj ET\n"));
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
