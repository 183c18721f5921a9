use lopdf::Document;

use super::markers::detect_segments;
use super::types::{PageRange, Segment};
use crate::pipeline::extraction::{ExtractionError, TextExtractor};

/// Cut each range out of `pdf_bytes` as its own PDF.
///
/// Each output is the source with every page outside the range deleted and
/// unreachable objects pruned.
pub fn split_pdf(pdf_bytes: &[u8], ranges: &[PageRange]) -> Result<Vec<Vec<u8>>, ExtractionError> {
    let source = Document::load_mem(pdf_bytes)
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
    let page_numbers: Vec<u32> = source.get_pages().keys().copied().collect();
    let page_count = page_numbers.len();

    let mut parts = Vec::with_capacity(ranges.len());
    for range in ranges {
        if range.end >= page_count {
            return Err(ExtractionError::PageOutOfRange {
                page: range.end,
                page_count,
            });
        }

        let outside: Vec<u32> = page_numbers
            .iter()
            .enumerate()
            .filter(|(index, _)| !range.contains(*index))
            .map(|(_, &number)| number)
            .collect();

        let mut part = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
        part.delete_pages(&outside);
        part.prune_objects();

        let mut buf = Vec::new();
        part.save_to(&mut buf)
            .map_err(|e| ExtractionError::PdfWrite(format!("segment {range}: {e}")))?;
        parts.push(buf);
    }

    Ok(parts)
}

/// Segment one uploaded document into repair-order candidates.
///
/// Page text is extracted sequentially, boundaries are detected, and each
/// range is materialized as a standalone PDF. A single range covering the
/// whole document reuses the input bytes untouched, as does a document
/// whose pages cannot be read at all (one segment, empty text).
pub fn segment_document(
    pdf_bytes: &[u8],
    extractor: &dyn TextExtractor,
) -> Result<Vec<Segment>, ExtractionError> {
    let page_texts = extractor.page_texts(pdf_bytes);

    if page_texts.is_empty() {
        tracing::warn!("No readable pages, keeping document as a single segment");
        return Ok(vec![Segment {
            range: PageRange::new(0, 0),
            text: String::new(),
            pdf_bytes: pdf_bytes.to_vec(),
        }]);
    }

    let ranges = detect_segments(&page_texts);
    let texts: Vec<String> = ranges
        .iter()
        .map(|range| page_texts[range.start..=range.end].join("\n"))
        .collect();

    let bodies = if ranges.len() == 1 {
        vec![pdf_bytes.to_vec()]
    } else {
        split_pdf(pdf_bytes, &ranges)?
    };

    tracing::info!(
        pages = page_texts.len(),
        segments = ranges.len(),
        "Segmented document"
    );

    Ok(ranges
        .into_iter()
        .zip(texts)
        .zip(bodies)
        .map(|((range, text), pdf_bytes)| Segment {
            range,
            text,
            pdf_bytes,
        })
        .collect())
}
