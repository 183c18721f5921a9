//! Text extraction from PDF bytes.
//!
//! Extraction never fails from the caller's point of view: an unreadable
//! page yields an empty string, an unreadable document yields no pages.
//! Empty text flows downstream as "no fields found".

pub mod types;
pub mod pdf;

pub use types::*;
pub use pdf::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("PDF write failed: {0}")]
    PdfWrite(String),
}
