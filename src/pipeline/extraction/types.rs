/// Plain-text source for PDF pages (allows mocking for tests).
pub trait TextExtractor: Send + Sync {
    /// One string per page, in page order. Pages that fail to extract are
    /// empty strings; a document that cannot be parsed has no pages.
    fn page_texts(&self, pdf_bytes: &[u8]) -> Vec<String>;

    /// Whole-document text, pages separated by newlines.
    fn extract_text(&self, pdf_bytes: &[u8]) -> String {
        self.page_texts(pdf_bytes).join("\n")
    }
}
