//! PDF text loading.

mod extractor;

pub use extractor::{PdfContent, PdfExtractor, PdfPage};

#[cfg(test)]
pub(crate) use extractor::tests::build_pdf as build_test_pdf;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF text sources.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Text of every page, in page order.
    fn page_texts(&self) -> Result<Vec<String>>;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;
}
