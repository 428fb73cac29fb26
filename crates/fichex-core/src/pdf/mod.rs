//! PDF access: page text and page images for the OCR fallback.

mod document;

pub use document::PdfDocument;

use image::DynamicImage;

use crate::error::SourceError;

/// Source of per-page content for one input document.
///
/// The text provider drives this trait; production code uses
/// [`PdfDocument`], tests substitute stubs.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Extract the text of one page (1-indexed). An empty string is a
    /// valid result for pages without embedded text.
    fn page_text(&self, page: u32) -> Result<String, SourceError>;

    /// Produce an image of one page for OCR, typically the scanned
    /// full-page image embedded in the PDF.
    fn page_image(&self, page: u32) -> Result<DynamicImage, SourceError>;
}
