//! Text Source Provider: per-page text with OCR fallback.
//!
//! Direct extraction is always attempted first. A page falls back to
//! OCR when its quality signal (non-whitespace character count) is
//! below the threshold, or unconditionally under `force_ocr`. Per-page
//! OCR failures degrade to the direct-extraction text; they never fail
//! the document.

use tracing::{debug, warn};

use crate::error::SourceError;
use crate::ocr::OcrEngine;
use crate::pdf::PageSource;

/// Minimum non-whitespace characters for a page to count as readable
/// without OCR.
pub const DEFAULT_MIN_QUALITY: usize = 30;

/// Text extraction result for one page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// Page index, 1-based.
    pub index: u32,
    /// Extracted text; may be empty.
    pub text: String,
    /// Non-whitespace character count of the direct extraction.
    pub quality: usize,
    /// Whether the final text came from OCR.
    pub used_ocr: bool,
}

/// Options for [`read_pages`].
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Run OCR on every page regardless of quality.
    pub force_ocr: bool,
    /// Quality threshold below which a page falls back to OCR.
    pub min_quality: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            force_ocr: false,
            min_quality: DEFAULT_MIN_QUALITY,
        }
    }
}

/// Quality signal: count of non-whitespace characters.
pub fn quality_signal(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Read the ordered page texts of one document.
///
/// Fails only when the document itself is unreadable; individual page
/// extraction and OCR failures yield empty text for that page.
pub fn read_pages(
    source: &dyn PageSource,
    ocr: Option<&dyn OcrEngine>,
    options: &ReadOptions,
) -> Result<Vec<PageText>, SourceError> {
    let page_count = source.page_count();
    if page_count == 0 {
        return Err(SourceError::NoPages);
    }

    let mut pages = Vec::with_capacity(page_count as usize);
    for index in 1..=page_count {
        pages.push(read_page(source, ocr, options, index));
    }
    Ok(pages)
}

fn read_page(
    source: &dyn PageSource,
    ocr: Option<&dyn OcrEngine>,
    options: &ReadOptions,
    index: u32,
) -> PageText {
    let direct = match source.page_text(index) {
        Ok(text) => text,
        Err(e) => {
            warn!("page {}: direct text extraction failed: {}", index, e);
            String::new()
        }
    };
    let quality = quality_signal(&direct);

    let wants_ocr = options.force_ocr || quality < options.min_quality;
    if !wants_ocr {
        debug!("page {}: direct text accepted (quality {})", index, quality);
        return PageText {
            index,
            text: direct,
            quality,
            used_ocr: false,
        };
    }

    let Some(engine) = ocr else {
        if options.force_ocr {
            warn!("page {}: OCR forced but no engine configured", index);
        } else {
            warn!(
                "page {}: quality {} below threshold {} and no OCR engine configured",
                index, quality, options.min_quality
            );
        }
        return PageText {
            index,
            text: direct,
            quality,
            used_ocr: false,
        };
    };

    debug!(
        "page {}: running OCR (quality {}, force_ocr {})",
        index, quality, options.force_ocr
    );

    match source.page_image(index).map_err(|e| e.to_string()) {
        Ok(image) => match engine.recognize(&image) {
            Ok(text) => PageText {
                index,
                text,
                quality,
                used_ocr: true,
            },
            Err(e) => {
                warn!("page {}: OCR failed: {}; using direct text", index, e);
                PageText {
                    index,
                    text: direct,
                    quality,
                    used_ocr: false,
                }
            }
        },
        Err(e) => {
            warn!("page {}: could not render page image: {}", index, e);
            PageText {
                index,
                text: direct,
                quality,
                used_ocr: false,
            }
        }
    }
}
