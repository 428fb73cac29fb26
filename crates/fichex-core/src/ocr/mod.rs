//! Optical character recognition behind a narrow trait.
//!
//! The pipeline only needs "image in, text out"; the trait keeps the
//! text provider testable without model files on disk.

mod engine;

pub use engine::PureOcrEngine;

use image::DynamicImage;

use crate::error::OcrError;

/// Text recognition over a page image.
pub trait OcrEngine {
    /// Recognize the text content of an image, in reading order.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}
