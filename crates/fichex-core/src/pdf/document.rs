//! PDF document wrapper over lopdf and pdf-extract.

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object};
use tracing::{debug, trace};

use super::PageSource;
use crate::error::SourceError;

/// An opened PDF document.
///
/// Text comes from `pdf-extract` over the raw bytes; page images come
/// from the image XObjects in the lopdf object model (scanned pages
/// embed one full-page image each).
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Open a PDF from a file path.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path).map_err(|e| SourceError::Parse(e.to_string()))?;
        Self::from_bytes(data)
    }

    /// Open a PDF from in-memory bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, SourceError> {
        let mut doc = Document::load_mem(&data).map_err(|e| SourceError::Parse(e.to_string()))?;

        // PDFs encrypted with an empty password are common enough to
        // handle transparently.
        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(SourceError::Encrypted);
            }
            debug!("decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| SourceError::Parse(e.to_string()))?;
            decrypted
        } else {
            data
        };

        if doc.get_pages().is_empty() {
            return Err(SourceError::NoPages);
        }

        Ok(Self {
            document: doc,
            raw_data,
        })
    }

    /// Extract the text of the whole document.
    pub fn full_text(&self) -> Result<String, SourceError> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| SourceError::Parse(e.to_string()))
    }

    /// Decode the image XObjects referenced by one page.
    fn page_images(&self, page: u32) -> Vec<DynamicImage> {
        let pages = self.document.get_pages();
        let Some(page_id) = pages.get(&page) else {
            return Vec::new();
        };

        let mut images = Vec::new();
        let Ok(page_obj) = self.document.get_object(*page_id) else {
            return images;
        };
        let Object::Dictionary(page_dict) = page_obj else {
            return images;
        };

        let resources = page_dict
            .get(b"Resources")
            .ok()
            .and_then(|r| self.document.dereference(r).ok())
            .and_then(|(_, obj)| obj.as_dict().ok().cloned());

        if let Some(resources) = resources {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects)
                {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = self.document.dereference(obj_ref) {
                            if let Some(img) = decode_image_object(&self.document, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("page {}: {} embedded image(s)", page, images.len());
        images
    }

    /// Scan every object in the document for decodable images.
    fn all_images(&self) -> Vec<DynamicImage> {
        self.document
            .objects
            .values()
            .filter_map(|obj| decode_image_object(&self.document, obj))
            .collect()
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, SourceError> {
        // pdf-extract only produces whole-document text; split it into
        // equal line ranges per page. Coarse, but matches are searched
        // per page only for ordering, never for exact boundaries.
        let full_text = self.full_text()?;
        let lines: Vec<&str> = full_text.lines().collect();
        let page_count = self.page_count() as usize;
        if page_count == 0 || page == 0 {
            return Ok(String::new());
        }

        let lines_per_page = lines.len() / page_count;
        let start = (page as usize - 1) * lines_per_page;
        let end = if page as usize == page_count {
            lines.len()
        } else {
            page as usize * lines_per_page
        };

        Ok(lines[start.min(lines.len())..end.min(lines.len())].join("\n"))
    }

    fn page_image(&self, page: u32) -> Result<DynamicImage, SourceError> {
        // Largest image on the page is the scan itself, not a logo.
        let best = self
            .page_images(page)
            .into_iter()
            .max_by_key(|img| (img.width() as u64) * (img.height() as u64));
        if let Some(img) = best {
            return Ok(img);
        }

        // Some scanners reference images outside the per-page resource
        // dictionaries; fall back to the document-wide scan by index.
        let mut all = self.all_images();
        let idx = (page as usize).saturating_sub(1);
        if idx < all.len() {
            return Ok(all.swap_remove(idx));
        }

        Err(SourceError::Parse(format!(
            "no image found for page {page}"
        )))
    }
}

/// Try to decode one PDF object as an image.
fn decode_image_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    let subtype = dict.get(b"Subtype").ok()?;
    if subtype.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("image object {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };
        if let Some(name) = filter_name {
            if name == b"DCTDecode" {
                // Raw stream content is the JPEG itself.
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            if name == b"JPXDecode" || name == b"CCITTFaxDecode" || name == b"JBIG2Decode" {
                trace!("unsupported image filter");
                return None;
            }
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return None;
    }

    decode_raw_image(&data, width, height, color_space)
}

/// Decode uncompressed RGB or grayscale sample data.
fn decode_raw_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);
    let mut rgba = Vec::with_capacity(pixels * 4);

    if (color_space == b"DeviceRGB" || color_space == b"RGB") && data.len() >= pixels * 3 {
        for chunk in data[..pixels * 3].chunks_exact(3) {
            rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
        }
    } else if (color_space == b"DeviceGray" || color_space == b"G") && data.len() >= pixels {
        for &gray in &data[..pixels] {
            rgba.extend_from_slice(&[gray, gray, gray, 255]);
        }
    } else {
        return None;
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
