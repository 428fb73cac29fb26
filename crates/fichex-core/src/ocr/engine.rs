//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use super::OcrEngine;
use crate::error::OcrError;

/// Model file names expected in the model directory.
const DET_MODEL: &str = "det.onnx";
const REC_MODEL: &str = "latin_rec.onnx";
const DICTIONARY: &str = "latin_dict.txt";

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX
/// runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

impl PureOcrEngine {
    /// Create an engine from model files in a directory.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        let det_path = model_dir.join(DET_MODEL);
        let rec_path = model_dir.join(REC_MODEL);
        let dict_path = model_dir.join(DICTIONARY);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {e}")))?;

        info!("loaded OCR models from {}", model_dir.display());
        Ok(Self { engine })
    }
}

impl OcrEngine for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {e}")))?;

        // Sort into reading order: coarse rows top to bottom, then
        // left to right within a row.
        let mut regions: Vec<(f64, f64, String)> = results
            .iter()
            .map(|r| {
                let (x, y) = region_origin(&r.bounding_box);
                (x, y, r.text.replace("[UNK]", " "))
            })
            .collect();
        regions.sort_by(|a, b| {
            let row_a = (a.1 / 20.0) as i64;
            let row_b = (b.1 / 20.0) as i64;
            row_a
                .cmp(&row_b)
                .then(a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        });

        let text = regions
            .iter()
            .map(|(_, _, t)| t.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            "OCR recognized {} text regions in {}ms",
            regions.len(),
            start.elapsed().as_millis()
        );

        Ok(text)
    }
}

/// Top-left corner of a detected text polygon.
fn region_origin(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    for coord in polygon.exterior().coords() {
        min_x = min_x.min(coord.x);
        min_y = min_y.min(coord.y);
    }
    (min_x, min_y)
}
