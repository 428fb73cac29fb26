//! Batch Orchestrator: drive the pipeline over many documents.
//!
//! Each document runs `text -> fields -> write` independently; a
//! failure at any stage is recorded in the report and the batch moves
//! on. Configuration and template errors are surfaced before this
//! module runs, so nothing here aborts the batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::extract;
use crate::mapping::MappingSet;
use crate::ocr::OcrEngine;
use crate::pdf::PdfDocument;
use crate::sheet::TemplateWriter;
use crate::text::{self, ReadOptions};

/// Pipeline stage a document failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Opening the document or sourcing page text.
    TextExtracted,
    /// Applying the mapping rules.
    FieldsExtracted,
    /// Writing the output workbook.
    Written,
}

/// Terminal outcome for one document.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The output workbook was written.
    Done {
        /// Extracted field count.
        fields: usize,
        /// Pages that fell back to OCR.
        ocr_pages: usize,
        /// Path of the output workbook.
        output: PathBuf,
    },
    /// The document was abandoned at `stage`.
    Failed { stage: Stage, reason: String },
}

/// Report entry for one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    /// Input document path.
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Extraction warnings (missing fields, demoted values).
    pub warnings: Vec<String>,
}

impl DocumentReport {
    pub fn is_done(&self) -> bool {
        matches!(self.outcome, Outcome::Done { .. })
    }
}

/// Aggregated outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn done_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_done()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.documents.len() - self.done_count()
    }
}

/// Batch runner holding the per-run shared state.
///
/// The mapping and writer are read-only across documents; each
/// document owns its own page texts, extraction result, and output
/// workbook.
pub struct BatchRunner<'a> {
    mapping: &'a MappingSet,
    writer: &'a TemplateWriter,
    ocr: Option<&'a dyn OcrEngine>,
    options: ReadOptions,
    used_outputs: HashSet<PathBuf>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(mapping: &'a MappingSet, writer: &'a TemplateWriter) -> Self {
        Self {
            mapping,
            writer,
            ocr: None,
            options: ReadOptions::default(),
            used_outputs: HashSet::new(),
        }
    }

    /// Supply an OCR engine for the fallback path.
    pub fn with_ocr(mut self, ocr: &'a dyn OcrEngine) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Override the text sourcing options.
    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Process every document, writing outputs under `output_dir`.
    ///
    /// Output names derive from each input's file stem; inputs that
    /// share a stem get a numeric suffix, so no two documents of one
    /// run ever collide on an output path.
    pub fn run(&mut self, documents: &[PathBuf], output_dir: &Path) -> BatchReport {
        let mut report = BatchReport::default();
        for path in documents {
            report.documents.push(self.run_one(path, output_dir));
        }

        info!(
            "batch complete: {} done, {} failed of {} document(s)",
            report.done_count(),
            report.failed_count(),
            report.documents.len()
        );
        report
    }

    /// Run the full pipeline for one document.
    pub fn run_one(&mut self, path: &Path, output_dir: &Path) -> DocumentReport {
        let mut warnings = Vec::new();
        let outcome = self.pipeline(path, output_dir, &mut warnings);
        match &outcome {
            Outcome::Done { fields, ocr_pages, .. } => {
                info!(
                    "{}: done, {} field(s) extracted, {} page(s) via OCR",
                    path.display(),
                    fields,
                    ocr_pages
                );
            }
            Outcome::Failed { stage, reason } => {
                warn!("{}: failed at {:?}: {}", path.display(), stage, reason);
            }
        }
        DocumentReport {
            path: path.to_path_buf(),
            outcome,
            warnings,
        }
    }

    fn pipeline(&mut self, path: &Path, output_dir: &Path, warnings: &mut Vec<String>) -> Outcome {
        // Text
        let pages = match PdfDocument::open(path)
            .and_then(|doc| text::read_pages(&doc, self.ocr, &self.options))
        {
            Ok(pages) => pages,
            Err(e) => {
                return Outcome::Failed {
                    stage: Stage::TextExtracted,
                    reason: e.to_string(),
                };
            }
        };

        // Fields
        let result = extract::extract_fields(self.mapping, &pages);
        warnings.extend(result.warnings.iter().cloned());
        if !result.missing_required.is_empty() {
            return Outcome::Failed {
                stage: Stage::FieldsExtracted,
                reason: format!(
                    "required field(s) absent: {}",
                    result.missing_required.join(", ")
                ),
            };
        }

        // Write
        let output = self.allocate_output(path, output_dir);
        match self.writer.write(&result, self.mapping, &output) {
            Ok(()) => Outcome::Done {
                fields: result.values.len(),
                ocr_pages: result.ocr_pages.len(),
                output,
            },
            Err(e) => Outcome::Failed {
                stage: Stage::Written,
                reason: e.to_string(),
            },
        }
    }

    /// Reserve an output path for one input document.
    ///
    /// Inputs from different directories may share a file stem; later
    /// ones get `_2`, `_3`, ... so an earlier output is never
    /// overwritten within the run.
    fn allocate_output(&mut self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let mut output = output_path(input, output_dir);
        let mut n = 2;
        while self.used_outputs.contains(&output) {
            output = output_dir.join(format!("{stem}_{n}.xlsx"));
            n += 1;
        }
        self.used_outputs.insert(output.clone());
        output
    }
}

/// Output workbook path for one input document.
fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    output_dir.join(format!("{stem}.xlsx"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_derives_from_input_stem() {
        let out = output_path(Path::new("in/ficha_042.pdf"), Path::new("saida"));
        assert_eq!(out, PathBuf::from("saida/ficha_042.xlsx"));
    }

    #[test]
    fn output_paths_are_distinct_per_input() {
        let a = output_path(Path::new("a.pdf"), Path::new("out"));
        let b = output_path(Path::new("b.pdf"), Path::new("out"));
        assert_ne!(a, b);
    }
}
