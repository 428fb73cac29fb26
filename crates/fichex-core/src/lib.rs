//! Core library for PDF form ingestion.
//!
//! This crate provides:
//! - Mapping configuration (field -> pattern -> template cell)
//! - Text sourcing from PDFs with per-page OCR fallback
//! - Pattern-based field extraction with post-processing
//! - Spreadsheet template filling that preserves formatting
//! - Batch orchestration with per-document failure isolation

pub mod batch;
pub mod error;
pub mod extract;
pub mod mapping;
pub mod ocr;
pub mod pdf;
pub mod sheet;
pub mod text;

pub use batch::{BatchReport, BatchRunner, DocumentReport, Outcome, Stage};
pub use error::{ConfigError, FichexError, OcrError, Result, SourceError, TemplateError};
pub use extract::{extract_fields, ExtractionResult, FieldValue};
pub use mapping::{validate, CellRef, MappingRule, MappingSet, PostProcess, Scope};
pub use ocr::{OcrEngine, PureOcrEngine};
pub use pdf::{PageSource, PdfDocument};
pub use sheet::TemplateWriter;
pub use text::{quality_signal, read_pages, PageText, ReadOptions, DEFAULT_MIN_QUALITY};
