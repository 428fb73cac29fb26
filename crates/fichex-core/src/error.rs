//! Error types for the fichex-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the fichex library.
#[derive(Error, Debug)]
pub enum FichexError {
    /// Mapping configuration error. Fatal to the whole run.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Template error. Fatal to the whole run.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// A single document could not be read. Local to that document.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// OCR error. Local to one page when raised during fallback.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in the mapping configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The mapping file could not be read.
    #[error("failed to read mapping file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The mapping file is not valid YAML.
    #[error("failed to parse mapping file: {0}")]
    Parse(String),

    /// The top level of the mapping file is not a key/value mapping.
    #[error("mapping file must be a mapping of field names to rules")]
    NotAMapping,

    /// The mapping file defines no rules at all.
    #[error("mapping file defines no fields")]
    Empty,

    /// A rule entry is missing a required sub-key or has a bad shape.
    #[error("invalid rule for field '{field}': {reason}")]
    InvalidRule { field: String, reason: String },

    /// A rule's pattern is not a valid regular expression.
    #[error("invalid pattern for field '{field}': {reason}")]
    InvalidPattern { field: String, reason: String },

    /// A rule's pattern has no capture group, or names one out of range.
    #[error("pattern for field '{field}' has no usable capture group {group}")]
    NoCaptureGroup { field: String, group: usize },

    /// A rule's target cell address could not be parsed.
    #[error("invalid cell address '{cell}' for field '{field}'")]
    InvalidCell { field: String, cell: String },

    /// Two rules target the same cell.
    #[error("fields '{first}' and '{second}' both target cell {cell}")]
    DuplicateCell {
        cell: String,
        first: String,
        second: String,
    },
}

/// Errors opening or writing the spreadsheet template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template file does not exist.
    #[error("template not found: {0}")]
    NotFound(PathBuf),

    /// The template could not be parsed as a spreadsheet.
    #[error("failed to read template: {0}")]
    Read(String),

    /// The requested sheet does not exist in the template.
    #[error("sheet '{0}' not found in template")]
    MissingSheet(String),

    /// The output file could not be written.
    #[error("failed to save output: {0}")]
    Save(String),
}

/// Errors opening or parsing a single input document.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The input file does not exist.
    #[error("document not found: {0}")]
    NotFound(PathBuf),

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors from the OCR engine. Callers downgrade these to empty page
/// text during fallback; they only surface when the engine cannot be
/// constructed at all.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// No page image was available to recognize.
    #[error("no page image available: {0}")]
    NoImage(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Result type for the fichex library.
pub type Result<T> = std::result::Result<T, FichexError>;
