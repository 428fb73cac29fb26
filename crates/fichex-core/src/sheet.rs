//! Template Writer: fill mapped cells of a spreadsheet template.
//!
//! The template is read round-trip with umya-spreadsheet, so styles,
//! merges, formulas, and sheet structure survive untouched. Only the
//! cells named by the mapping are written, and only for fields that
//! actually extracted a value. Output goes to a new file; the template
//! on disk is never modified.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use umya_spreadsheet::Spreadsheet;

use crate::error::TemplateError;
use crate::extract::ExtractionResult;
use crate::mapping::{MappingSet, PostProcess};

/// Writes extraction results into copies of one template workbook.
#[derive(Debug)]
pub struct TemplateWriter {
    template: PathBuf,
    sheet: Option<String>,
}

impl TemplateWriter {
    /// Create a writer for a template file. Fails if the template does
    /// not exist or is not a readable workbook.
    pub fn new(template: &Path) -> Result<Self, TemplateError> {
        let writer = Self {
            template: template.to_path_buf(),
            sheet: None,
        };
        // Open once up front so a broken template fails the run before
        // any document is processed.
        writer.open_template()?;
        Ok(writer)
    }

    /// Target a sheet by name instead of the template's first sheet.
    /// Fails with [`TemplateError::MissingSheet`] if the template has
    /// no sheet of that name, so a bad name halts before any document.
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Result<Self, TemplateError> {
        self.sheet = Some(sheet.into());
        self.open_template()?;
        Ok(self)
    }

    fn open_template(&self) -> Result<Spreadsheet, TemplateError> {
        if !self.template.exists() {
            return Err(TemplateError::NotFound(self.template.clone()));
        }
        let book = umya_spreadsheet::reader::xlsx::read(&self.template)
            .map_err(|e| TemplateError::Read(e.to_string()))?;
        if let Some(name) = &self.sheet {
            if book.get_sheet_by_name(name).is_none() {
                return Err(TemplateError::MissingSheet(name.clone()));
            }
        } else if book.get_sheet(&0).is_none() {
            return Err(TemplateError::Read("workbook has no sheets".to_string()));
        }
        Ok(book)
    }

    /// Name of the sheet this writer targets.
    pub fn sheet_name(&self) -> Result<String, TemplateError> {
        let book = self.open_template()?;
        if let Some(name) = &self.sheet {
            return Ok(name.clone());
        }
        Ok(book
            .get_sheet(&0)
            .map(|ws| ws.get_name().to_string())
            .unwrap_or_default())
    }

    /// Fill the mapped cells and save as a new workbook at `output`.
    ///
    /// Absent fields leave the template's cell content untouched. The
    /// file appears atomically: written to a temp file next to the
    /// target, then persisted.
    pub fn write(
        &self,
        result: &ExtractionResult,
        mapping: &MappingSet,
        output: &Path,
    ) -> Result<(), TemplateError> {
        let mut book = self.open_template()?;

        let sheet = match &self.sheet {
            Some(name) => book
                .get_sheet_by_name_mut(name)
                .ok_or_else(|| TemplateError::MissingSheet(name.clone()))?,
            None => book
                .get_sheet_mut(&0)
                .ok_or_else(|| TemplateError::Read("workbook has no sheets".to_string()))?,
        };

        let mut written = 0usize;
        for rule in mapping.rules() {
            let Some(value) = result.value(&rule.field) else {
                continue;
            };

            let cell = sheet.get_cell_mut(rule.cell.coordinate());
            if rule.post == Some(PostProcess::Number) {
                match value.parse::<f64>() {
                    Ok(num) => {
                        cell.set_value_number(num);
                    }
                    Err(_) => {
                        cell.set_value(value);
                    }
                }
            } else {
                cell.set_value(value);
            }
            debug!("wrote field '{}' to cell {}", rule.field, rule.cell);
            written += 1;
        }

        save_atomically(&book, output)?;
        info!(
            "wrote {} of {} mapped cells to {}",
            written,
            mapping.len(),
            output.display()
        );
        Ok(())
    }
}

/// Serialize the workbook to a temp file in the target directory, then
/// rename into place, so a partially written output is never visible.
fn save_atomically(book: &Spreadsheet, output: &Path) -> Result<(), TemplateError> {
    let dir = output.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).map_err(|e| TemplateError::Save(e.to_string()))?;
    }

    let mut buffer = Vec::new();
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut std::io::Cursor::new(&mut buffer))
        .map_err(|e| TemplateError::Save(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
        .map_err(|e| TemplateError::Save(e.to_string()))?;
    tmp.write_all(&buffer)
        .map_err(|e| TemplateError::Save(e.to_string()))?;
    tmp.persist(output)
        .map_err(|e| TemplateError::Save(e.to_string()))?;
    Ok(())
}
