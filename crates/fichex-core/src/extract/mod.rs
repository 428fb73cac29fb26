//! Field extraction: apply mapping rules to page text.

pub mod normalize;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::mapping::{MappingRule, MappingSet, PostProcess, Scope};
use crate::text::PageText;

/// One extracted field value.
#[derive(Debug, Clone, Serialize)]
pub struct FieldValue {
    /// Post-processed value.
    pub value: String,
    /// Page the match came from; `None` for document-scope matches,
    /// which may span page boundaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Extraction outcome for one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionResult {
    /// Field name -> value, for fields that matched. Absent fields are
    /// simply not present.
    pub values: BTreeMap<String, FieldValue>,
    /// Pages whose text came from OCR.
    pub ocr_pages: Vec<u32>,
    /// Per-field warnings (no match, post-processing failure).
    pub warnings: Vec<String>,
    /// Required fields that ended up absent.
    pub missing_required: Vec<String>,
}

impl ExtractionResult {
    /// Value of one field, if extracted.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(|v| v.value.as_str())
    }

    /// Whether any page used OCR.
    pub fn used_ocr(&self) -> bool {
        !self.ocr_pages.is_empty()
    }
}

/// Apply every rule of the mapping against the page texts.
///
/// First match wins: page order, then in-page match order. A rule that
/// never matches leaves its field absent, which is not an error.
pub fn extract_fields(mapping: &MappingSet, pages: &[PageText]) -> ExtractionResult {
    let mut result = ExtractionResult {
        ocr_pages: pages.iter().filter(|p| p.used_ocr).map(|p| p.index).collect(),
        ..ExtractionResult::default()
    };

    // Built lazily; most mappings are all-document or all-page scope.
    let mut concatenated: Option<String> = None;

    for rule in mapping.rules() {
        let captured = match rule.scope {
            Scope::Page => capture_per_page(rule, pages),
            Scope::Document => {
                let text = concatenated.get_or_insert_with(|| concatenate(pages));
                capture(rule, text).map(|v| (v, None))
            }
        };

        let Some((raw, page)) = captured else {
            result
                .warnings
                .push(format!("field '{}': no match", rule.field));
            debug!("field '{}': no match", rule.field);
            if rule.required {
                result.missing_required.push(rule.field.clone());
            }
            continue;
        };

        match post_process(rule, &raw) {
            Some(value) => {
                debug!("field '{}' = {:?} (page {:?})", rule.field, value, page);
                result.values.insert(rule.field.clone(), FieldValue { value, page });
            }
            None => {
                warn!(
                    "field '{}': post-processing {:?} failed for {:?}; value dropped",
                    rule.field, rule.post, raw
                );
                result.warnings.push(format!(
                    "field '{}': post-processing failed for '{raw}'",
                    rule.field
                ));
                if rule.required {
                    result.missing_required.push(rule.field.clone());
                }
            }
        }
    }

    result
}

/// Join page texts with blank lines, as the document-scope search text.
fn concatenate(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First match in page order, then in-page order.
fn capture_per_page(rule: &MappingRule, pages: &[PageText]) -> Option<(String, Option<u32>)> {
    pages
        .iter()
        .find_map(|page| capture(rule, &page.text).map(|v| (v, Some(page.index))))
}

/// Run the rule's pattern once and pick its capture group.
fn capture(rule: &MappingRule, text: &str) -> Option<String> {
    rule.pattern
        .captures(text)
        .and_then(|caps| caps.get(rule.group))
        .map(|m| m.as_str().to_string())
}

/// Cleanup plus the rule's post-processing directive.
///
/// `None` means the directive failed and the value is demoted to
/// absent.
fn post_process(rule: &MappingRule, raw: &str) -> Option<String> {
    let cleaned = normalize::fix_homoglyphs(&normalize::normalize_ws(raw));

    match rule.post {
        None | Some(PostProcess::Trim) => Some(cleaned),
        Some(PostProcess::Digits) => {
            let digits = normalize::clean_digits(&cleaned);
            if digits.is_empty() { None } else { Some(digits) }
        }
        Some(PostProcess::Date) => normalize::parse_date(&cleaned),
        Some(PostProcess::Number) => normalize::parse_number(&cleaned).map(|d| d.to_string()),
    }
}
