//! Mapping configuration: field name -> extraction rule -> target cell.
//!
//! The mapping file is YAML where each top-level key names an output
//! field and its value supplies the extraction pattern and the target
//! cell in the template, e.g.:
//!
//! ```yaml
//! nome:
//!   pattern: "Nome completo: (.*)"
//!   column: B2
//! cpf:
//!   pattern: "CPF: ([0-9.\\-]+)"
//!   column: C2
//!   post: digits
//!   required: true
//! ```
//!
//! The loaded [`MappingSet`] is immutable and shared read-only for the
//! duration of a batch.

mod cell;

pub use cell::CellRef;

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Post-processing directive applied to a captured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostProcess {
    /// Trim surrounding whitespace (always applied; listed for explicitness).
    Trim,
    /// Strip everything but ASCII digits.
    Digits,
    /// Parse as a day-first date and re-render as `DD/MM/YYYY`.
    Date,
    /// Parse as a decimal number (`,` or `.` decimal separator).
    Number,
}

/// Which text a rule's pattern runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The concatenated text of all pages; matches may span page breaks.
    #[default]
    Document,
    /// Each page separately, first match in page order wins.
    Page,
}

/// One field's declarative pattern-to-cell binding.
#[derive(Debug, Clone)]
pub struct MappingRule {
    /// Output field name, unique within the set.
    pub field: String,
    /// Compiled extraction pattern with at least one capture group.
    pub pattern: Regex,
    /// Target cell in the template.
    pub cell: CellRef,
    /// Which capture group holds the value (1-based, default 1).
    pub group: usize,
    /// Optional post-processing directive.
    pub post: Option<PostProcess>,
    /// Text scope the pattern runs against.
    pub scope: Scope,
    /// Whether an absent value fails the document.
    pub required: bool,
}

/// Serde shape of one rule entry in the mapping file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    pattern: String,
    column: String,
    #[serde(default)]
    group: Option<usize>,
    #[serde(default)]
    post: Option<PostProcess>,
    #[serde(default)]
    scope: Scope,
    #[serde(default)]
    required: bool,
}

/// Ordered, validated collection of mapping rules.
#[derive(Debug, Clone, Default)]
pub struct MappingSet {
    rules: Vec<MappingRule>,
}

impl MappingSet {
    /// Load and validate a mapping file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_yaml(&content)?;
        debug!("loaded {} mapping rules from {}", set.len(), path.display());
        Ok(set)
    }

    /// Parse a mapping from YAML text. Entries keep file order.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let entries = match doc {
            serde_yaml::Value::Mapping(m) => m,
            serde_yaml::Value::Null => return Err(ConfigError::Empty),
            _ => return Err(ConfigError::NotAMapping),
        };

        let mut rules = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let field = match key {
                serde_yaml::Value::String(s) => s,
                other => {
                    return Err(ConfigError::InvalidRule {
                        field: format!("{other:?}"),
                        reason: "field name must be a string".to_string(),
                    });
                }
            };

            let raw: RawRule =
                serde_yaml::from_value(value).map_err(|e| ConfigError::InvalidRule {
                    field: field.clone(),
                    reason: e.to_string(),
                })?;

            let pattern =
                Regex::new(&raw.pattern).map_err(|e| ConfigError::InvalidPattern {
                    field: field.clone(),
                    reason: e.to_string(),
                })?;

            let cell: CellRef = raw.column.parse().map_err(|_| ConfigError::InvalidCell {
                field: field.clone(),
                cell: raw.column.clone(),
            })?;

            rules.push(MappingRule {
                field,
                pattern,
                cell,
                group: raw.group.unwrap_or(1),
                post: raw.post,
                scope: raw.scope,
                required: raw.required,
            });
        }

        let set = Self { rules };
        validate(&set)?;
        Ok(set)
    }

    /// Rules in mapping-file order.
    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Look up a rule by field name.
    pub fn rule(&self, field: &str) -> Option<&MappingRule> {
        self.rules.iter().find(|r| r.field == field)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Validate the shape of a mapping set.
///
/// Pure function, no side effects: checks that the set is non-empty,
/// that every pattern has a usable capture group, that field names are
/// unique, and that no two rules target the same cell.
pub fn validate(set: &MappingSet) -> Result<(), ConfigError> {
    if set.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut by_field: HashMap<&str, ()> = HashMap::new();
    let mut by_cell: HashMap<CellRef, &str> = HashMap::new();

    for rule in set.rules() {
        // captures_len counts group 0 (the whole match).
        if rule.group == 0 || rule.group >= rule.pattern.captures_len() {
            return Err(ConfigError::NoCaptureGroup {
                field: rule.field.clone(),
                group: rule.group,
            });
        }

        if by_field.insert(&rule.field, ()).is_some() {
            return Err(ConfigError::InvalidRule {
                field: rule.field.clone(),
                reason: "duplicate field name".to_string(),
            });
        }

        if let Some(first) = by_cell.insert(rule.cell, &rule.field) {
            return Err(ConfigError::DuplicateCell {
                cell: rule.cell.to_string(),
                first: first.to_string(),
                second: rule.field.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_yaml() -> &'static str {
        r#"
nome:
  pattern: "Nome completo: (.*)"
  column: B2
cpf:
  pattern: "CPF: ([0-9.\\-]+)"
  column: C2
  post: digits
  required: true
nascimento:
  pattern: "Nascimento: (\\d{2}/\\d{2}/\\d{4})"
  column: D2
  post: date
  scope: page
"#
    }

    #[test]
    fn loads_rules_in_file_order() {
        let set = MappingSet::from_yaml(sample_yaml()).unwrap();
        let fields: Vec<&str> = set.rules().iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["nome", "cpf", "nascimento"]);
    }

    #[test]
    fn parses_rule_attributes() {
        let set = MappingSet::from_yaml(sample_yaml()).unwrap();

        let cpf = set.rule("cpf").unwrap();
        assert_eq!(cpf.cell, CellRef::new(3, 2));
        assert_eq!(cpf.post, Some(PostProcess::Digits));
        assert!(cpf.required);
        assert_eq!(cpf.scope, Scope::Document);

        let nasc = set.rule("nascimento").unwrap();
        assert_eq!(nasc.scope, Scope::Page);
        assert!(!nasc.required);
    }

    #[test]
    fn valid_set_passes_validation() {
        let set = MappingSet::from_yaml(sample_yaml()).unwrap();
        assert!(validate(&set).is_ok());
    }

    #[test]
    fn duplicate_target_cell_fails_validation() {
        let yaml = r#"
a:
  pattern: "A: (.*)"
  column: B2
b:
  pattern: "B: (.*)"
  column: B2
"#;
        let err = MappingSet::from_yaml(yaml).unwrap_err();
        match err {
            ConfigError::DuplicateCell { cell, first, second } => {
                assert_eq!(cell, "B2");
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("expected DuplicateCell, got {other:?}"),
        }
    }

    #[test]
    fn pattern_without_capture_group_is_rejected() {
        let yaml = r#"
a:
  pattern: "no groups here"
  column: B2
"#;
        let err = MappingSet::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::NoCaptureGroup { .. }));
    }

    #[test]
    fn group_index_out_of_range_is_rejected() {
        let yaml = r#"
a:
  pattern: "A: (.*)"
  column: B2
  group: 2
"#;
        let err = MappingSet::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::NoCaptureGroup { group: 2, .. }));
    }

    #[test]
    fn missing_pattern_key_is_rejected() {
        let yaml = r#"
a:
  column: B2
"#;
        let err = MappingSet::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { .. }));
    }

    #[test]
    fn missing_column_key_is_rejected() {
        let yaml = r#"
a:
  pattern: "A: (.*)"
"#;
        assert!(matches!(
            MappingSet::from_yaml(yaml).unwrap_err(),
            ConfigError::InvalidRule { .. }
        ));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let yaml = r#"
a:
  pattern: "(["
  column: B2
"#;
        assert!(matches!(
            MappingSet::from_yaml(yaml).unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn invalid_cell_address_is_rejected() {
        let yaml = r#"
a:
  pattern: "A: (.*)"
  column: "2B"
"#;
        assert!(matches!(
            MappingSet::from_yaml(yaml).unwrap_err(),
            ConfigError::InvalidCell { .. }
        ));
    }

    #[test]
    fn empty_mapping_is_rejected() {
        assert!(matches!(
            MappingSet::from_yaml("").unwrap_err(),
            ConfigError::Empty
        ));
        assert!(matches!(
            MappingSet::from_yaml("{}").unwrap_err(),
            ConfigError::Empty
        ));
    }

    #[test]
    fn non_mapping_top_level_is_rejected() {
        assert!(matches!(
            MappingSet::from_yaml("- a\n- b\n").unwrap_err(),
            ConfigError::NotAMapping
        ));
    }
}
