//! Declarative per-column rule configuration
//!
//! A rule file maps a column display name to the rule kinds applied to that
//! column. JSON and YAML are both accepted:
//!
//! ```json
//! {
//!     "MEDICAID ID": {
//!         "data_validation": "=AND(LEN(F2)=12, MID(F2,3,1)=\"-\")",
//!         "error_msg": "Input must be in valid medicaid id format (**-******-**)",
//!         "style_format": "00-000000-00",
//!         "alignment": "right"
//!     },
//!     "GRAND TOTAL": {
//!         "value_formula": "=SUM(M{row},P{row},Q{row},S{row})"
//!     }
//! }
//! ```
//!
//! Column order in the file is the order the formatter applies columns in.

use crate::error::{SheetError, SheetResult};
use crate::types::HorizontalAlignment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error text shown when a validation rule has no `error_msg`
pub const DEFAULT_ERROR_MESSAGE: &str =
    "Error, the data you entered violates the data validation rules rule set for this cell.";

/// Rule kinds configured for one column. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRules {
    /// Custom validation formula checked when a user edits a cell
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_validation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,

    /// Highlight the cell when this formula is truthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_format_formula: Option<String>,

    /// Display/number format, e.g. `MM/DD/YY`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<HorizontalAlignment>,

    /// Computed-value template carrying a `{row}` placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_formula: Option<String>,
}

impl ColumnRules {
    pub fn is_empty(&self) -> bool {
        *self == ColumnRules::default()
    }

    pub fn error_message(&self) -> &str {
        self.error_msg.as_deref().unwrap_or(DEFAULT_ERROR_MESSAGE)
    }

    /// Number of rule kinds present (validation and its message count once)
    pub fn kind_count(&self) -> usize {
        [
            self.data_validation.is_some(),
            self.conditional_format_formula.is_some(),
            self.style_format.is_some(),
            self.alignment.is_some(),
            self.value_formula.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// Column name → rules, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    entries: Vec<(String, ColumnRules)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rules for `column`. A replaced entry keeps its position.
    pub fn insert(&mut self, column: impl Into<String>, rules: ColumnRules) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = rules,
            None => self.entries.push((column, rules)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, rules: ColumnRules) -> Self {
        self.insert(column, rules);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ColumnRules> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, rules)| rules)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnRules)> {
        self.entries.iter().map(|(name, rules)| (name.as_str(), rules))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a rule file, choosing the parser by extension (`.json`, `.yaml`, `.yml`)
    pub fn load(path: &Path) -> SheetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(SheetError::Config(format!(
                "Unsupported rule file '{}': expected .json, .yaml or .yml",
                path.display()
            ))),
        }
    }

    pub fn from_json_str(content: &str) -> SheetResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let map = value.as_object().ok_or_else(|| {
            SheetError::Config("Rule file must be a mapping of column name to rules".to_string())
        })?;

        let mut rule_set = RuleSet::new();
        for (column, rules_val) in map {
            let rules: ColumnRules = serde_json::from_value(rules_val.clone()).map_err(|e| {
                SheetError::Config(format!("Invalid rules for column '{}': {}", column, e))
            })?;
            rule_set.insert(column.clone(), rules);
        }
        Ok(rule_set)
    }

    pub fn from_yaml_str(content: &str) -> SheetResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        let map = value.as_mapping().ok_or_else(|| {
            SheetError::Config("Rule file must be a mapping of column name to rules".to_string())
        })?;

        let mut rule_set = RuleSet::new();
        for (key, rules_val) in map {
            let column = key.as_str().ok_or_else(|| {
                SheetError::Config(format!("Column name must be a string, got {:?}", key))
            })?;
            if rule_set.get(column).is_some() {
                return Err(SheetError::Config(format!(
                    "Column '{}' is configured more than once",
                    column
                )));
            }
            let rules: ColumnRules = serde_yaml::from_value(rules_val.clone()).map_err(|e| {
                SheetError::Config(format!("Invalid rules for column '{}': {}", column, e))
            })?;
            rule_set.insert(column, rules);
        }
        Ok(rule_set)
    }

    pub fn to_json_string(&self) -> SheetResult<String> {
        let mut map = serde_json::Map::new();
        for (column, rules) in self.iter() {
            map.insert(column.to_string(), serde_json::to_value(rules)?);
        }
        Ok(serde_json::to_string_pretty(&serde_json::Value::Object(map))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RULES_JSON: &str = r#"{
        "MEDICAID ID": {
            "style_format": "00-000000-00",
            "alignment": "right"
        },
        "DATE OF BIRTH": {
            "data_validation": "=AND(ISNUMBER(E2), E2 > DATE(1900, 1, 1))",
            "error_msg": "Invalid Date Format - Enter date as MM/DD/YYYY",
            "style_format": "MM/DD/YY"
        },
        "CONTROL/ACCOUNT #": {
            "conditional_format_formula": "=AND(ISBLANK(A2),OR(NOT(ISBLANK(B2)),NOT(ISBLANK(C2))))"
        }
    }"#;

    #[test]
    fn test_json_keeps_document_order() {
        let rules = RuleSet::from_json_str(RULES_JSON).unwrap();
        assert_eq!(
            rules.columns().collect::<Vec<_>>(),
            vec!["MEDICAID ID", "DATE OF BIRTH", "CONTROL/ACCOUNT #"]
        );
        let medicaid = rules.get("MEDICAID ID").unwrap();
        assert_eq!(medicaid.style_format.as_deref(), Some("00-000000-00"));
        assert_eq!(medicaid.alignment, Some(HorizontalAlignment::Right));
    }

    #[test]
    fn test_yaml_keeps_document_order() {
        let yaml = r#"
GRAND TOTAL:
  value_formula: "=SUM(M{row},P{row},Q{row},S{row})"
AMOUNT DUE:
  data_validation: "=AND(ISNUMBER(M2), M2 >=0, M2 <= $K2)"
"#;
        let rules = RuleSet::from_yaml_str(yaml).unwrap();
        assert_eq!(
            rules.columns().collect::<Vec<_>>(),
            vec!["GRAND TOTAL", "AMOUNT DUE"]
        );
    }

    #[test]
    fn test_unknown_rule_key_is_rejected() {
        let json = r#"{"TPL AMOUNT": {"format formula": "=ISBLANK(Q2)"}}"#;
        let err = RuleSet::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("TPL AMOUNT"));
    }

    #[test]
    fn test_unknown_alignment_is_rejected() {
        let json = r#"{"TPL": {"alignment": "sideways"}}"#;
        assert!(RuleSet::from_json_str(json).is_err());
    }

    #[test]
    fn test_non_mapping_is_rejected() {
        assert!(matches!(
            RuleSet::from_json_str("[1, 2]"),
            Err(SheetError::Config(_))
        ));
    }

    #[test]
    fn test_default_error_message() {
        let rules = ColumnRules {
            data_validation: Some("=ISNUMBER(M2)".to_string()),
            ..Default::default()
        };
        assert_eq!(rules.error_message(), DEFAULT_ERROR_MESSAGE);
        assert_eq!(rules.kind_count(), 1);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut rules = RuleSet::new()
            .with("A", ColumnRules::default())
            .with("B", ColumnRules::default());
        rules.insert(
            "A",
            ColumnRules {
                style_format: Some("0.00".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(rules.columns().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(!rules.get("A").unwrap().is_empty());
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let rules = RuleSet::from_json_str(RULES_JSON).unwrap();
        let again = RuleSet::from_json_str(&rules.to_json_string().unwrap()).unwrap();
        assert_eq!(rules, again);
    }
}
