//! Row placeholder substitution for value-formula templates

use crate::error::{SheetError, SheetResult};
use regex::Regex;

/// Token replaced by the target row number, e.g. `=SUM(M{row},P{row})`
pub const ROW_PLACEHOLDER: &str = "{row}";

/// A value formula that varies per row.
///
/// Holds at least one `{row}` token and no other `{name}` placeholders.
/// Formula contents are otherwise opaque and never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaTemplate {
    source: String,
    placeholders: usize,
}

impl FormulaTemplate {
    pub fn parse(source: &str) -> SheetResult<Self> {
        let placeholder_pattern = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| SheetError::Config(format!("Regex error: {}", e)))?;

        let mut placeholders = 0;
        for captures in placeholder_pattern.captures_iter(source) {
            let name = &captures[1];
            if name != "row" {
                return Err(SheetError::invalid_template(
                    source,
                    format!("unknown placeholder '{{{}}}', only {} is supported", name, ROW_PLACEHOLDER),
                ));
            }
            placeholders += 1;
        }

        if placeholders == 0 {
            return Err(SheetError::invalid_template(
                source,
                format!("does not contain a '{}' placeholder", ROW_PLACEHOLDER),
            ));
        }

        Ok(Self {
            source: source.to_string(),
            placeholders,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Formula text for one row; every placeholder gets the same row number
    pub fn expand(&self, row: u32) -> String {
        self.source.replace(ROW_PLACEHOLDER, &row.to_string())
    }
}

/// Validate `template` and expand it for `row` in one step
pub fn expand_template(template: &str, row: u32) -> SheetResult<String> {
    FormulaTemplate::parse(template).map(|t| t.expand(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_single_placeholder() {
        assert_eq!(
            expand_template("=FLOOR($M{row}*0.17,0.01)", 7).unwrap(),
            "=FLOOR($M7*0.17,0.01)"
        );
    }

    #[test]
    fn test_expand_replaces_every_occurrence() {
        let template = FormulaTemplate::parse("=SUM(M{row},P{row},Q{row},S{row})").unwrap();
        assert_eq!(template.placeholder_count(), 4);
        assert_eq!(template.expand(5), "=SUM(M5,P5,Q5,S5)");
    }

    #[test]
    fn test_no_row_bleed_between_expansions() {
        let template = FormulaTemplate::parse("SUM(M{row},P{row})").unwrap();
        assert_eq!(template.expand(2), "SUM(M2,P2)");
        assert_eq!(template.expand(3), "SUM(M3,P3)");
        assert_eq!(template.source(), "SUM(M{row},P{row})");
    }

    #[test]
    fn test_missing_placeholder_is_invalid() {
        let err = expand_template("=SUM(M2,P2)", 2).unwrap_err();
        assert!(matches!(err, SheetError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_foreign_placeholders_are_invalid() {
        let err = FormulaTemplate::parse("=FLOOR($B{incorrect}*0.5*$B{nan})").unwrap_err();
        assert!(err.to_string().contains("{incorrect}"));

        assert!(FormulaTemplate::parse("=$B{row}*$C{col}").is_err());
    }

    #[test]
    fn test_array_constants_are_not_placeholders() {
        let template = FormulaTemplate::parse("=SUM(M{row}*{1,2})").unwrap();
        assert_eq!(template.expand(9), "=SUM(M9*{1,2})");
    }
}
