//! End-to-end sheet build: records + config → formatted, protected workbook

use crate::config::ReportConfig;
use crate::core::header::HeaderIndex;
use crate::core::insert::{insert_records, InsertSummary};
use crate::core::protection::protect_sheet;
use crate::core::style;
use crate::core::template::FormulaTemplate;
use crate::core::GridFormatter;
use crate::error::{SheetError, SheetResult};
use crate::excel::{ExcelExporter, ExcelImporter};
use crate::rules::RuleSet;
use crate::table::RecordTable;
use crate::types::{Grid, RowRange};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a successful build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub path: PathBuf,
    pub records: usize,
    pub skipped_formula_cells: usize,
}

/// Problems found by [`ReportBuilder::check`]; empty means the config fits the sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    /// Columns named in the rule file but absent from the header row
    pub missing_rule_columns: Vec<String>,
    /// Editable columns absent from the header row
    pub missing_unlocked_columns: Vec<String>,
    /// (column, reason) for value formulas that would be rejected
    pub invalid_templates: Vec<(String, String)>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.missing_rule_columns.is_empty()
            && self.missing_unlocked_columns.is_empty()
            && self.invalid_templates.is_empty()
    }

    pub fn problem_count(&self) -> usize {
        self.missing_rule_columns.len()
            + self.missing_unlocked_columns.len()
            + self.invalid_templates.len()
    }
}

pub struct ReportBuilder {
    config: ReportConfig,
    rules: RuleSet,
}

impl ReportBuilder {
    pub fn new(config: ReportConfig, rules: RuleSet) -> Self {
        Self { config, rules }
    }

    /// Builder with the rule file named by the config
    pub fn from_config(config: ReportConfig) -> SheetResult<Self> {
        let rules = RuleSet::load(&config.rules)?;
        info!(columns = rules.len(), path = %config.rules.display(), "rules loaded");
        Ok(Self::new(config, rules))
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ReportConfig {
        &mut self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Rename fields to sheet headers and parse date columns. Without a
    /// template the configured user-entry columns are inserted as well.
    pub fn prepare_table(&self, mut table: RecordTable) -> SheetResult<RecordTable> {
        table.rename_headers(&self.config.header_mapping)?;
        table.parse_date_columns(&self.config.date_columns)?;
        if self.config.template.is_none() {
            table.insert_columns(&self.config.inserted_column_positions())?;
        }
        Ok(table)
    }

    /// Grid holding the records: the template sheet with records inserted,
    /// or a fresh sheet built from the table
    pub fn load_grid(&self, table: &RecordTable) -> SheetResult<(Grid, InsertSummary)> {
        match &self.config.template {
            Some(template) => {
                let mut grid = ExcelImporter::new(template).load_sheet(&self.config.sheet_name)?;
                let summary = insert_records(&mut grid, table, &self.rules)?;
                Ok((grid, summary))
            }
            None => {
                let grid = table.to_grid(&self.config.sheet_name)?;
                let summary = InsertSummary {
                    rows: table.len(),
                    skipped_formula_cells: 0,
                };
                Ok((grid, summary))
            }
        }
    }

    /// Column rules, cosmetics and protection, in that order
    pub fn format(&self, grid: &mut Grid, record_count: usize) -> SheetResult<()> {
        let range = self.config.row_range()?;
        if record_count > range.len() {
            warn!(
                records = record_count,
                last_row = range.last(),
                "records extend past the formatted row range"
            );
        }

        GridFormatter::new(&self.rules, range)
            .with_highlight(self.config.style.highlight)
            .apply(grid)?;

        self.apply_style(grid, &range)?;

        let protection = &self.config.protection;
        if protection.enabled {
            protect_sheet(
                grid,
                &protection.password,
                &protection.unlocked_columns,
                record_count,
            )?;
        }
        Ok(())
    }

    fn apply_style(&self, grid: &mut Grid, range: &RowRange) -> SheetResult<()> {
        let style = &self.config.style;
        style::set_header_style(
            grid,
            style.header_fill,
            &style.header_font,
            style.header_font_size,
        )?;
        style::set_header_height(grid, style.header_height)?;
        style::set_alternating_fill(grid, range, style.band_even, style.band_odd, style.border)?;
        style::autosize_columns(grid, style.width_multiplier)?;
        style::set_visible_columns(grid, style.visible_columns)?;
        Ok(())
    }

    /// Prepared, populated and formatted grid; nothing is written to disk
    pub fn build(&self, table: RecordTable) -> SheetResult<(Grid, InsertSummary)> {
        let table = self.prepare_table(table)?;
        let (mut grid, summary) = self.load_grid(&table)?;
        self.format(&mut grid, table.len())?;
        Ok((grid, summary))
    }

    /// Build and save to `output`, or to the configured output path
    pub fn run(&self, table: RecordTable, output: Option<&Path>) -> SheetResult<BuildReport> {
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.output_path());

        // fail before the work when the destination is taken
        if path.exists() {
            return Err(SheetError::DestinationExists(path));
        }

        let (grid, summary) = self.build(table)?;
        let path = ExcelExporter::new(&grid).save(&path)?;

        Ok(BuildReport {
            path,
            records: summary.rows,
            skipped_formula_cells: summary.skipped_formula_cells,
        })
    }

    /// Header row the build would format: the template sheet, or the
    /// prepared table when no template is configured
    pub fn header_grid(&self, table: Option<RecordTable>) -> SheetResult<Grid> {
        match (&self.config.template, table) {
            (Some(template), _) => ExcelImporter::new(template).load_sheet(&self.config.sheet_name),
            (None, Some(table)) => self.prepare_table(table)?.to_grid(&self.config.sheet_name),
            (None, None) => Err(SheetError::Config(
                "no template configured; a record file is needed to know the columns".to_string(),
            )),
        }
    }

    /// Report every configured name the header row lacks and every value
    /// formula that would be rejected, without stopping at the first one
    pub fn check(&self, grid: &Grid) -> CheckReport {
        let index = HeaderIndex::build(grid);
        let invalid_templates = self
            .rules
            .iter()
            .filter_map(|(column, rules)| {
                let source = rules.value_formula.as_deref()?;
                FormulaTemplate::parse(source)
                    .err()
                    .map(|e| (column.to_string(), e.to_string()))
            })
            .collect();

        CheckReport {
            missing_rule_columns: index.missing(self.rules.columns()),
            missing_unlocked_columns: index.missing(
                self.config
                    .protection
                    .unlocked_columns
                    .iter()
                    .map(String::as_str),
            ),
            invalid_templates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ColumnRules;
    use crate::types::CellValue;

    fn table() -> RecordTable {
        let mut table = RecordTable::new(["last_name", "billed_amount"]).unwrap();
        table.push_row(vec!["Smith".into(), 10.0.into()]).unwrap();
        table.push_row(vec!["Jones".into(), 20.0.into()]).unwrap();
        table
    }

    fn builder() -> ReportBuilder {
        let mut config = ReportConfig::new("rules.json");
        config.row_range = 10;
        config.header_mapping = [
            ("last_name".to_string(), "LAST NAME".to_string()),
            ("billed_amount".to_string(), "BILLED AMOUNT".to_string()),
        ]
        .into_iter()
        .collect();
        config.inserted_columns = vec![crate::config::InsertedColumn {
            name: "AMOUNT DUE".to_string(),
            position: 2,
        }];
        config.protection.unlocked_columns = vec!["AMOUNT DUE".to_string()];

        let rules = RuleSet::new().with(
            "AMOUNT DUE",
            ColumnRules {
                data_validation: Some("=AND(ISNUMBER(C2), C2 >= 0, C2 <= $B2)".to_string()),
                ..Default::default()
            },
        );
        ReportBuilder::new(config, rules)
    }

    #[test]
    fn test_build_fresh_sheet() {
        let (grid, summary) = builder().build(table()).unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(
            grid.headers().into_iter().map(|(_, h)| h).collect::<Vec<_>>(),
            vec!["LAST NAME", "BILLED AMOUNT", "AMOUNT DUE"]
        );
        assert_eq!(grid.value(3, 2), Some(&CellValue::Number(20.0)));
        assert_eq!(grid.validations()[0].range.to_a1(), "C2:C10");
        assert!(grid.is_protected());
        assert!(!grid.is_locked(3, 3));
        assert!(grid.is_locked(4, 3));
        assert!(grid.is_column_hidden(23));
    }

    #[test]
    fn test_check_collects_every_problem() {
        let mut builder = builder();
        builder.config_mut().protection.unlocked_columns.push("NOTE".to_string());
        builder.rules = builder
            .rules
            .clone()
            .with("GRAND TOTAL", ColumnRules {
                value_formula: Some("=SUM(M2)".to_string()),
                ..Default::default()
            });

        let grid = builder.header_grid(Some(table())).unwrap();
        let report = builder.check(&grid);

        assert!(!report.is_ok());
        assert_eq!(report.missing_rule_columns, vec!["GRAND TOTAL"]);
        assert_eq!(report.missing_unlocked_columns, vec!["NOTE"]);
        assert_eq!(report.invalid_templates.len(), 1);
        assert_eq!(report.problem_count(), 3);
    }

    #[test]
    fn test_header_grid_needs_records_without_template() {
        assert!(matches!(builder().header_grid(None), Err(SheetError::Config(_))));
    }
}
