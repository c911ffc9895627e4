//! Grid formatter: applies a [`RuleSet`] to a grid over one row range
//!
//! For every configured column, in rule-set order, the formatter resolves the
//! column by header name and then applies, in this order:
//!
//! 1. custom-formula data validation (one rule object over the whole range)
//! 2. conditional highlight (one rule object, stop-if-true)
//! 3. display/number format on every cell in the range
//! 4. horizontal alignment on every cell in the range
//! 5. value formula, expanded per row and written over any literal value
//!
//! Every column is resolved and every template checked before the grid is
//! touched, so a `ColumnNotFound` or `InvalidTemplate` leaves it unchanged.

use super::header::HeaderIndex;
use super::template::FormulaTemplate;
use crate::error::SheetResult;
use crate::rules::{ColumnRules, RuleSet};
use crate::types::{
    CellRange, CellValue, ConditionalRule, Grid, HorizontalAlignment, Rgb, RowRange,
    ValidationRule,
};
use tracing::{debug, info};

/// A configured column after resolution, ready to apply
struct ColumnPlan<'a> {
    name: &'a str,
    col: u16,
    rules: &'a ColumnRules,
    template: Option<FormulaTemplate>,
}

pub struct GridFormatter<'a> {
    rules: &'a RuleSet,
    range: RowRange,
    highlight: Rgb,
}

impl<'a> GridFormatter<'a> {
    pub fn new(rules: &'a RuleSet, range: RowRange) -> Self {
        Self {
            rules,
            range,
            highlight: Rgb::YELLOW,
        }
    }

    /// Fill used by conditional highlights (yellow by default)
    pub fn with_highlight(mut self, color: Rgb) -> Self {
        self.highlight = color;
        self
    }

    pub fn range(&self) -> RowRange {
        self.range
    }

    /// Run the whole formatting pass
    pub fn apply(&self, grid: &mut Grid) -> SheetResult<()> {
        let plans = self.plan(grid)?;

        info!(
            columns = plans.len(),
            first_row = self.range.first(),
            last_row = self.range.last(),
            "applying column rules"
        );

        for plan in &plans {
            debug!(column = plan.name, col = plan.col, "applying rules");
            self.apply_column(grid, plan)?;
        }

        Ok(())
    }

    fn plan(&self, grid: &Grid) -> SheetResult<Vec<ColumnPlan<'a>>> {
        let index = HeaderIndex::build(grid);
        let mut plans = Vec::with_capacity(self.rules.len());

        for (name, rules) in self.rules.iter() {
            let col = index.position(name)?;
            let template = rules
                .value_formula
                .as_deref()
                .map(FormulaTemplate::parse)
                .transpose()?;
            plans.push(ColumnPlan {
                name,
                col,
                rules,
                template,
            });
        }

        Ok(plans)
    }

    fn apply_column(&self, grid: &mut Grid, plan: &ColumnPlan<'_>) -> SheetResult<()> {
        let rules = plan.rules;

        if let Some(formula) = &rules.data_validation {
            add_data_validation(grid, plan.col, &self.range, formula, rules.error_message());
        }

        if let Some(formula) = &rules.conditional_format_formula {
            add_conditional_formatting(grid, plan.col, &self.range, formula, self.highlight);
        }

        if let Some(format) = &rules.style_format {
            add_style_format(grid, plan.col, &self.range, format)?;
        }

        if let Some(alignment) = rules.alignment {
            add_alignment(grid, plan.col, &self.range, alignment)?;
        }

        if let Some(template) = &plan.template {
            add_value_formula(grid, plan.col, &self.range, template)?;
        }
        Ok(())
    }
}

/// Apply `rules` to `grid` over `range` with the default highlight color
pub fn apply_rules(grid: &mut Grid, rules: &RuleSet, range: RowRange) -> SheetResult<()> {
    GridFormatter::new(rules, range).apply(grid)
}

/// Register one custom-formula validation over the column's row range
pub fn add_data_validation(
    grid: &mut Grid,
    col: u16,
    range: &RowRange,
    formula: &str,
    error_message: &str,
) {
    let cells = CellRange::column_span(col, range);
    debug!(range = %cells, "data validation");
    grid.add_validation(ValidationRule {
        range: cells,
        formula: formula.to_string(),
        error_message: error_message.to_string(),
    });
}

/// Register a stop-if-true highlight over the column's row range
pub fn add_conditional_formatting(
    grid: &mut Grid,
    col: u16,
    range: &RowRange,
    formula: &str,
    fill: Rgb,
) {
    let cells = CellRange::column_span(col, range);
    debug!(range = %cells, "conditional format");
    grid.add_conditional_format(ConditionalRule {
        range: cells,
        formula: formula.to_string(),
        fill,
        stop_if_true: true,
    });
}

/// Set a literal display format on every cell of the column's row range.
/// Purely presentational; nothing is rejected.
pub fn add_style_format(
    grid: &mut Grid,
    col: u16,
    range: &RowRange,
    format: &str,
) -> SheetResult<()> {
    for row in range.rows() {
        grid.cell_mut(row, col)?.style.number_format = Some(format.to_string());
    }
    Ok(())
}

pub fn add_alignment(
    grid: &mut Grid,
    col: u16,
    range: &RowRange,
    alignment: HorizontalAlignment,
) -> SheetResult<()> {
    for row in range.rows() {
        grid.cell_mut(row, col)?.style.alignment = Some(alignment);
    }
    Ok(())
}

/// Write the expanded template into every row, replacing literal values
pub fn add_value_formula(
    grid: &mut Grid,
    col: u16,
    range: &RowRange,
    template: &FormulaTemplate,
) -> SheetResult<()> {
    for row in range.rows() {
        grid.cell_mut(row, col)?.value = CellValue::Formula(template.expand(row));
    }
    Ok(())
}
