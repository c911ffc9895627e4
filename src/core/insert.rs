//! Record insertion into an existing (template) grid

use super::header::HeaderIndex;
use crate::error::SheetResult;
use crate::rules::{ColumnRules, RuleSet};
use crate::table::{data_row, RecordTable};
use crate::types::{Cell, Grid};
use tracing::{debug, info};

/// Outcome of [`insert_records`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    /// Records written
    pub rows: usize,
    /// Cells left alone because the template already holds a formula there
    pub skipped_formula_cells: usize,
}

/// Write each record into the grid starting at row 2, placing every field in
/// the column whose header carries the same name.
///
/// Cells that already hold a formula keep it. Written cells pick up the
/// column's `style_format` and `alignment` from `rules`. All fields are
/// resolved before writing, so a missing header leaves the grid unchanged.
pub fn insert_records(
    grid: &mut Grid,
    table: &RecordTable,
    rules: &RuleSet,
) -> SheetResult<InsertSummary> {
    let index = HeaderIndex::build(grid);
    let columns = table
        .fields()
        .iter()
        .map(|field| Ok((index.position(field)?, rules.get(field))))
        .collect::<SheetResult<Vec<_>>>()?;

    let mut summary = InsertSummary::default();
    for (offset, record) in table.rows().iter().enumerate() {
        let row = data_row(offset)?;
        for ((col, column_rules), value) in columns.iter().zip(record) {
            let cell = grid.cell_mut(row, *col)?;
            if cell.is_formula() {
                summary.skipped_formula_cells += 1;
                continue;
            }
            cell.value = value.clone();
            apply_cell_format(cell, *column_rules);
        }
        summary.rows += 1;
    }

    debug!(skipped = summary.skipped_formula_cells, "formula cells kept");
    info!(rows = summary.rows, sheet = grid.name(), "records inserted");
    Ok(summary)
}

/// Copy a column's per-cell presentation rules onto one cell
pub fn apply_cell_format(cell: &mut Cell, rules: Option<&ColumnRules>) {
    let Some(rules) = rules else {
        return;
    };
    if let Some(format) = &rules.style_format {
        cell.style.number_format = Some(format.clone());
    }
    if let Some(alignment) = rules.alignment {
        cell.style.alignment = Some(alignment);
    }
}
