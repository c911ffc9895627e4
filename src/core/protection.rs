//! Sheet protection with selectively editable columns

use super::header::HeaderIndex;
use crate::error::{SheetError, SheetResult};
use crate::types::{Grid, SheetProtection, FIRST_DATA_ROW, MAX_ROWS};
use tracing::info;

/// Lock the whole sheet behind `password`, then unlock rows
/// `2..=row_count + 1` in each of `editable_columns`.
///
/// Header cells always stay locked. Every column is resolved before anything
/// changes, and re-running with the same inputs yields the same lock state.
pub fn protect_sheet<S: AsRef<str>>(
    grid: &mut Grid,
    password: &str,
    editable_columns: &[S],
    row_count: usize,
) -> SheetResult<()> {
    let index = HeaderIndex::build(grid);
    let columns = editable_columns
        .iter()
        .map(|name| index.position(name.as_ref()))
        .collect::<SheetResult<Vec<u16>>>()?;

    let last_row = last_unlocked_row(row_count)?;

    for (_, cell) in grid.cells_mut() {
        cell.style.locked = true;
    }
    grid.set_protection(SheetProtection {
        password: password.to_string(),
    });

    if let Some(last_row) = last_row {
        for col in &columns {
            unlock_column(grid, *col, last_row)?;
        }
    }

    info!(
        columns = columns.len(),
        rows = row_count,
        "sheet protected, editable ranges unlocked"
    );
    Ok(())
}

/// Unlock rows `2..=last_row` of one column; the header cell is left alone
pub fn unlock_column(grid: &mut Grid, col: u16, last_row: u32) -> SheetResult<()> {
    for row in FIRST_DATA_ROW..=last_row {
        grid.cell_mut(row, col)?.style.locked = false;
    }
    Ok(())
}

fn last_unlocked_row(row_count: usize) -> SheetResult<Option<u32>> {
    if row_count == 0 {
        return Ok(None);
    }
    u32::try_from(row_count)
        .ok()
        .and_then(|count| count.checked_add(1))
        .filter(|last| *last <= MAX_ROWS)
        .map(Some)
        .ok_or_else(|| {
            SheetError::InvalidRange(format!(
                "cannot unlock {} rows, the worksheet holds {} rows",
                row_count, MAX_ROWS
            ))
        })
}
