//! Cosmetic sheet styling: header look, column widths, row banding, visible columns

use crate::error::{SheetError, SheetResult};
use crate::types::{Font, Grid, HorizontalAlignment, Rgb, RowRange, HEADER_ROW, MAX_COLUMNS};
use std::collections::BTreeMap;
use tracing::debug;

/// Narrowest width (in characters) a sized column gets
pub const MIN_COLUMN_CHARS: usize = 8;

/// Fill, bold font and centering on every header cell
pub fn set_header_style(grid: &mut Grid, fill: Rgb, font_name: &str, font_size: f64) -> SheetResult<()> {
    if font_size <= 0.0 {
        return Err(SheetError::InvalidRange(format!(
            "header font size must be positive, got {}",
            font_size
        )));
    }

    let columns: Vec<u16> = grid.header_cells().map(|(col, _)| col).collect();
    for col in columns {
        let style = &mut grid.cell_mut(HEADER_ROW, col)?.style;
        style.fill = Some(fill);
        style.font = Some(Font {
            name: font_name.to_string(),
            size: font_size,
            bold: true,
        });
        style.alignment = Some(HorizontalAlignment::Center);
        style.vertical_center = true;
    }
    Ok(())
}

pub fn set_header_height(grid: &mut Grid, height: f64) -> SheetResult<()> {
    if height <= 0.0 {
        return Err(SheetError::InvalidRange(format!(
            "header row height must be positive, got {}",
            height
        )));
    }
    grid.set_row_height(HEADER_ROW, height);
    Ok(())
}

/// Size every used column to its longest rendered value.
///
/// Width is `(max(len, 8) + 1) * multiplier`, where `len` counts characters
/// of non-empty cells and timestamps are measured by their date only.
pub fn autosize_columns(grid: &mut Grid, multiplier: f64) -> SheetResult<()> {
    if multiplier <= 0.0 {
        return Err(SheetError::InvalidRange(format!(
            "width multiplier must be positive, got {}",
            multiplier
        )));
    }

    let mut longest: BTreeMap<u16, usize> = BTreeMap::new();
    for ((_, col), cell) in grid.cells() {
        let len = cell
            .value
            .display_text()
            .map_or(0, |text| text.chars().count());
        let entry = longest.entry(col).or_insert(MIN_COLUMN_CHARS);
        *entry = (*entry).max(len);
    }

    for (col, chars) in longest {
        let width = (chars + 1) as f64 * multiplier;
        debug!(col, width, "column width");
        grid.set_column_width(col, width);
    }
    Ok(())
}

/// Band data rows by parity (even rows get `even`, odd rows `odd`) and give
/// every banded cell a thin border in `border`.
pub fn set_alternating_fill(
    grid: &mut Grid,
    range: &RowRange,
    even: Rgb,
    odd: Rgb,
    border: Rgb,
) -> SheetResult<()> {
    let last_col = grid.max_column();
    for row in range.rows() {
        let fill = if row % 2 == 0 { even } else { odd };
        for col in 1..=last_col {
            let style = &mut grid.cell_mut(row, col)?.style;
            style.fill = Some(fill);
            style.border = Some(border);
        }
    }
    Ok(())
}

/// Hide every column after the first `visible` ones, up to the format limit
pub fn set_visible_columns(grid: &mut Grid, visible: u16) -> SheetResult<()> {
    if visible == 0 || visible > MAX_COLUMNS {
        return Err(SheetError::InvalidRange(format!(
            "visible column count must be between 1 and {}, got {}",
            MAX_COLUMNS, visible
        )));
    }
    for col in (visible + 1)..=MAX_COLUMNS {
        grid.hide_column(col);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use chrono::NaiveDate;

    #[test]
    fn test_header_style() {
        let mut grid = Grid::with_headers("Sheet1", &["A", "B"]).unwrap();
        set_header_style(&mut grid, Rgb(0x4472C4), "Calibri", 8.0).unwrap();
        set_header_height(&mut grid, 22.9).unwrap();

        let style = &grid.cell(1, 2).unwrap().style;
        assert_eq!(style.fill, Some(Rgb(0x4472C4)));
        assert!(style.font.as_ref().unwrap().bold);
        assert!(style.vertical_center);
        assert_eq!(grid.row_height(1), Some(22.9));
        assert!(set_header_height(&mut grid, 0.0).is_err());
    }

    #[test]
    fn test_autosize_uses_longest_value_and_minimum() {
        let mut grid = Grid::with_headers("Sheet1", &["ID", "COVERAGE EXPIRATION DATE"]).unwrap();
        grid.set_value(2, 1, CellValue::from("12")).unwrap();
        autosize_columns(&mut grid, 1.0).unwrap();

        assert_eq!(grid.column_width(1), Some(9.0));
        assert_eq!(grid.column_width(2), Some(25.0));
    }

    #[test]
    fn test_autosize_measures_timestamps_by_date() {
        let mut grid = Grid::with_headers("Sheet1", &["D"]).unwrap();
        let stamp = NaiveDate::from_ymd_opt(2024, 12, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        grid.set_value(2, 1, CellValue::DateTime(stamp)).unwrap();
        autosize_columns(&mut grid, 1.2).unwrap();

        // "2024-12-30" is 10 chars
        let width = grid.column_width(1).unwrap();
        assert!((width - 11.0 * 1.2).abs() < 1e-9);
        assert!(autosize_columns(&mut grid, 0.0).is_err());
    }

    #[test]
    fn test_alternating_fill_by_parity() {
        let mut grid = Grid::with_headers("Sheet1", &["A", "B"]).unwrap();
        set_alternating_fill(
            &mut grid,
            &RowRange::new(5).unwrap(),
            Rgb(0xD9E1F2),
            Rgb(0xB4C6E7),
            Rgb(0x595959),
        )
        .unwrap();

        assert_eq!(grid.cell(2, 1).unwrap().style.fill, Some(Rgb(0xD9E1F2)));
        assert_eq!(grid.cell(3, 2).unwrap().style.fill, Some(Rgb(0xB4C6E7)));
        assert_eq!(grid.cell(5, 2).unwrap().style.border, Some(Rgb(0x595959)));
        assert!(grid.cell(1, 1).unwrap().style.fill.is_none());
        assert!(grid.cell(6, 1).is_none());
    }

    #[test]
    fn test_visible_columns() {
        let mut grid = Grid::new("Sheet1");
        set_visible_columns(&mut grid, 22).unwrap();
        assert!(!grid.is_column_hidden(22));
        assert!(grid.is_column_hidden(23));
        assert!(grid.is_column_hidden(MAX_COLUMNS));
        assert_eq!(grid.hidden_columns().count(), (MAX_COLUMNS - 22) as usize);
        assert!(set_visible_columns(&mut grid, 0).is_err());
    }
}
