//! Excel importer: one named sheet of an existing `.xlsx` → [`Grid`]

use crate::error::{SheetError, SheetResult};
use crate::types::{CellValue, Grid};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::NaiveTime;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads template workbooks. Literal values and formulas are kept; styling,
/// validations and protection of the source sheet are not read back.
pub struct ExcelImporter {
    path: PathBuf,
}

impl ExcelImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Names of every sheet in the workbook, in tab order
    pub fn sheet_names(&self) -> SheetResult<Vec<String>> {
        let workbook = self.open()?;
        Ok(workbook.sheet_names().to_vec())
    }

    /// Load `sheet_name` into a grid named after it
    pub fn load_sheet(&self, sheet_name: &str) -> SheetResult<Grid> {
        let mut workbook = self.open()?;

        if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
            return Err(SheetError::Import(format!(
                "Sheet '{}' not found in {}",
                sheet_name,
                self.path.display()
            )));
        }

        let range = workbook.worksheet_range(sheet_name).map_err(|e| {
            SheetError::Import(format!("Failed to read sheet '{}': {}", sheet_name, e))
        })?;

        let mut grid = Grid::new(sheet_name);
        copy_values(&range, &mut grid)?;

        // Formulas override the cached values calamine reports for the same cells
        let formulas = workbook.worksheet_formula(sheet_name).map_err(|e| {
            SheetError::Import(format!(
                "Failed to read formulas of sheet '{}': {}",
                sheet_name, e
            ))
        })?;
        copy_formulas(&formulas, &mut grid)?;

        info!(
            sheet = sheet_name,
            rows = grid.max_row(),
            columns = grid.max_column(),
            "template sheet loaded"
        );
        Ok(grid)
    }

    fn open(&self) -> SheetResult<Xlsx<std::io::BufReader<std::fs::File>>> {
        if !self.path.exists() {
            return Err(SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Template not found: {}", self.path.display()),
            )));
        }
        open_workbook(&self.path)
            .map_err(|e| SheetError::Import(format!("Failed to open Excel file: {}", e)))
    }
}

/// Convert calamine's 0-based offsets within a range to grid coordinates
fn position(start: (u32, u32), row: usize, col: usize) -> SheetResult<(u32, u16)> {
    let abs_row = u32::try_from(row)
        .ok()
        .and_then(|r| r.checked_add(start.0))
        .and_then(|r| r.checked_add(1));
    let abs_col = u32::try_from(col)
        .ok()
        .and_then(|c| c.checked_add(start.1))
        .and_then(|c| c.checked_add(1))
        .and_then(|c| u16::try_from(c).ok());
    match (abs_row, abs_col) {
        (Some(r), Some(c)) => Ok((r, c)),
        _ => Err(SheetError::Import(format!(
            "cell at offset ({}, {}) is outside the worksheet",
            row, col
        ))),
    }
}

fn copy_values(range: &Range<Data>, grid: &mut Grid) -> SheetResult<()> {
    let start = range.start().unwrap_or((0, 0));
    for (row, col, data) in range.used_cells() {
        let value = convert_data(data);
        if value.is_empty() {
            continue;
        }
        let (r, c) = position(start, row, col)?;
        grid.set_value(r, c, value)?;
    }
    Ok(())
}

fn copy_formulas(formulas: &Range<String>, grid: &mut Grid) -> SheetResult<()> {
    let start = formulas.start().unwrap_or((0, 0));
    let mut count = 0usize;
    for (row, col, formula) in formulas.used_cells() {
        if formula.is_empty() {
            continue;
        }
        let (r, c) = position(start, row, col)?;
        let text = if formula.starts_with('=') {
            formula.clone()
        } else {
            format!("={}", formula)
        };
        grid.set_value(r, c, CellValue::Formula(text))?;
        count += 1;
    }
    debug!(formulas = count, "template formulas loaded");
    Ok(())
}

fn convert_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == NaiveTime::MIN => CellValue::Date(ndt.date()),
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
