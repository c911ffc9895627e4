//! Excel exporter: [`Grid`] → `.xlsx` with formats, validations, conditional
//! formats, layout and protection

use crate::error::{SheetError, SheetResult};
use crate::types::{CellRange, CellStyle, CellValue, Grid, HorizontalAlignment, Rgb};
use rust_xlsxwriter::{
    Color, ConditionalFormatFormula, DataValidation, Format, FormatAlign, FormatBorder,
    FormatPattern, Formula, Workbook, Worksheet,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Display format for date cells that carry no explicit format
pub const DEFAULT_DATE_FORMAT: &str = "mm/dd/yy";

pub struct ExcelExporter<'a> {
    grid: &'a Grid,
}

impl<'a> ExcelExporter<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }

    /// Write the grid as a single-sheet workbook at `path`.
    ///
    /// Never overwrites: an existing file is reported as
    /// [`SheetError::DestinationExists`] before anything is written. A missing
    /// parent directory is created.
    pub fn save(&self, path: &Path) -> SheetResult<PathBuf> {
        if path.exists() {
            return Err(SheetError::DestinationExists(path.to_path_buf()));
        }

        let mut workbook = Workbook::new();
        self.write_sheet(&mut workbook)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        workbook
            .save(path)
            .map_err(|e| SheetError::Export(format!("Failed to save Excel file: {}", e)))?;

        info!(path = %path.display(), sheet = self.grid.name(), "workbook saved");
        Ok(path.to_path_buf())
    }

    fn write_sheet(&self, workbook: &mut Workbook) -> SheetResult<()> {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(self.grid.name())
            .map_err(|e| SheetError::Export(format!("Failed to set worksheet name: {}", e)))?;

        self.write_cells(worksheet)?;
        self.write_validations(worksheet)?;
        self.write_conditional_formats(worksheet)?;
        self.write_layout(worksheet)?;

        if let Some(protection) = self.grid.protection() {
            worksheet.protect_with_password(&protection.password);
        }

        Ok(())
    }

    fn write_cells(&self, worksheet: &mut Worksheet) -> SheetResult<()> {
        let mut written = 0usize;
        for ((row, col), cell) in self.grid.cells() {
            if cell.value.is_empty() && cell.style.is_default() {
                continue;
            }
            let (r, c) = (row - 1, col - 1);
            let format = cell_format(&cell.style, &cell.value);
            write_value(worksheet, r, c, &cell.value, &format)?;
            written += 1;
        }
        debug!(cells = written, "cells written");
        Ok(())
    }

    fn write_validations(&self, worksheet: &mut Worksheet) -> SheetResult<()> {
        for rule in self.grid.validations() {
            let validation = DataValidation::new()
                .allow_custom(Formula::new(rule.formula.as_str()))
                .set_error_message(&rule.error_message)
                .map_err(|e| {
                    SheetError::Export(format!("Invalid validation message for {}: {}", rule.range, e))
                })?;

            let (r1, c1, r2, c2) = zero_based(&rule.range);
            worksheet
                .add_data_validation(r1, c1, r2, c2, &validation)
                .map_err(|e| {
                    SheetError::Export(format!("Failed to add data validation {}: {}", rule.range, e))
                })?;
        }
        Ok(())
    }

    fn write_conditional_formats(&self, worksheet: &mut Worksheet) -> SheetResult<()> {
        for rule in self.grid.conditional_formats() {
            let fill = xlsx_color(rule.fill);
            let format = Format::new()
                .set_foreground_color(fill)
                .set_background_color(fill)
                .set_pattern(FormatPattern::Solid);
            let conditional = ConditionalFormatFormula::new()
                .set_rule(rule.formula.as_str())
                .set_format(format)
                .set_stop_if_true(rule.stop_if_true);

            let (r1, c1, r2, c2) = zero_based(&rule.range);
            worksheet
                .add_conditional_format(r1, c1, r2, c2, &conditional)
                .map_err(|e| {
                    SheetError::Export(format!(
                        "Failed to add conditional format {}: {}",
                        rule.range, e
                    ))
                })?;
        }
        Ok(())
    }

    fn write_layout(&self, worksheet: &mut Worksheet) -> SheetResult<()> {
        for (col, width) in self.grid.column_widths() {
            worksheet
                .set_column_width(col - 1, width)
                .map_err(|e| SheetError::Export(format!("Failed to set column width: {}", e)))?;
        }
        for col in self.grid.hidden_columns() {
            worksheet
                .set_column_hidden(col - 1)
                .map_err(|e| SheetError::Export(format!("Failed to hide column: {}", e)))?;
        }
        for (row, height) in self.grid.row_heights() {
            worksheet
                .set_row_height(row - 1, height)
                .map_err(|e| SheetError::Export(format!("Failed to set row height: {}", e)))?;
        }
        Ok(())
    }
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
) -> SheetResult<()> {
    let result = match value {
        CellValue::Empty => worksheet.write_blank(row, col, format),
        CellValue::Text(s) => worksheet.write_string_with_format(row, col, s, format),
        CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, format),
        CellValue::Boolean(b) => worksheet.write_boolean_with_format(row, col, *b, format),
        CellValue::Date(d) => worksheet.write_datetime_with_format(row, col, d, format),
        CellValue::DateTime(dt) => worksheet.write_datetime_with_format(row, col, dt, format),
        CellValue::Formula(f) => {
            worksheet.write_formula_with_format(row, col, Formula::new(f.as_str()), format)
        }
    };
    result.map(|_| ()).map_err(|e| {
        SheetError::Export(format!(
            "Failed to write {} cell at row {}, column {}: {}",
            value.type_name(),
            row + 1,
            col + 1,
            e
        ))
    })
}

/// Compose the workbook format for one cell
pub fn cell_format(style: &CellStyle, value: &CellValue) -> Format {
    let mut format = Format::new();

    match (&style.number_format, value) {
        (Some(num_format), _) => format = format.set_num_format(num_format),
        (None, CellValue::Date(_) | CellValue::DateTime(_)) => {
            format = format.set_num_format(DEFAULT_DATE_FORMAT)
        }
        _ => {}
    }

    if let Some(alignment) = style.alignment {
        format = format.set_align(xlsx_align(alignment));
    }
    if style.vertical_center {
        format = format.set_align(FormatAlign::VerticalCenter);
    }

    if let Some(font) = &style.font {
        format = format
            .set_font_name(font.name.as_str())
            .set_font_size(font.size);
        if font.bold {
            format = format.set_bold();
        }
    }

    if let Some(fill) = style.fill {
        let color = xlsx_color(fill);
        format = format
            .set_foreground_color(color)
            .set_background_color(color)
            .set_pattern(FormatPattern::Solid);
    }

    if let Some(border) = style.border {
        format = format
            .set_border(FormatBorder::Thin)
            .set_border_color(xlsx_color(border));
    }

    if !style.locked {
        format = format.set_unlocked();
    }

    format
}

fn xlsx_align(alignment: HorizontalAlignment) -> FormatAlign {
    match alignment {
        HorizontalAlignment::General => FormatAlign::General,
        HorizontalAlignment::Left => FormatAlign::Left,
        HorizontalAlignment::Center => FormatAlign::Center,
        HorizontalAlignment::Right => FormatAlign::Right,
        HorizontalAlignment::Fill => FormatAlign::Fill,
        HorizontalAlignment::Justify => FormatAlign::Justify,
    }
}

fn xlsx_color(color: Rgb) -> Color {
    Color::RGB(color.0)
}

fn zero_based(range: &CellRange) -> (u32, u16, u32, u16) {
    (
        range.first_row - 1,
        range.column - 1,
        range.last_row - 1,
        range.column - 1,
    )
}
