use crate::core::header::column_letter;
use crate::error::{SheetError, SheetResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::RangeInclusive;

/// Row holding the column display names
pub const HEADER_ROW: u32 = 1;

/// First row that carries record data
pub const FIRST_DATA_ROW: u32 = 2;

/// Largest 1-based row index an .xlsx worksheet accepts
pub const MAX_ROWS: u32 = 1_048_576;

/// Largest 1-based column index an .xlsx worksheet accepts (XFD)
pub const MAX_COLUMNS: u16 = 16_384;

//==============================================================================
// Cell values and styles
//==============================================================================

/// Value held by a single cell
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Date-typed field (no time component)
    Date(NaiveDate),
    /// Timestamp field; rendered by its date part when sizing columns
    DateTime(NaiveDateTime),
    /// Formula text, forwarded untouched to the workbook (e.g. `=SUM(M2,P2)`)
    Formula(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text as a user would read it in the sheet.
    ///
    /// Timestamps render as their date only, so a `DATE OF SERVICE` column is
    /// sized for `2024-12-30` rather than `2024-12-30 00:00:00`.
    pub fn display_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            CellValue::DateTime(dt) => Some(dt.date().format("%Y-%m-%d").to_string()),
            CellValue::Formula(f) => Some(f.clone()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "Empty",
            CellValue::Text(_) => "Text",
            CellValue::Number(_) => "Number",
            CellValue::Boolean(_) => "Boolean",
            CellValue::Date(_) => "Date",
            CellValue::DateTime(_) => "DateTime",
            CellValue::Formula(_) => "Formula",
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// 24-bit RGB color, written in configuration as hex (`"4472c4"` or `"#4472C4"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u32);

impl Rgb {
    pub const YELLOW: Rgb = Rgb(0xFFFF00);

    pub fn from_hex(hex: &str) -> SheetResult<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(SheetError::Config(format!(
                "Color '{}' must have exactly 6 hex digits",
                hex
            )));
        }
        u32::from_str_radix(digits, 16)
            .map(Rgb)
            .map_err(|_| SheetError::Config(format!("Color '{}' is not valid hex", hex)))
    }
}

impl TryFrom<String> for Rgb {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}

/// Horizontal alignment accepted in the `alignment` rule key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub name: String,
    pub size: f64,
    pub bold: bool,
}

/// Presentation and protection attributes of one cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    /// Literal display/number format (e.g. `00-000000-00`)
    pub number_format: Option<String>,
    pub alignment: Option<HorizontalAlignment>,
    pub vertical_center: bool,
    pub font: Option<Font>,
    /// Solid pattern fill
    pub fill: Option<Rgb>,
    /// Thin border on all four sides in this color
    pub border: Option<Rgb>,
    /// Cells start locked, matching workbook defaults; only enforced once the sheet is protected
    pub locked: bool,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            number_format: None,
            alignment: None,
            vertical_center: false,
            font: None,
            fill: None,
            border: None,
            locked: true,
        }
    }
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style: CellStyle::default(),
        }
    }

    /// Formula-bearing cells are never overwritten by data insertion
    pub fn is_formula(&self) -> bool {
        self.value.is_formula()
    }
}

//==============================================================================
// Ranges
//==============================================================================

/// Contiguous data-row interval `[2, last]` shared by every column-scoped rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    last: u32,
}

impl RowRange {
    /// Range ending at `last` (inclusive). The header row is never part of it.
    pub fn new(last: u32) -> SheetResult<Self> {
        if last < FIRST_DATA_ROW {
            return Err(SheetError::InvalidRange(format!(
                "row range must end at row {} or later, got {}",
                FIRST_DATA_ROW, last
            )));
        }
        if last > MAX_ROWS {
            return Err(SheetError::InvalidRange(format!(
                "row range end {} exceeds the worksheet limit of {} rows",
                last, MAX_ROWS
            )));
        }
        Ok(Self { last })
    }

    /// Range covering exactly `count` records: rows `2..=count + 1`
    pub fn for_records(count: usize) -> SheetResult<Self> {
        let last = u32::try_from(count)
            .ok()
            .and_then(|c| c.checked_add(1))
            .ok_or_else(|| SheetError::InvalidRange(format!("{} records is too many", count)))?;
        Self::new(last)
    }

    pub fn first(&self) -> u32 {
        FIRST_DATA_ROW
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn len(&self) -> usize {
        (self.last - FIRST_DATA_ROW + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn rows(&self) -> RangeInclusive<u32> {
        FIRST_DATA_ROW..=self.last
    }

    pub fn contains(&self, row: u32) -> bool {
        self.rows().contains(&row)
    }
}

/// One column over a row interval, e.g. `M2:M1000`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub column: u16,
    pub first_row: u32,
    pub last_row: u32,
}

impl CellRange {
    pub fn column_span(column: u16, rows: &RowRange) -> Self {
        Self {
            column,
            first_row: rows.first(),
            last_row: rows.last(),
        }
    }

    pub fn contains(&self, row: u32, column: u16) -> bool {
        column == self.column && (self.first_row..=self.last_row).contains(&row)
    }

    pub fn to_a1(&self) -> String {
        let letter = column_letter(self.column);
        format!("{}{}:{}{}", letter, self.first_row, letter, self.last_row)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

//==============================================================================
// Sheet-level rule objects
//==============================================================================

/// Custom-formula validation evaluated by the workbook when a user edits a cell
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    pub range: CellRange,
    pub formula: String,
    pub error_message: String,
}

/// Formula-gated highlight; never blocks input
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRule {
    pub range: CellRange,
    pub formula: String,
    pub fill: Rgb,
    /// Later rules on the same cell are skipped once this one fires
    pub stop_if_true: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProtection {
    pub password: String,
}

//==============================================================================
// Grid
//==============================================================================

/// In-memory worksheet. Rows and columns are 1-based; row 1 holds header names.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    validations: Vec<ValidationRule>,
    conditional_formats: Vec<ConditionalRule>,
    column_widths: BTreeMap<u16, f64>,
    hidden_columns: BTreeSet<u16>,
    row_heights: BTreeMap<u32, f64>,
    protection: Option<SheetProtection>,
}

impl Grid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Grid with the given names written left to right into row 1
    pub fn with_headers<S: AsRef<str>>(name: impl Into<String>, headers: &[S]) -> SheetResult<Self> {
        let mut grid = Self::new(name);
        for (idx, header) in headers.iter().enumerate() {
            let col = u16::try_from(idx + 1)
                .ok()
                .filter(|c| *c <= MAX_COLUMNS)
                .ok_or_else(|| {
                    SheetError::InvalidRange(format!("{} columns exceeds the worksheet limit", headers.len()))
                })?;
            grid.set_value(HEADER_ROW, col, CellValue::Text(header.as_ref().to_string()))?;
        }
        Ok(grid)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn check_bounds(row: u32, col: u16) -> SheetResult<()> {
        if row == 0 || row > MAX_ROWS || col == 0 || col > MAX_COLUMNS {
            return Err(SheetError::InvalidRange(format!(
                "cell (row {}, column {}) is outside the worksheet",
                row, col
            )));
        }
        Ok(())
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Mutable access, creating an empty cell when none exists yet
    pub fn cell_mut(&mut self, row: u32, col: u16) -> SheetResult<&mut Cell> {
        Self::check_bounds(row, col)?;
        Ok(self.cells.entry((row, col)).or_default())
    }

    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cell(row, col).map(|c| &c.value)
    }

    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) -> SheetResult<()> {
        self.cell_mut(row, col)?.value = value;
        Ok(())
    }

    /// All materialised cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = ((u32, u16), &mut Cell)> {
        self.cells.iter_mut().map(|(pos, cell)| (*pos, cell))
    }

    /// Cells of row 1 only, left to right
    pub fn header_cells(&self) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells
            .range((HEADER_ROW, 1)..=(HEADER_ROW, MAX_COLUMNS))
            .map(|((_, col), cell)| (*col, cell))
    }

    /// Text header names with their positions
    pub fn headers(&self) -> Vec<(u16, String)> {
        self.header_cells()
            .filter_map(|(col, cell)| cell.value.as_text().map(|s| (col, s.to_string())))
            .collect()
    }

    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }

    pub fn max_column(&self) -> u16 {
        self.cells.keys().map(|(_, col)| *col).max().unwrap_or(0)
    }

    pub fn add_validation(&mut self, rule: ValidationRule) {
        self.validations.push(rule);
    }

    pub fn validations(&self) -> &[ValidationRule] {
        &self.validations
    }

    pub fn add_conditional_format(&mut self, rule: ConditionalRule) {
        self.conditional_formats.push(rule);
    }

    pub fn conditional_formats(&self) -> &[ConditionalRule] {
        &self.conditional_formats
    }

    /// Conditional rules covering a cell, in evaluation order
    pub fn conditional_formats_at(&self, row: u32, col: u16) -> Vec<&ConditionalRule> {
        self.conditional_formats
            .iter()
            .filter(|rule| rule.range.contains(row, col))
            .collect()
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.column_widths.iter().map(|(col, width)| (*col, *width))
    }

    pub fn hide_column(&mut self, col: u16) {
        self.hidden_columns.insert(col);
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.hidden_columns.contains(&col)
    }

    pub fn hidden_columns(&self) -> impl Iterator<Item = u16> + '_ {
        self.hidden_columns.iter().copied()
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    pub fn row_heights(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.row_heights.iter().map(|(row, height)| (*row, *height))
    }

    pub fn set_protection(&mut self, protection: SheetProtection) {
        self.protection = Some(protection);
    }

    pub fn protection(&self) -> Option<&SheetProtection> {
        self.protection.as_ref()
    }

    pub fn is_protected(&self) -> bool {
        self.protection.is_some()
    }

    /// Whether a cell is locked; absent cells are locked
    pub fn is_locked(&self, row: u32, col: u16) -> bool {
        self.cell(row, col).map_or(true, |c| c.style.locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_range_bounds() {
        let range = RowRange::new(1000).unwrap();
        assert_eq!(range.first(), 2);
        assert_eq!(range.last(), 1000);
        assert_eq!(range.len(), 999);
        assert!(RowRange::new(1).is_err());
        assert!(RowRange::new(MAX_ROWS + 1).is_err());
    }

    #[test]
    fn test_row_range_for_records() {
        let range = RowRange::for_records(3).unwrap();
        assert_eq!(range.rows().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert!(RowRange::for_records(0).is_err());
    }

    #[test]
    fn test_cell_range_a1() {
        let range = CellRange::column_span(13, &RowRange::new(1000).unwrap());
        assert_eq!(range.to_a1(), "M2:M1000");
        assert!(range.contains(2, 13));
        assert!(!range.contains(1, 13));
        assert!(!range.contains(2, 12));
    }

    #[test]
    fn test_display_text_datetime_uses_date_only() {
        let dt = NaiveDate::from_ymd_opt(2024, 12, 30)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();
        assert_eq!(
            CellValue::DateTime(dt).display_text(),
            Some("2024-12-30".to_string())
        );
        assert_eq!(CellValue::Number(42.0).display_text(), Some("42".to_string()));
        assert_eq!(CellValue::Empty.display_text(), None);
    }

    #[test]
    fn test_rgb_from_hex() {
        assert_eq!(Rgb::from_hex("4472c4").unwrap(), Rgb(0x4472C4));
        assert_eq!(Rgb::from_hex("#FFFF00").unwrap(), Rgb::YELLOW);
        assert!(Rgb::from_hex("fff").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
        assert_eq!(Rgb(0x0000FF).to_string(), "0000ff");
    }

    #[test]
    fn test_grid_headers_scan_row_one_only() {
        let mut grid = Grid::with_headers("Sheet1", &["A", "B"]).unwrap();
        grid.set_value(2, 3, CellValue::from("not a header")).unwrap();
        assert_eq!(
            grid.headers(),
            vec![(1, "A".to_string()), (2, "B".to_string())]
        );
        assert_eq!(grid.max_column(), 3);
        assert_eq!(grid.max_row(), 2);
    }

    #[test]
    fn test_grid_rejects_out_of_bounds_cells() {
        let mut grid = Grid::new("Sheet1");
        assert!(grid.set_value(0, 1, CellValue::Empty).is_err());
        assert!(grid.set_value(1, MAX_COLUMNS + 1, CellValue::Empty).is_err());
    }

    #[test]
    fn test_absent_cells_are_locked() {
        let grid = Grid::new("Sheet1");
        assert!(grid.is_locked(5, 5));
    }
}
