//! Claimsheet - rule-driven claim spreadsheet builder
//!
//! Billing records are placed into a worksheet, then a declarative rule set
//! keyed by column header is applied over a row range: custom-formula data
//! validation, stop-if-true conditional highlights, number formats,
//! alignment and per-row value formulas built from `{row}` templates. The
//! sheet is styled, protected with selected columns left editable, and saved
//! as `.xlsx` without ever overwriting an existing file.
//!
//! # Example
//!
//! ```no_run
//! use claimsheet::core::GridFormatter;
//! use claimsheet::excel::ExcelExporter;
//! use claimsheet::rules::RuleSet;
//! use claimsheet::types::{Grid, RowRange};
//! use std::path::Path;
//!
//! let rules = RuleSet::load(Path::new("rules.json"))?;
//! let mut grid = Grid::with_headers("MAP or COFA", &["MEDICAID ID", "GRAND TOTAL"])?;
//!
//! GridFormatter::new(&rules, RowRange::new(1000)?).apply(&mut grid)?;
//! ExcelExporter::new(&grid).save(Path::new("generated_sheets/claims.xlsx"))?;
//! # Ok::<(), claimsheet::error::SheetError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod report;
pub mod rules;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use error::{SheetError, SheetResult};
pub use report::{BuildReport, ReportBuilder};
pub use rules::{ColumnRules, RuleSet};
pub use types::{Cell, CellValue, Grid, RowRange};
