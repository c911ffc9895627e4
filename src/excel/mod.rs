//! Workbook I/O
//!
//! - Import: one sheet of an existing `.xlsx` (the template) → `Grid`
//! - Export: `Grid` → `.xlsx` with formats, rules, layout and protection

mod exporter;
mod importer;

pub use exporter::{cell_format, ExcelExporter, DEFAULT_DATE_FORMAT};
pub use importer::ExcelImporter;
