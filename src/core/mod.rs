//! Sheet building blocks: header lookup, formula templates, rule application,
//! record insertion, styling and protection

pub mod formatter;
pub mod header;
pub mod insert;
pub mod protection;
pub mod style;
pub mod template;

pub use formatter::{apply_rules, GridFormatter};
pub use header::{column_letter, column_number, find_column, HeaderIndex};
pub use insert::{insert_records, InsertSummary};
pub use protection::{protect_sheet, unlock_column};
pub use template::{expand_template, FormulaTemplate};
