//! Column name to position resolution over a grid's header row

use crate::error::{SheetError, SheetResult};
use crate::types::{Grid, MAX_COLUMNS};
use std::collections::HashMap;

/// Find the 1-based position of the first header cell whose text equals `name`.
///
/// Matching is exact: case-sensitive, no trimming. Only row 1 is scanned.
pub fn find_column(grid: &Grid, name: &str) -> SheetResult<u16> {
    grid.header_cells()
        .find(|(_, cell)| cell.value.as_text() == Some(name))
        .map(|(col, _)| col)
        .ok_or_else(|| SheetError::column_not_found(name))
}

/// Header positions captured once per grid.
///
/// Equivalent to calling [`find_column`] for every lookup; it only saves the
/// repeated row-1 scan when many columns are resolved against the same grid.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    positions: HashMap<String, u16>,
}

impl HeaderIndex {
    pub fn build(grid: &Grid) -> Self {
        let mut positions = HashMap::new();
        for (col, name) in grid.headers() {
            // first match wins, like the linear scan
            positions.entry(name).or_insert(col);
        }
        Self { positions }
    }

    pub fn position(&self, name: &str) -> SheetResult<u16> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| SheetError::column_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Every name in `names` that the header row lacks, in input order
    pub fn missing<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|name| !self.contains(name))
            .map(str::to_string)
            .collect()
    }
}

/// Convert a 1-based column number to its letter form
///
/// Examples:
/// - 1 → A
/// - 26 → Z
/// - 27 → AA
/// - 16384 → XFD
pub fn column_letter(col: u16) -> String {
    let mut result = String::new();
    let mut idx = col.max(1) as u32 - 1;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Parse column letters (`"M"`, `"aa"`) back to a 1-based column number
pub fn column_number(letters: &str) -> Option<u16> {
    if letters.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        value = value * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if value > MAX_COLUMNS as u32 {
            return None;
        }
    }
    u16::try_from(value).ok()
}
