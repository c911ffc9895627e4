//! Record table: the rectangular input handed to the sheet builder
//!
//! Records arrive from CSV or JSON with source field names (snake_case from
//! the billing database). The table renames them to sheet display names,
//! turns date fields into date values, and can become a fresh [`Grid`].

use crate::error::{SheetError, SheetResult};
use crate::types::{CellValue, Grid, FIRST_DATA_ROW};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    fields: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RecordTable {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> SheetResult<Self> {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        ensure_unique(&fields)?;
        Ok(Self {
            fields,
            rows: Vec::new(),
        })
    }

    pub fn push_row(&mut self, values: Vec<CellValue>) -> SheetResult<()> {
        if values.len() != self.fields.len() {
            return Err(SheetError::Config(format!(
                "Record {} has {} values, expected {}",
                self.rows.len() + 1,
                values.len(),
                self.fields.len()
            )));
        }
        self.rows.push(values);
        Ok(())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.field_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Rename fields through `mapping`; unmapped fields keep their name
    pub fn rename_headers(&mut self, mapping: &HashMap<String, String>) -> SheetResult<()> {
        let renamed: Vec<String> = self
            .fields
            .iter()
            .map(|f| mapping.get(f).cloned().unwrap_or_else(|| f.clone()))
            .collect();
        ensure_unique(&renamed)?;
        self.fields = renamed;
        Ok(())
    }

    /// Turn ISO date strings in the named columns into date values.
    ///
    /// `YYYY-MM-DD` becomes a date, `YYYY-MM-DD HH:MM:SS` (or with `T`) a
    /// timestamp. Empty cells stay empty; values already typed as dates pass.
    pub fn parse_date_columns<S: AsRef<str>>(&mut self, names: &[S]) -> SheetResult<()> {
        for name in names {
            let name = name.as_ref();
            let idx = self
                .field_index(name)
                .ok_or_else(|| SheetError::column_not_found(name))?;

            for (row_no, row) in self.rows.iter_mut().enumerate() {
                let parsed = match &row[idx] {
                    CellValue::Text(text) => parse_date(text).ok_or_else(|| {
                        SheetError::Config(format!(
                            "Column '{}' record {}: '{}' is not a date",
                            name,
                            row_no + 1,
                            text
                        ))
                    })?,
                    CellValue::Empty | CellValue::Date(_) | CellValue::DateTime(_) => continue,
                    other => {
                        return Err(SheetError::Config(format!(
                            "Column '{}' record {}: {} value is not a date",
                            name,
                            row_no + 1,
                            other.type_name()
                        )))
                    }
                };
                row[idx] = parsed;
            }
            debug!(column = name, "parsed date column");
        }
        Ok(())
    }

    /// Insert empty user-entry columns. Positions are 0-based and applied in order.
    pub fn insert_columns(&mut self, columns: &[(String, usize)]) -> SheetResult<()> {
        for (name, position) in columns {
            if self.field_index(name).is_some() {
                return Err(SheetError::Config(format!(
                    "Cannot insert column '{}': it already exists",
                    name
                )));
            }
            if *position > self.fields.len() {
                return Err(SheetError::Config(format!(
                    "Cannot insert column '{}' at position {}: table has {} columns",
                    name,
                    position,
                    self.fields.len()
                )));
            }
            self.fields.insert(*position, name.clone());
            for row in &mut self.rows {
                row.insert(*position, CellValue::Empty);
            }
        }
        Ok(())
    }

    /// Fresh grid: fields as the header row, one record per row from row 2
    pub fn to_grid(&self, sheet_name: &str) -> SheetResult<Grid> {
        let mut grid = Grid::with_headers(sheet_name, &self.fields)?;
        for (offset, record) in self.rows.iter().enumerate() {
            let row = data_row(offset)?;
            for (idx, value) in record.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                grid.set_value(row, (idx + 1) as u16, value.clone())?;
            }
        }
        Ok(grid)
    }

    pub fn from_csv_path(path: &Path) -> SheetResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Read CSV with a header row. Plain numbers become numbers; numbers with
    /// leading zeros (account numbers, IDs) stay text.
    pub fn from_csv_reader<R: Read>(reader: R) -> SheetResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut table = RecordTable::new(headers.iter().map(|h| h.trim().to_string()))?;

        for record in csv_reader.records() {
            let record = record?;
            table.push_row(record.iter().map(infer_value).collect())?;
        }

        Ok(table)
    }

    pub fn from_json_path(path: &Path) -> SheetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Read a JSON array of objects. Field order comes from the first record;
    /// later records may omit fields (empty) but not add new ones.
    pub fn from_json_str(content: &str) -> SheetResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let records = value.as_array().ok_or_else(|| {
            SheetError::Config("Record file must be a JSON array of objects".to_string())
        })?;

        let Some(first) = records.first() else {
            return Ok(Self::default());
        };
        let fields: Vec<String> = first
            .as_object()
            .ok_or_else(|| SheetError::Config("Record 1 is not a JSON object".to_string()))?
            .keys()
            .cloned()
            .collect();
        let mut table = RecordTable::new(fields)?;

        for (idx, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                SheetError::Config(format!("Record {} is not a JSON object", idx + 1))
            })?;
            if let Some(extra) = object.keys().find(|k| table.field_index(k).is_none()) {
                return Err(SheetError::Config(format!(
                    "Record {} has unknown field '{}'",
                    idx + 1,
                    extra
                )));
            }
            let values = table
                .fields
                .iter()
                .map(|field| json_value(object.get(field), field, idx + 1))
                .collect::<SheetResult<Vec<_>>>()?;
            table.push_row(values)?;
        }

        Ok(table)
    }

    /// Load by extension: `.csv` or `.json`
    pub fn load(path: &Path) -> SheetResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Self::from_csv_path(path),
            Some("json") => Self::from_json_path(path),
            _ => Err(SheetError::Config(format!(
                "Unsupported record file '{}': expected .csv or .json",
                path.display()
            ))),
        }
    }
}

/// Sheet row for the record at `offset` (0-based)
pub(crate) fn data_row(offset: usize) -> SheetResult<u32> {
    u32::try_from(offset)
        .ok()
        .and_then(|o| o.checked_add(FIRST_DATA_ROW))
        .ok_or_else(|| SheetError::InvalidRange(format!("record {} is out of range", offset + 1)))
}

fn ensure_unique(fields: &[String]) -> SheetResult<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.as_str()) {
            return Err(SheetError::Config(format!(
                "Duplicate column name '{}'",
                field
            )));
        }
    }
    Ok(())
}

fn parse_date(text: &str) -> Option<CellValue> {
    let text = text.trim();
    if text.is_empty() {
        return Some(CellValue::Empty);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(CellValue::Date(date));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(CellValue::DateTime)
}

fn infer_value(raw: &str) -> CellValue {
    let text = raw.trim();
    if text.is_empty() {
        return CellValue::Empty;
    }
    if looks_numeric(text) {
        if let Ok(n) = text.parse::<f64>() {
            return CellValue::Number(n);
        }
    }
    CellValue::Text(raw.to_string())
}

/// Digits with optional sign and decimal point, no leading zeros on the integer part
fn looks_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits(int_part) {
        return false;
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return false;
    }
    frac_part.map_or(true, digits)
}

fn json_value(value: Option<&serde_json::Value>, field: &str, record: usize) -> SheetResult<CellValue> {
    use serde_json::Value;
    Ok(match value {
        None | Some(Value::Null) => CellValue::Empty,
        Some(Value::Bool(b)) => CellValue::Boolean(*b),
        Some(Value::Number(n)) => n.as_f64().map(CellValue::Number).ok_or_else(|| {
            SheetError::Config(format!("Record {} field '{}': number out of range", record, field))
        })?,
        Some(Value::String(s)) => CellValue::Text(s.clone()),
        Some(_) => {
            return Err(SheetError::Config(format!(
                "Record {} field '{}': nested values are not supported",
                record, field
            )))
        }
    })
}
