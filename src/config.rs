//! Report configuration loaded from YAML
//!
//! ```yaml
//! sheet_name: MAP or COFA
//! template: templates/CTS_Example_Template.xlsx
//! rules: rules.json
//! header_mapping:
//!   control_account_number: "CONTROL/ACCOUNT #"
//!   medicaid_id: MEDICAID ID
//! date_columns: [DATE OF BIRTH, DATE OF SERVICE]
//! protection:
//!   unlocked_columns: [AMOUNT DUE, NOTE]
//! ```
//!
//! Everything except `rules` has a default. Relative paths are resolved
//! against the directory holding the config file.

use crate::error::{SheetError, SheetResult};
use crate::types::{Rgb, RowRange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_SHEET_NAME: &str = "MAP or COFA";
pub const DEFAULT_OUTPUT_DIR: &str = "generated_sheets";
pub const DEFAULT_FILE_NAME: &str = "CTS_Insert_Example.xlsx";
pub const DEFAULT_PASSWORD: &str = "test";
pub const DEFAULT_ROW_RANGE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Workbook whose sheet receives the records; a fresh sheet is built when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    /// Rule file (`.json`, `.yaml`)
    pub rules: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Source field name → sheet header
    #[serde(default)]
    pub header_mapping: HashMap<String, String>,

    /// Sheet headers whose values are ISO dates
    #[serde(default)]
    pub date_columns: Vec<String>,

    /// Empty user-entry columns added when no template is used
    #[serde(default)]
    pub inserted_columns: Vec<InsertedColumn>,

    /// Last row covered by column rules
    #[serde(default = "default_row_range")]
    pub row_range: u32,

    #[serde(default)]
    pub protection: ProtectionConfig,

    #[serde(default)]
    pub style: StyleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertedColumn {
    pub name: String,
    /// 0-based position in the record table
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_password")]
    pub password: String,

    /// Headers whose data rows stay editable
    #[serde(default)]
    pub unlocked_columns: Vec<String>,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            password: default_password(),
            unlocked_columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StyleConfig {
    pub header_fill: Rgb,
    pub header_font: String,
    pub header_font_size: f64,
    pub header_height: f64,
    pub band_even: Rgb,
    pub band_odd: Rgb,
    pub border: Rgb,
    pub highlight: Rgb,
    pub width_multiplier: f64,
    pub visible_columns: u16,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            header_fill: Rgb(0x4472C4),
            header_font: "Calibri".to_string(),
            header_font_size: 8.0,
            header_height: 22.9,
            band_even: Rgb(0xD9E1F2),
            band_odd: Rgb(0xB4C6E7),
            border: Rgb(0x595959),
            highlight: Rgb::YELLOW,
            width_multiplier: 1.2,
            visible_columns: 22,
        }
    }
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

fn default_row_range() -> u32 {
    DEFAULT_ROW_RANGE
}

fn default_true() -> bool {
    true
}

impl ReportConfig {
    /// Config with every default and the given rule file
    pub fn new(rules: impl Into<PathBuf>) -> Self {
        Self {
            sheet_name: default_sheet_name(),
            template: None,
            rules: rules.into(),
            output_dir: default_output_dir(),
            file_name: default_file_name(),
            header_mapping: HashMap::new(),
            date_columns: Vec::new(),
            inserted_columns: Vec::new(),
            row_range: DEFAULT_ROW_RANGE,
            protection: ProtectionConfig::default(),
            style: StyleConfig::default(),
        }
    }

    /// Read a YAML config and resolve its relative paths against the file's directory
    pub fn load(path: &Path) -> SheetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> SheetResult<Self> {
        let config: ReportConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SheetResult<()> {
        if self.sheet_name.trim().is_empty() {
            return Err(SheetError::Config("sheet_name must not be empty".to_string()));
        }
        if self.file_name.trim().is_empty() {
            return Err(SheetError::Config("file_name must not be empty".to_string()));
        }
        self.row_range()?;
        Ok(())
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.rules = resolve(&self.rules);
        self.output_dir = resolve(&self.output_dir);
        if let Some(template) = &self.template {
            self.template = Some(resolve(template));
        }
    }

    pub fn row_range(&self) -> SheetResult<RowRange> {
        RowRange::new(self.row_range)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    /// Inserted columns as (name, position) pairs, in config order
    pub fn inserted_column_positions(&self) -> Vec<(String, usize)> {
        self.inserted_columns
            .iter()
            .map(|c| (c.name.clone(), c.position))
            .collect()
    }
}
