use std::path::PathBuf;
use thiserror::Error;

pub type SheetResult<T> = Result<T, SheetError>;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Specified column '{column}' not found in sheet header row")]
    ColumnNotFound { column: String },

    #[error("Invalid value formula template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("The file already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SheetError {
    pub fn column_not_found(column: impl Into<String>) -> Self {
        SheetError::ColumnNotFound {
            column: column.into(),
        }
    }

    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        SheetError::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}
