use thiserror::Error;

#[derive(Error, Debug)]
pub enum RollbackError {
    #[error("Required columns not found: {missing:?}. Required: {}", .required.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        required: Vec<String>,
    },

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for RollbackError {
    fn from(err: polars::error::PolarsError) -> Self {
        RollbackError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RollbackError>;
