//! Ingestion - loads one input file into a polars `DataFrame` with every
//! column as text.
//!
//! - Delimited text (`.csv`, `.tsv`, `.txt`) through polars
//! - Spreadsheets (`.xlsx`, `.xls`, `.xlsm`, `.ods`) through calamine, with a
//!   selectable sheet
//! - A memoizing [`LoadCache`] so an unchanged file is not parsed twice

pub mod cache;
pub mod delimited;
pub mod spreadsheet;

pub use cache::LoadCache;
pub use delimited::DelimitedSource;
pub use spreadsheet::SpreadsheetSource;

use crate::error::{Result, RollbackError};
use polars::prelude::DataFrame;
use std::path::Path;

/// A single input table.
pub trait TableSource {
    /// Read the whole table.
    fn load(&self) -> Result<DataFrame>;

    /// Identifier for logs (the file path).
    fn source_id(&self) -> String;

    /// Source type (e.g., "csv", "spreadsheet")
    fn source_type(&self) -> &str;
}

/// How to read an input file beyond its extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceOptions {
    /// Sheet name for spreadsheets; `None` takes the first sheet.
    pub sheet: Option<String>,
    /// Field separator for delimited text; `None` sniffs the header line.
    pub separator: Option<u8>,
}

const DELIMITED_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];
const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsm", "ods"];

/// Pick a source for `path` by its extension.
pub fn open_source(path: &Path, options: &SourceOptions) -> Result<Box<dyn TableSource>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
        let mut source = DelimitedSource::new(path);
        if let Some(separator) = options.separator {
            source = source.with_separator(separator);
        }
        return Ok(Box::new(source));
    }

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(Box::new(SpreadsheetSource::new(path, options.sheet.clone())));
    }

    Err(RollbackError::UnsupportedFormat(format!(
        "{} (expected one of: {}, {})",
        path.display(),
        DELIMITED_EXTENSIONS.join(", "),
        SPREADSHEET_EXTENSIONS.join(", ")
    )))
}
