//! Spreadsheet source backed by calamine. The first row of the chosen sheet
//! is the header; every cell becomes text.

use crate::error::{Result, RollbackError};
use crate::ingestion::TableSource;
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct SpreadsheetSource {
    path: PathBuf,
    sheet: Option<String>,
}

impl SpreadsheetSource {
    pub fn new(path: impl AsRef<Path>, sheet: Option<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sheet,
        }
    }
}

impl TableSource for SpreadsheetSource {
    fn load(&self) -> Result<DataFrame> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            RollbackError::Spreadsheet(format!("failed to open {}: {}", self.path.display(), e))
        })?;

        let sheet_names = workbook.sheet_names();
        let sheet = match &self.sheet {
            Some(name) if sheet_names.contains(name) => name.clone(),
            Some(name) => {
                return Err(RollbackError::Spreadsheet(format!(
                    "sheet '{}' not found; available: {}",
                    name,
                    sheet_names.join(", ")
                )))
            }
            None => sheet_names
                .first()
                .cloned()
                .ok_or_else(|| RollbackError::Spreadsheet("workbook has no sheets".to_string()))?,
        };

        let range = workbook.worksheet_range(&sheet).map_err(|e| {
            RollbackError::Spreadsheet(format!("failed to read sheet '{}': {}", sheet, e))
        })?;
        debug!(path = %self.path.display(), sheet = %sheet, "reading spreadsheet");

        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header_row) => unique_headers(header_row.iter().map(cell_text)),
            None => return Ok(DataFrame::empty()),
        };

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for row in rows {
            for (idx, column) in columns.iter_mut().enumerate() {
                column.push(row.get(idx).and_then(cell_text));
            }
        }

        let series: Vec<Series> = headers
            .iter()
            .zip(columns)
            .map(|(name, values)| Series::new(name.as_str(), values))
            .collect();
        Ok(DataFrame::new(series)?)
    }

    fn source_id(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("{}#{}", self.path.display(), sheet),
            None => self.path.display().to_string(),
        }
    }

    fn source_type(&self) -> &str {
        "spreadsheet"
    }
}

/// Cell as text. Whole floats keep a trailing `.0` the way a numeric id
/// column exports; date cells render as ISO-8601.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| naive.format("%Y-%m-%d %H:%M:%S").to_string()),
        Data::DateTimeIso(s) => Some(s.clone()),
        _ => None,
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Blank headers become `column_N`; repeated names get a `_N` suffix.
fn unique_headers<I>(raw: I) -> Vec<String>
where
    I: Iterator<Item = Option<String>>,
{
    let mut seen = HashSet::new();
    raw.enumerate()
        .map(|(idx, name)| {
            let base = name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("column_{}", idx));
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            candidate
        })
        .collect()
}
