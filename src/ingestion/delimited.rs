//! Delimited text source backed by polars' CSV reader.

use crate::error::Result;
use crate::ingestion::TableSource;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct DelimitedSource {
    path: PathBuf,
    separator: Option<u8>,
}

impl DelimitedSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            separator: None,
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Explicit separator, else tab for `.tsv`, else guessed from the header.
    fn resolve_separator(&self) -> Result<u8> {
        if let Some(separator) = self.separator {
            return Ok(separator);
        }
        let is_tsv = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("tsv"))
            .unwrap_or(false);
        if is_tsv {
            return Ok(b'\t');
        }

        let mut header = String::new();
        BufReader::new(File::open(&self.path)?).read_line(&mut header)?;
        Ok(sniff_separator(&header))
    }
}

/// The most frequent of `,` `;` `\t` `|` in the header line; `,` on a tie or
/// when none appear.
pub fn sniff_separator(header: &str) -> u8 {
    let mut best = b',';
    let mut best_count = header.matches(',').count();
    for candidate in [b';', b'\t', b'|'] {
        let count = header.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

impl TableSource for DelimitedSource {
    fn load(&self) -> Result<DataFrame> {
        let separator = self.resolve_separator()?;
        debug!(path = %self.path.display(), separator = %(separator as char), "reading delimited file");

        // No schema inference: every column stays text so ids keep their form.
        let df = LazyCsvReader::new(&self.path)
            .with_has_header(true)
            .with_separator(separator)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;
        Ok(df)
    }

    fn source_id(&self) -> String {
        self.path.display().to_string()
    }

    fn source_type(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_separator() {
        assert_eq!(sniff_separator("user_id,game_name,reference"), b',');
        assert_eq!(sniff_separator("user_id;game_name;reference\n"), b';');
        assert_eq!(sniff_separator("user_id\tgame_name\treference"), b'\t');
        assert_eq!(sniff_separator("single"), b',');
    }
}
