//! Normalizer - validates the input header once, then cleans each row into a
//! [`CleanRecord`].
//!
//! Row-level problems never fail the run: unparseable timestamps and null-like
//! text become `None` and are dropped later by the countability rule.

use crate::brand::BrandClassifier;
use crate::error::{Result, RollbackError};
use crate::models::{CleanRecord, CleanTable, REQUIRED_COLUMNS};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Text the upstream tools emit for missing values.
const NULL_SENTINELS: [&str; 3] = ["nan", "none", "nat"];

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

pub fn is_null_sentinel(value: &str) -> bool {
    NULL_SENTINELS
        .iter()
        .any(|s| value.eq_ignore_ascii_case(s))
}

/// Trim; blank or null-like text becomes absent.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || is_null_sentinel(trimmed) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Like [`clean_text`], but also strips the `.0` left behind when an id column
/// was stored as a float.
pub fn clean_user_id(raw: Option<&str>) -> Option<String> {
    let cleaned = clean_text(raw)?;
    match cleaned.strip_suffix(".0") {
        Some(stripped) => clean_text(Some(stripped)),
        None => Some(cleaned),
    }
}

/// Parse a timestamp into UTC. Naive values are taken as UTC; month-first
/// for slash-separated dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() || is_null_sentinel(value) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Actual input header for each required column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub user_id: String,
    pub game_name: String,
    pub reference: String,
    pub created_at: String,
    pub brand_name: String,
}

impl ColumnMap {
    /// Match required columns against the frame's headers, ignoring case and
    /// surrounding whitespace. Reports every missing column at once.
    pub fn resolve(df: &DataFrame) -> Result<Self> {
        let mut by_folded: HashMap<String, String> = HashMap::new();
        for name in df.get_column_names() {
            by_folded
                .entry(name.trim().to_lowercase())
                .or_insert_with(|| name.to_string());
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !by_folded.contains_key(**c))
            .map(|c| c.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(RollbackError::MissingColumns {
                missing,
                required: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            });
        }

        let mut take = |name: &str| by_folded.remove(name).unwrap_or_default();
        Ok(Self {
            user_id: take("user_id"),
            game_name: take("game_name"),
            reference: take("reference"),
            created_at: take("created_at"),
            brand_name: take("brand_name"),
        })
    }
}

pub struct Normalizer {
    classifier: BrandClassifier,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(BrandClassifier::default())
    }
}

impl Normalizer {
    pub fn new(classifier: BrandClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &BrandClassifier {
        &self.classifier
    }

    /// Build the clean table. The input frame is only read.
    pub fn normalize(&self, df: &DataFrame) -> Result<CleanTable> {
        let columns = ColumnMap::resolve(df)?;

        let user_ids = text_column(df, &columns.user_id)?;
        let games = text_column(df, &columns.game_name)?;
        let references = text_column(df, &columns.reference)?;
        let created = text_column(df, &columns.created_at)?;
        let brands = text_column(df, &columns.brand_name)?;

        let mut unparsed_timestamps = 0usize;
        let mut records = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let created_at = created[idx].as_deref().and_then(parse_timestamp);
            if created_at.is_none() && created[idx].is_some() {
                unparsed_timestamps += 1;
            }

            records.push(CleanRecord {
                user_id: clean_user_id(user_ids[idx].as_deref()),
                game_name: clean_text(games[idx].as_deref()),
                reference: clean_text(references[idx].as_deref()),
                created_at,
                brand_name: self.classifier.classify(brands[idx].as_deref()),
            });
        }

        debug!(
            rows = records.len(),
            unparsed_timestamps, "normalized input table"
        );
        Ok(CleanTable::new(records))
    }
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}
