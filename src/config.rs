//! Run configuration: bucket granularity, row filters and display bounds.
//!
//! Built from defaults, an optional JSON file, then CLI overrides. Passed
//! explicitly into the pipeline; nothing here is process-wide state.

use crate::error::{Result, RollbackError};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// strftime pattern for the human-readable bucket start.
pub const BUCKET_LABEL_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BucketGranularity {
    #[default]
    Minute,
    Hour,
}

impl BucketGranularity {
    /// Floor a timestamp to the start of its bucket.
    pub fn floor(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let floored = match self {
            BucketGranularity::Minute => ts.with_second(0).and_then(|t| t.with_nanosecond(0)),
            BucketGranularity::Hour => ts
                .with_minute(0)
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0)),
        };
        floored.unwrap_or(ts)
    }

    pub fn format_bucket(ts: DateTime<Utc>) -> String {
        ts.format(BUCKET_LABEL_FORMAT).to_string()
    }

    /// Label used in export file names.
    pub fn file_label(&self) -> &'static str {
        match self {
            BucketGranularity::Minute => "minuto",
            BucketGranularity::Hour => "hora",
        }
    }
}

impl fmt::Display for BucketGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketGranularity::Minute => write!(f, "minute"),
            BucketGranularity::Hour => write!(f, "hour"),
        }
    }
}

impl FromStr for BucketGranularity {
    type Err = RollbackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "minute" | "minuto" | "t" | "min" => Ok(BucketGranularity::Minute),
            "hour" | "hora" | "h" => Ok(BucketGranularity::Hour),
            other => Err(RollbackError::Config(format!(
                "unknown bucket granularity '{}', expected minute or hour",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub bucket_granularity: BucketGranularity,

    /// Canonical brand labels to keep; empty keeps everything.
    pub brand_filter: Vec<String>,

    /// Case-insensitive substring on `user_id`; empty disables.
    pub user_contains: String,

    /// Case-insensitive substring on `game_name`; empty disables.
    pub game_contains: String,

    pub top_n_global: usize,
    pub top_n_per_brand: usize,

    /// Preferred order of brand sections; brands not listed follow in
    /// first-appearance order.
    pub brand_order: Vec<String>,

    /// Additional alias -> canonical label entries for the brand classifier.
    pub extra_brand_aliases: BTreeMap<String, String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bucket_granularity: BucketGranularity::Minute,
            brand_filter: Vec::new(),
            user_contains: String::new(),
            game_contains: String::new(),
            top_n_global: 20,
            top_n_per_brand: 15,
            brand_order: vec!["7K".to_string(), "Cassino".to_string(), "Vera".to_string()],
            extra_brand_aliases: BTreeMap::new(),
        }
    }
}

impl RunConfig {
    /// Load a config from a JSON file; missing keys fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n_global == 0 {
            return Err(RollbackError::Config(
                "top_n_global must be a positive integer".to_string(),
            ));
        }
        if self.top_n_per_brand == 0 {
            return Err(RollbackError::Config(
                "top_n_per_brand must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    pub fn has_filters(&self) -> bool {
        !self.brand_filter.is_empty()
            || !self.user_contains.trim().is_empty()
            || !self.game_contains.trim().is_empty()
    }

    /// Same configuration with every row filter cleared.
    pub fn without_filters(&self) -> Self {
        Self {
            brand_filter: Vec::new(),
            user_contains: String::new(),
            game_contains: String::new(),
            ..self.clone()
        }
    }
}
