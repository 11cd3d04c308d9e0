//! Typed records flowing through the rollback pipeline.
//!
//! `CleanRecord` is the fixed schema validated once at the normalizer boundary.
//! `FactRow` and `ClientGameFact` are the two deduplicated views every count is
//! derived from; the `*Count` rows are the exported result tables.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Columns every input table must carry (matched case-insensitively).
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "user_id",
    "game_name",
    "reference",
    "created_at",
    "brand_name",
];

/// A row after cleaning. `None` is the explicit "absent" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRecord {
    pub user_id: Option<String>,
    pub game_name: Option<String>,
    pub reference: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Always a canonical label, never blank.
    pub brand_name: String,
}

impl CleanRecord {
    /// A row without a reference or a timestamp cannot stand for a rollback.
    pub fn is_countable(&self) -> bool {
        self.reference.is_some() && self.created_at.is_some()
    }
}

/// The normalized table, in input row order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanTable {
    pub records: Vec<CleanRecord>,
}

impl CleanTable {
    pub fn new(records: Vec<CleanRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows that survive the reference/timestamp requirement.
    pub fn countable(&self) -> impl Iterator<Item = &CleanRecord> {
        self.records.iter().filter(|r| r.is_countable())
    }
}

/// One rollback: unique per (brand, reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactRow {
    pub brand_name: String,
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<String>,
    pub game_name: Option<String>,
}

impl FactRow {
    pub fn from_record(record: &CleanRecord) -> Option<Self> {
        Some(Self {
            brand_name: record.brand_name.clone(),
            reference: record.reference.clone()?,
            created_at: record.created_at?,
            user_id: record.user_id.clone(),
            game_name: record.game_name.clone(),
        })
    }
}

/// Unique per (brand, user, game, reference); user and game must be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientGameFact {
    pub brand_name: String,
    pub user_id: String,
    pub game_name: String,
    pub reference: String,
}

impl ClientGameFact {
    pub fn from_record(record: &CleanRecord) -> Option<Self> {
        if !record.is_countable() {
            return None;
        }
        Some(Self {
            brand_name: record.brand_name.clone(),
            user_id: record.user_id.clone()?,
            game_name: record.game_name.clone()?,
            reference: record.reference.clone()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserGameCount {
    pub brand_name: String,
    pub user_id: String,
    pub game_name: String,
    pub qtd_rollbacks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucketCount {
    pub brand_name: String,
    #[serde(skip_serializing)]
    pub bucket_time: DateTime<Utc>,
    /// Bucket start rendered as `DD/MM/YYYY HH:MM` (UTC).
    pub horario_utc: String,
    pub qtd_rollbacks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameBrandCount {
    pub brand_name: String,
    pub game_name: String,
    pub qtd_rollbacks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameCount {
    pub game_name: String,
    pub qtd_rollbacks: u64,
}
