//! Pipeline entry points.
//!
//! `RollbackPipeline::clean` turns a loaded frame into a [`CleanTable`] once;
//! [`compute`] derives a full report from that table and a [`RunConfig`] and
//! can be re-run on every filter change. A run yields either a complete
//! report or an empty terminal state, never a partial report.

use crate::brand::BrandClassifier;
use crate::config::RunConfig;
use crate::dedup;
use crate::error::Result;
use crate::filters::RowFilter;
use crate::models::{CleanRecord, CleanTable};
use crate::normalizer::Normalizer;
use crate::report::RollbackReport;
use polars::prelude::DataFrame;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// No row has both a reference and a parseable timestamp.
    NoValidRows,
    /// Valid rows exist but the filters removed all of them.
    FilteredOut,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NoValidRows => {
                write!(f, "input has no valid rows with reference and created_at")
            }
            EmptyReason::FilteredOut => write!(f, "no data left after applying filters"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Report(Box<RollbackReport>),
    Empty(EmptyReason),
}

impl RunOutcome {
    pub fn report(&self) -> Option<&RollbackReport> {
        match self {
            RunOutcome::Report(report) => Some(&**report),
            RunOutcome::Empty(_) => None,
        }
    }
}

pub struct RollbackPipeline {
    normalizer: Normalizer,
}

impl RollbackPipeline {
    /// Fails when `extra_brand_aliases` holds a blank entry or re-maps a
    /// canonical label.
    pub fn new(config: &RunConfig) -> Result<Self> {
        let classifier = BrandClassifier::with_aliases(&config.extra_brand_aliases)?;
        Ok(Self {
            normalizer: Normalizer::new(classifier),
        })
    }

    /// Validate columns and normalize every row.
    pub fn clean(&self, raw: &DataFrame) -> Result<CleanTable> {
        let table = self.normalizer.normalize(raw)?;
        info!(rows = table.len(), "input table normalized");
        Ok(table)
    }

    pub fn run(&self, raw: &DataFrame, config: &RunConfig) -> Result<RunOutcome> {
        let table = self.clean(raw)?;
        Ok(compute(&table, config))
    }
}

/// Filter, deduplicate and aggregate. The table is only read.
pub fn compute(table: &CleanTable, config: &RunConfig) -> RunOutcome {
    let valid: Vec<&CleanRecord> = table.countable().collect();
    let dropped = table.len() - valid.len();
    if dropped > 0 {
        debug!(dropped, "rows without reference or created_at discarded");
    }
    if valid.is_empty() {
        warn!("{}", EmptyReason::NoValidRows);
        return RunOutcome::Empty(EmptyReason::NoValidRows);
    }

    let filter = RowFilter::from_config(config);
    let filtered = filter.apply(valid.iter().copied());
    if filtered.is_empty() {
        warn!("{}", EmptyReason::FilteredOut);
        return RunOutcome::Empty(EmptyReason::FilteredOut);
    }
    if filter.is_active() {
        info!(
            before = valid.len(),
            after = filtered.len(),
            "filters applied"
        );
    }

    let facts = dedup::fact_rows(filtered.iter().copied());
    let client_games = dedup::client_game_facts(filtered.iter().copied());
    info!(
        facts = facts.len(),
        client_games = client_games.len(),
        "deduplicated rollback facts"
    );

    let mut brands_present: Vec<String> = Vec::new();
    for record in &filtered {
        if !brands_present.contains(&record.brand_name) {
            brands_present.push(record.brand_name.clone());
        }
    }

    let report = RollbackReport::build(
        facts,
        client_games,
        config.bucket_granularity,
        &brands_present,
        &config.brand_order,
    );
    RunOutcome::Report(Box::new(report))
}

/// Sorted distinct brand labels among valid rows; the options for a brand
/// filter.
pub fn available_brands(table: &CleanTable) -> Vec<String> {
    table
        .countable()
        .map(|r| r.brand_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
