//! Report assembly - KPIs, brand-scoped slices and display helpers on top of
//! the aggregated tables.

use crate::aggregator;
use crate::config::BucketGranularity;
use crate::models::{
    ClientGameFact, FactRow, GameBrandCount, GameCount, TimeBucketCount, UserGameCount,
};
use serde::Serialize;
use std::collections::HashSet;

/// Headline counts. "Games" counts (brand, game) pairs, so a game seen under
/// two brands counts twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total_rollbacks: u64,
    pub total_user_games: u64,
    pub total_time_buckets: u64,
    pub total_games: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandSection {
    pub brand: String,
    pub kpis: Kpis,
    pub per_user_game: Vec<UserGameCount>,
    pub per_time_bucket: Vec<TimeBucketCount>,
    pub per_game: Vec<GameBrandCount>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollbackReport {
    pub granularity: BucketGranularity,
    pub facts: Vec<FactRow>,
    pub client_games: Vec<ClientGameFact>,
    pub per_user_game: Vec<UserGameCount>,
    pub per_time_bucket: Vec<TimeBucketCount>,
    pub per_game_by_brand: Vec<GameBrandCount>,
    pub per_game_global: Vec<GameCount>,
    pub kpis: Kpis,
    pub brands: Vec<BrandSection>,
}

impl RollbackReport {
    /// Derive every table from the two fact views. `brands_present` is the
    /// first-appearance order of brands in the filtered rows.
    pub fn build(
        facts: Vec<FactRow>,
        client_games: Vec<ClientGameFact>,
        granularity: BucketGranularity,
        brands_present: &[String],
        brand_order: &[String],
    ) -> Self {
        let per_user_game = aggregator::per_user_game(&client_games);
        let per_time_bucket = aggregator::per_time_bucket(&facts, granularity);
        let per_game_by_brand = aggregator::per_game_by_brand(&facts);
        let per_game_global = aggregator::per_game_global(&per_game_by_brand);

        let kpis = Kpis {
            total_rollbacks: distinct_brand_references(&facts),
            total_user_games: per_user_game.len() as u64,
            total_time_buckets: per_time_bucket.len() as u64,
            total_games: per_game_by_brand
                .iter()
                .map(|r| (r.brand_name.as_str(), r.game_name.as_str()))
                .collect::<HashSet<_>>()
                .len() as u64,
        };

        let brands = order_brands(brands_present, brand_order)
            .into_iter()
            .map(|brand| {
                brand_section(
                    brand,
                    &facts,
                    &per_user_game,
                    &per_time_bucket,
                    &per_game_by_brand,
                )
            })
            .collect();

        Self {
            granularity,
            facts,
            client_games,
            per_user_game,
            per_time_bucket,
            per_game_by_brand,
            per_game_global,
            kpis,
            brands,
        }
    }

    pub fn brand(&self, label: &str) -> Option<&BrandSection> {
        self.brands.iter().find(|b| b.brand == label)
    }

    /// KPIs and the bounded rankings, for printing or JSON output.
    pub fn summary(&self, top_n_global: usize, top_n_per_brand: usize) -> ReportSummary {
        ReportSummary {
            granularity: self.granularity,
            kpis: self.kpis,
            top_games: top_n(&self.per_game_global, top_n_global).to_vec(),
            brands: self
                .brands
                .iter()
                .map(|section| BrandSummary {
                    brand: section.brand.clone(),
                    kpis: section.kpis,
                    top_games: top_n(&section.per_game, top_n_per_brand).to_vec(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub granularity: BucketGranularity,
    pub kpis: Kpis,
    pub top_games: Vec<GameCount>,
    pub brands: Vec<BrandSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandSummary {
    pub brand: String,
    pub kpis: Kpis,
    pub top_games: Vec<GameBrandCount>,
}

/// Distinct references per brand, summed over brands.
fn distinct_brand_references(facts: &[FactRow]) -> u64 {
    facts
        .iter()
        .map(|f| (f.brand_name.as_str(), f.reference.as_str()))
        .collect::<HashSet<_>>()
        .len() as u64
}

fn brand_section(
    brand: String,
    facts: &[FactRow],
    per_user_game: &[UserGameCount],
    per_time_bucket: &[TimeBucketCount],
    per_game_by_brand: &[GameBrandCount],
) -> BrandSection {
    let brand_facts: Vec<FactRow> = facts
        .iter()
        .filter(|f| f.brand_name == brand)
        .cloned()
        .collect();
    let user_games: Vec<UserGameCount> = per_user_game
        .iter()
        .filter(|r| r.brand_name == brand)
        .cloned()
        .collect();
    let buckets: Vec<TimeBucketCount> = per_time_bucket
        .iter()
        .filter(|r| r.brand_name == brand)
        .cloned()
        .collect();
    let games: Vec<GameBrandCount> = per_game_by_brand
        .iter()
        .filter(|r| r.brand_name == brand)
        .cloned()
        .collect();

    let kpis = Kpis {
        total_rollbacks: distinct_brand_references(&brand_facts),
        total_user_games: user_games.len() as u64,
        total_time_buckets: buckets.len() as u64,
        total_games: games
            .iter()
            .map(|r| r.game_name.as_str())
            .collect::<HashSet<_>>()
            .len() as u64,
    };

    BrandSection {
        brand,
        kpis,
        per_user_game: user_games,
        per_time_bucket: buckets,
        per_game: games,
    }
}

/// Preferred brands first (only those present), then the rest in the order
/// they were seen.
pub fn order_brands(present: &[String], preferred: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::with_capacity(present.len());
    for brand in preferred.iter().chain(present) {
        if present.contains(brand) && !ordered.contains(brand) {
            ordered.push(brand.clone());
        }
    }
    ordered
}

/// First `n` rows of a ranking.
pub fn top_n<T>(rows: &[T], n: usize) -> &[T] {
    &rows[..n.min(rows.len())]
}

/// Integer with `.` as the thousands separator: `1234567` -> `1.234.567`.
pub fn format_kpi(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
