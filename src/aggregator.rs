//! Grouped summaries over the fact views.
//!
//! Every result is sorted by `qtd_rollbacks` descending; equal counts keep the
//! grouping key in ascending order.

use crate::config::BucketGranularity;
use crate::models::{
    ClientGameFact, FactRow, GameBrandCount, GameCount, TimeBucketCount, UserGameCount,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

/// Distinct references per (brand, user, game).
pub fn per_user_game(facts: &[ClientGameFact]) -> Vec<UserGameCount> {
    let mut groups: BTreeMap<(&str, &str, &str), HashSet<&str>> = BTreeMap::new();
    for fact in facts {
        groups
            .entry((fact.brand_name.as_str(), fact.user_id.as_str(), fact.game_name.as_str()))
            .or_default()
            .insert(fact.reference.as_str());
    }

    let mut rows: Vec<UserGameCount> = groups
        .into_iter()
        .map(|((brand, user, game), refs)| UserGameCount {
            brand_name: brand.to_string(),
            user_id: user.to_string(),
            game_name: game.to_string(),
            qtd_rollbacks: refs.len() as u64,
        })
        .collect();
    rows.sort_by(|a, b| b.qtd_rollbacks.cmp(&a.qtd_rollbacks));
    rows
}

/// Rollbacks per (brand, bucket start).
pub fn per_time_bucket(facts: &[FactRow], granularity: BucketGranularity) -> Vec<TimeBucketCount> {
    let mut groups: BTreeMap<(&str, DateTime<Utc>), u64> = BTreeMap::new();
    for fact in facts {
        *groups
            .entry((fact.brand_name.as_str(), granularity.floor(fact.created_at)))
            .or_insert(0) += 1;
    }

    let mut rows: Vec<TimeBucketCount> = groups
        .into_iter()
        .map(|((brand, bucket), count)| TimeBucketCount {
            brand_name: brand.to_string(),
            bucket_time: bucket,
            horario_utc: BucketGranularity::format_bucket(bucket),
            qtd_rollbacks: count,
        })
        .collect();
    rows.sort_by(|a, b| b.qtd_rollbacks.cmp(&a.qtd_rollbacks));
    rows
}

/// Rollbacks per (brand, game); facts without a game are left out.
pub fn per_game_by_brand(facts: &[FactRow]) -> Vec<GameBrandCount> {
    let mut groups: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for fact in facts {
        if let Some(game) = fact.game_name.as_deref() {
            *groups.entry((fact.brand_name.as_str(), game)).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<GameBrandCount> = groups
        .into_iter()
        .map(|((brand, game), count)| GameBrandCount {
            brand_name: brand.to_string(),
            game_name: game.to_string(),
            qtd_rollbacks: count,
        })
        .collect();
    rows.sort_by(|a, b| b.qtd_rollbacks.cmp(&a.qtd_rollbacks));
    rows
}

/// Brand-agnostic game ranking: the per-brand counts summed per game.
pub fn per_game_global(by_brand: &[GameBrandCount]) -> Vec<GameCount> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for row in by_brand {
        *totals.entry(row.game_name.as_str()).or_insert(0) += row.qtd_rollbacks;
    }

    let mut rows: Vec<GameCount> = totals
        .into_iter()
        .map(|(game, count)| GameCount {
            game_name: game.to_string(),
            qtd_rollbacks: count,
        })
        .collect();
    rows.sort_by(|a, b| b.qtd_rollbacks.cmp(&a.qtd_rollbacks));
    rows
}
