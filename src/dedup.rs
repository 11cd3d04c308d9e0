//! Deduplication into the two fact views.
//!
//! Both keep the first occurrence of each key in input order. They use
//! different keys over the same rows, so their counts are independent.

use crate::models::{ClientGameFact, CleanRecord, FactRow};
use itertools::Itertools;

/// One row per (brand, reference). Rows without a reference or timestamp are
/// dropped first.
pub fn fact_rows<'a, I>(rows: I) -> Vec<FactRow>
where
    I: IntoIterator<Item = &'a CleanRecord>,
{
    rows.into_iter()
        .filter_map(FactRow::from_record)
        .unique_by(|f| (f.brand_name.clone(), f.reference.clone()))
        .collect()
}

/// One row per (brand, user, game, reference). Also drops rows with no user
/// or no game.
pub fn client_game_facts<'a, I>(rows: I) -> Vec<ClientGameFact>
where
    I: IntoIterator<Item = &'a CleanRecord>,
{
    rows.into_iter()
        .filter_map(ClientGameFact::from_record)
        .unique_by(|f| {
            (
                f.brand_name.clone(),
                f.user_id.clone(),
                f.game_name.clone(),
                f.reference.clone(),
            )
        })
        .collect()
}
