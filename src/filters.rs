//! Row filters from the run configuration.
//!
//! Filters select from the clean table by reference; the table itself is
//! never modified, so clearing a filter restores the full base.

use crate::config::RunConfig;
use crate::models::CleanRecord;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    brands: HashSet<String>,
    user_contains: Option<String>,
    game_contains: Option<String>,
}

impl RowFilter {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            brands: config.brand_filter.iter().cloned().collect(),
            user_contains: folded_needle(&config.user_contains),
            game_contains: folded_needle(&config.game_contains),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.brands.is_empty() || self.user_contains.is_some() || self.game_contains.is_some()
    }

    /// Absent values never match a substring filter.
    pub fn matches(&self, record: &CleanRecord) -> bool {
        if !self.brands.is_empty() && !self.brands.contains(&record.brand_name) {
            return false;
        }
        if let Some(needle) = &self.user_contains {
            if !contains_folded(record.user_id.as_deref(), needle) {
                return false;
            }
        }
        if let Some(needle) = &self.game_contains {
            if !contains_folded(record.game_name.as_deref(), needle) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a, I>(&self, rows: I) -> Vec<&'a CleanRecord>
    where
        I: IntoIterator<Item = &'a CleanRecord>,
    {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

fn folded_needle(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn contains_folded(value: Option<&str>, needle: &str) -> bool {
    value
        .map(|v| v.to_lowercase().contains(needle))
        .unwrap_or(false)
}
