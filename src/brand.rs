//! Brand classification: noisy brand strings to canonical labels.
//!
//! Exact lookup on the trimmed, lowercased value. Unknown brands pass through
//! lowercased; blank, `nan` or `none` input becomes [`FALLBACK_BRAND`].

use crate::error::{Result, RollbackError};
use lazy_static::lazy_static;
use std::collections::{BTreeSet, HashMap};

pub const FALLBACK_BRAND: &str = "Sem Brand";

/// Brand values treated as missing. Narrower than the text-column sentinels:
/// anything else is a brand of its own.
const BRAND_SENTINELS: [&str; 2] = ["nan", "none"];

lazy_static! {
    static ref DEFAULT_ALIASES: Vec<(&'static str, &'static str)> = vec![
        ("7k", "7K"),
        ("7kbet", "7K"),
        ("7kbetbr", "7K"),
        ("cassino", "Cassino"),
        ("cassinobet", "Cassino"),
        ("cassinobetbr", "Cassino"),
        ("vera", "Vera"),
        ("verabet", "Vera"),
        ("verabetbr", "Vera"),
    ];
}

fn is_brand_sentinel(lowered: &str) -> bool {
    BRAND_SENTINELS.contains(&lowered)
}

#[derive(Debug, Clone)]
pub struct BrandClassifier {
    aliases: HashMap<String, String>,
}

impl Default for BrandClassifier {
    fn default() -> Self {
        let mut classifier = Self {
            aliases: HashMap::new(),
        };
        for (alias, label) in DEFAULT_ALIASES.iter() {
            classifier.insert_alias(alias, label);
        }
        classifier.insert_alias(FALLBACK_BRAND, FALLBACK_BRAND);
        classifier
    }
}

impl BrandClassifier {
    /// Built-in aliases plus `extra` (alias, canonical label) pairs.
    ///
    /// Extra entries win over built-in aliases. A label that matches an
    /// existing label case-insensitively reuses that label's spelling. Blank
    /// entries and aliases that would re-map an existing canonical label are
    /// rejected.
    pub fn with_aliases<I, A, L>(extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, L)>,
        A: AsRef<str>,
        L: AsRef<str>,
    {
        let mut classifier = Self::default();
        for (alias, label) in extra {
            classifier.add_extra_alias(alias.as_ref(), label.as_ref())?;
        }
        Ok(classifier)
    }

    fn add_extra_alias(&mut self, alias: &str, label: &str) -> Result<()> {
        let key = alias.trim().to_lowercase();
        let label = label.trim();
        if key.is_empty() || label.is_empty() || is_brand_sentinel(&label.to_lowercase()) {
            return Err(RollbackError::Config(format!(
                "brand alias entries must not be blank or null-like (alias '{}', label '{}')",
                alias, label
            )));
        }

        let label = self
            .aliases
            .get(&label.to_lowercase())
            .cloned()
            .unwrap_or_else(|| label.to_string());

        if let Some(existing) = self.aliases.get(&key) {
            if existing.to_lowercase() == key && *existing != label {
                return Err(RollbackError::Config(format!(
                    "alias '{}' is the canonical brand '{}' and cannot map to '{}'",
                    alias.trim(),
                    existing,
                    label
                )));
            }
        }

        self.insert_alias(&key, &label);
        Ok(())
    }

    /// Every canonical label also resolves to itself, so classification is
    /// idempotent. The self entry never replaces an existing alias.
    fn insert_alias(&mut self, alias: &str, label: &str) {
        let label = label.trim().to_string();
        self.aliases
            .insert(alias.trim().to_lowercase(), label.clone());
        self.aliases.entry(label.to_lowercase()).or_insert(label);
    }

    pub fn classify(&self, raw: Option<&str>) -> String {
        let lowered = match raw {
            Some(value) => value.trim().to_lowercase(),
            None => return FALLBACK_BRAND.to_string(),
        };

        if lowered.is_empty() || is_brand_sentinel(&lowered) {
            return FALLBACK_BRAND.to_string();
        }

        match self.aliases.get(&lowered) {
            Some(label) => label.clone(),
            None => lowered,
        }
    }

    pub fn canonical_labels(&self) -> BTreeSet<&str> {
        self.aliases.values().map(String::as_str).collect()
    }
}
