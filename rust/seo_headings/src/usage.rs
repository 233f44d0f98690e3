use std::collections::BTreeMap;

use crate::paragraph::HeadingLevel;

/// Per-document tally of promotions, keyed by keyword and heading level.
///
/// A counter lives for exactly one transform; create a fresh one for each
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageCounter {
    quota: u32,
    counts: BTreeMap<(String, HeadingLevel), u32>,
}

impl UsageCounter {
    pub fn new(quota: u32) -> Self {
        Self {
            quota,
            counts: BTreeMap::new(),
        }
    }

    pub fn count(&self, keyword: &str, level: HeadingLevel) -> u32 {
        self.counts
            .get(&(keyword.to_string(), level))
            .copied()
            .unwrap_or(0)
    }

    /// Record one promotion if `keyword` still has room at `level`.
    pub fn try_consume(&mut self, keyword: &str, level: HeadingLevel) -> bool {
        let slot = self.counts.entry((keyword.to_string(), level)).or_insert(0);
        if *slot >= self.quota {
            return false;
        }
        *slot += 1;
        true
    }

    pub fn total(&self, keyword: &str) -> u32 {
        HeadingLevel::ALL
            .iter()
            .map(|&level| self.count(keyword, level))
            .sum()
    }
}
