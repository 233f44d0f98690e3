use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::keywords::{Keyword, Tier};
use crate::paragraph::HeadingLevel;

pub const DEFAULT_QUOTA: u32 = 6;
pub const DEFAULT_MIN_HEADINGS: u32 = 3;

const LIGHT_SECONDARY_LEVELS: [HeadingLevel; 2] = [HeadingLevel::H2, HeadingLevel::H3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Case-insensitive, bounded by word boundaries on both sides.
    #[default]
    WholeWord,
    /// Case-sensitive literal match anywhere in the text.
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionMode {
    /// At most one promotion per paragraph; secondaries only when no primary was promoted.
    #[default]
    SingleHeading,
    /// Every keyword may promote one occurrence per paragraph.
    InlineSpans,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Markup {
    /// `<hN>` elements inside a block wrapper.
    #[default]
    Heading,
    /// `<mark class="kw-hN">` spans inside the paragraph.
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    pub match_policy: MatchPolicy,
    pub mode: PromotionMode,
    /// Promotions allowed per keyword per heading level.
    pub quota: u32,
    /// Headings each keyword should reach; only reported.
    pub min_headings: u32,
    pub primary_levels: Vec<HeadingLevel>,
    pub secondary_levels: Vec<HeadingLevel>,
    /// Secondary keywords with fewer words than this prefer H2 over H3.
    pub weight_threshold: Option<usize>,
    pub markup: Markup,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::default(),
            mode: PromotionMode::default(),
            quota: DEFAULT_QUOTA,
            min_headings: DEFAULT_MIN_HEADINGS,
            primary_levels: vec![HeadingLevel::H2, HeadingLevel::H3],
            secondary_levels: vec![HeadingLevel::H3, HeadingLevel::H2],
            weight_threshold: None,
            markup: Markup::default(),
        }
    }
}

impl Policy {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Heading levels to try for `keyword`, most preferred first.
    pub fn levels_for(&self, keyword: &Keyword) -> &[HeadingLevel] {
        match keyword.tier() {
            Tier::Primary => self.primary_levels.as_slice(),
            Tier::Secondary => match self.weight_threshold {
                Some(threshold) if keyword.weight() < threshold => &LIGHT_SECONDARY_LEVELS[..],
                _ => self.secondary_levels.as_slice(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let policy = Policy::from_json("{}").unwrap();
        assert_eq!(policy, Policy::default());
        assert_eq!(policy.quota, 6);
        assert_eq!(policy.min_headings, 3);
    }

    #[test]
    fn parses_partial_policy() {
        let policy = Policy::from_json(
            r#"{"match_policy":"substring","mode":"inline_spans","quota":2,"primary_levels":["h1","h2","h3"],"markup":"highlight"}"#,
        )
        .unwrap();
        assert_eq!(policy.match_policy, MatchPolicy::Substring);
        assert_eq!(policy.mode, PromotionMode::InlineSpans);
        assert_eq!(policy.quota, 2);
        assert_eq!(policy.primary_levels, HeadingLevel::ALL.to_vec());
        assert_eq!(policy.secondary_levels, vec![HeadingLevel::H3, HeadingLevel::H2]);
        assert_eq!(policy.markup, Markup::Highlight);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(Policy::from_json(r#"{"quota":1,"colour":"red"}"#).is_err());
    }

    #[test]
    fn weight_threshold_reorders_short_secondary_keywords() {
        let policy = Policy {
            weight_threshold: Some(3),
            ..Policy::default()
        };
        let short = Keyword::new("cloud storage", Tier::Secondary);
        let long = Keyword::new("secure cloud storage plans", Tier::Secondary);
        let primary = Keyword::new("cloud", Tier::Primary);
        assert_eq!(policy.levels_for(&short), &[HeadingLevel::H2, HeadingLevel::H3]);
        assert_eq!(policy.levels_for(&long), &[HeadingLevel::H3, HeadingLevel::H2]);
        assert_eq!(policy.levels_for(&primary), &[HeadingLevel::H2, HeadingLevel::H3]);
    }
}
