use serde::Serialize;
use std::collections::HashSet;

use crate::policy::MatchPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    text: String,
    tier: Tier,
}

impl Keyword {
    pub fn new(text: impl Into<String>, tier: Tier) -> Self {
        Self {
            text: text.into(),
            tier,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Number of words in the keyword.
    pub fn weight(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Primary and secondary keywords in priority order, trimmed and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    primary: Vec<Keyword>,
    secondary: Vec<Keyword>,
}

fn match_key(text: &str, policy: MatchPolicy) -> String {
    match policy {
        MatchPolicy::WholeWord => text.to_lowercase(),
        MatchPolicy::Substring => text.to_string(),
    }
}

impl KeywordSet {
    /// Duplicates are judged by what `policy` would match, so under
    /// whole-word matching `AI` and `ai` are one keyword. The first
    /// spelling wins, and a keyword listed in both tiers stays primary.
    pub fn new<P, S>(primary: P, secondary: S, policy: MatchPolicy) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut collect = |items: Vec<String>, tier: Tier| -> Vec<Keyword> {
            items
                .into_iter()
                .filter(|text| seen.insert(match_key(text, policy)))
                .map(|text| Keyword::new(text, tier))
                .collect()
        };

        let primary = collect(clean(primary), Tier::Primary);
        let secondary = collect(clean(secondary), Tier::Secondary);
        Self { primary, secondary }
    }

    /// One keyword per line, as typed into a text area.
    pub fn from_lines(primary: &str, secondary: &str, policy: MatchPolicy) -> Self {
        Self::new(primary.lines(), secondary.lines(), policy)
    }

    pub fn primary(&self) -> &[Keyword] {
        &self.primary
    }

    pub fn secondary(&self) -> &[Keyword] {
        &self.secondary
    }

    /// All keywords, primary tier first.
    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.primary.iter().chain(self.secondary.iter())
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

fn clean<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(keywords: &[Keyword]) -> Vec<&str> {
        keywords.iter().map(Keyword::text).collect()
    }

    #[test]
    fn parses_lines_and_skips_blank_entries() {
        let set = KeywordSet::from_lines(
            "  AI \n\n machine learning\r\n",
            "\n  \ncloud\n",
            MatchPolicy::WholeWord,
        );
        assert_eq!(texts(set.primary()), vec!["AI", "machine learning"]);
        assert_eq!(texts(set.secondary()), vec!["cloud"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn dedupes_case_insensitively_under_whole_word() {
        let set = KeywordSet::new(["AI", "ai", "Data"], ["data", "cloud", "AI"], MatchPolicy::WholeWord);
        assert_eq!(texts(set.primary()), vec!["AI", "Data"]);
        assert_eq!(texts(set.secondary()), vec!["cloud"]);
    }

    #[test]
    fn substring_policy_keeps_case_variants_apart() {
        let set = KeywordSet::new(["AI", "ai", "AI"], Vec::<String>::new(), MatchPolicy::Substring);
        assert_eq!(texts(set.primary()), vec!["AI", "ai"]);
        assert!(set.secondary().is_empty());
    }

    #[test]
    fn iterates_primary_before_secondary() {
        let set = KeywordSet::new(["b"], ["a"], MatchPolicy::WholeWord);
        let tiers: Vec<Tier> = set.iter().map(Keyword::tier).collect();
        assert_eq!(tiers, vec![Tier::Primary, Tier::Secondary]);
    }

    #[test]
    fn weight_counts_words() {
        assert_eq!(Keyword::new("cloud", Tier::Secondary).weight(), 1);
        assert_eq!(Keyword::new("cloud  storage plans", Tier::Secondary).weight(), 3);
    }

    #[test]
    fn empty_lists_are_empty() {
        assert!(KeywordSet::from_lines("", " \n ", MatchPolicy::WholeWord).is_empty());
    }
}
