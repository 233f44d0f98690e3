use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::keywords::{Keyword, KeywordSet, Tier};
use crate::paragraph::{AnnotatedParagraph, HeadingLevel};
use crate::policy::{MatchPolicy, Policy, PromotionMode};
use crate::usage::UsageCounter;

/// Same notion of a word character as the `\b` the pattern will use.
fn is_word_char(c: char) -> bool {
    static WORD: OnceLock<Regex> = OnceLock::new();
    let word = WORD.get_or_init(|| Regex::new(r"^\w$").expect("word class pattern is valid"));
    let mut buf = [0u8; 4];
    word.is_match(c.encode_utf8(&mut buf))
}

fn compile(text: &str, policy: MatchPolicy) -> std::result::Result<Regex, regex::Error> {
    let escaped = regex::escape(text);
    match policy {
        MatchPolicy::Substring => Regex::new(&escaped),
        MatchPolicy::WholeWord => {
            // `\b` only makes sense next to a word character; "C++" must still
            // be able to match before a space.
            let lead = if text.chars().next().is_some_and(is_word_char) {
                r"\b"
            } else {
                ""
            };
            let tail = if text.chars().last().is_some_and(is_word_char) {
                r"\b"
            } else {
                ""
            };
            RegexBuilder::new(&format!("{lead}{escaped}{tail}"))
                .case_insensitive(true)
                .build()
        }
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

#[derive(Debug)]
struct Entry {
    keyword: Keyword,
    pattern: Regex,
}

/// Compiled keyword patterns for one transform.
#[derive(Debug)]
pub struct Matcher {
    entries: Vec<Entry>,
}

impl Matcher {
    pub fn new(keywords: &KeywordSet, policy: MatchPolicy) -> Result<Self> {
        let entries = keywords
            .iter()
            .map(|keyword| {
                let pattern = compile(keyword.text(), policy).map_err(|source| Error::Pattern {
                    keyword: keyword.text().to_string(),
                    source,
                })?;
                Ok(Entry {
                    keyword: keyword.clone(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// First occurrence of the entry's keyword that avoids every consumed span.
    fn find_free(entry: &Entry, text: &str, consumed: &[Range<usize>]) -> Option<Range<usize>> {
        let mut at = 0usize;
        while at <= text.len() {
            let found = entry.pattern.find_at(text, at)?;
            let range = found.range();
            if !consumed.iter().any(|c| overlaps(c, &range)) {
                return Some(range);
            }
            let step = text[range.start..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            at = range.start + step;
        }
        None
    }

    /// Decide which keyword occurrences of `text` get promoted and at which level.
    ///
    /// `usage` carries the quota bookkeeping across all paragraphs of a document.
    pub fn allocate(&self, text: &str, usage: &mut UsageCounter, policy: &Policy) -> AnnotatedParagraph {
        let mut spans: Vec<(Range<usize>, HeadingLevel, Tier)> = Vec::new();

        for entry in &self.entries {
            if policy.mode == PromotionMode::SingleHeading && !spans.is_empty() {
                break;
            }

            let consumed: Vec<Range<usize>> = spans.iter().map(|(r, _, _)| r.clone()).collect();
            let Some(range) = Self::find_free(entry, text, &consumed) else {
                continue;
            };

            let keyword = entry.keyword.text();
            let level = policy
                .levels_for(&entry.keyword)
                .iter()
                .copied()
                .find(|&level| usage.try_consume(keyword, level));
            let Some(level) = level else {
                debug!(keyword, "quota exhausted at every level");
                continue;
            };

            debug!(keyword, level = level.tag(), start = range.start, "promoted");
            spans.push((range, level, entry.keyword.tier()));
        }

        spans.sort_by_key(|(range, _, _)| range.start);
        AnnotatedParagraph::from_spans(text.to_string(), &spans)
    }
}
