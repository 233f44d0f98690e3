use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::keywords::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub const ALL: [HeadingLevel; 3] = [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3];

    pub fn tag(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
        }
    }

    pub fn number(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

/// One paragraph as read from the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    /// Resolved style name (e.g. `heading 2`), when the document declares one.
    pub style: Option<String>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn with_style(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Some(style.into()),
        }
    }
}

/// Trim every paragraph and drop the ones left empty.
pub fn normalize_paragraphs<I>(paragraphs: I) -> Vec<Paragraph>
where
    I: IntoIterator<Item = Paragraph>,
{
    paragraphs
        .into_iter()
        .filter_map(|p| {
            let text = p.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(Paragraph {
                text: text.to_string(),
                style: p.style,
            })
        })
        .collect()
}

/// A byte range of a paragraph, either left as text or promoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Plain(Range<usize>),
    Promoted {
        range: Range<usize>,
        level: HeadingLevel,
        tier: Tier,
    },
}

impl Fragment {
    pub fn range(&self) -> &Range<usize> {
        match self {
            Fragment::Plain(range) | Fragment::Promoted { range, .. } => range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedParagraph {
    text: String,
    fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion<'a> {
    pub text: &'a str,
    pub level: HeadingLevel,
    pub tier: Tier,
}

impl AnnotatedParagraph {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let fragments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Fragment::Plain(0..text.len())]
        };
        Self { text, fragments }
    }

    /// Build from promoted spans sorted by start; gaps become plain fragments.
    pub(crate) fn from_spans(
        text: String,
        spans: &[(Range<usize>, HeadingLevel, Tier)],
    ) -> Self {
        let mut fragments = Vec::with_capacity(spans.len() * 2 + 1);
        let mut cursor = 0usize;
        for (range, level, tier) in spans {
            if range.start > cursor {
                fragments.push(Fragment::Plain(cursor..range.start));
            }
            fragments.push(Fragment::Promoted {
                range: range.clone(),
                level: *level,
                tier: *tier,
            });
            cursor = range.end;
        }
        if cursor < text.len() {
            fragments.push(Fragment::Plain(cursor..text.len()));
        }
        Self { text, fragments }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn slice(&self, fragment: &Fragment) -> &str {
        &self.text[fragment.range().clone()]
    }

    pub fn is_promoted(&self) -> bool {
        self.fragments
            .iter()
            .any(|f| matches!(f, Fragment::Promoted { .. }))
    }

    pub fn promotions(&self) -> impl Iterator<Item = Promotion<'_>> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Promoted { range, level, tier } => Some(Promotion {
                text: &self.text[range.clone()],
                level: *level,
                tier: *tier,
            }),
            Fragment::Plain(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_drops_blank_paragraphs() {
        let out = normalize_paragraphs(vec![
            Paragraph::new("  first  "),
            Paragraph::new(" \t\n"),
            Paragraph::new(""),
            Paragraph::with_style("second", "heading 1"),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "first");
        assert_eq!(out[1].style.as_deref(), Some("heading 1"));
    }

    #[test]
    fn spans_fill_gaps_with_plain_fragments() {
        let text = "alpha beta gamma".to_string();
        let p = AnnotatedParagraph::from_spans(
            text,
            &[(6..10, HeadingLevel::H2, Tier::Primary)],
        );
        let pieces: Vec<&str> = p.fragments().iter().map(|f| p.slice(f)).collect();
        assert_eq!(pieces, vec!["alpha ", "beta", " gamma"]);
        assert_eq!(pieces.concat(), p.text());
        let promoted: Vec<_> = p.promotions().collect();
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].text, "beta");
    }

    #[test]
    fn span_covering_whole_text_leaves_no_plain_fragment() {
        let p = AnnotatedParagraph::from_spans(
            "AI".to_string(),
            &[(0..2, HeadingLevel::H3, Tier::Secondary)],
        );
        assert_eq!(p.fragments().len(), 1);
        assert!(p.is_promoted());
    }
}
