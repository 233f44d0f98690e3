use serde::Serialize;
use tracing::{info, warn};

use crate::docx;
use crate::error::{Error, Result};
use crate::keywords::{KeywordSet, Tier};
use crate::matcher::Matcher;
use crate::paragraph::{normalize_paragraphs, AnnotatedParagraph, HeadingLevel, Paragraph};
use crate::policy::Policy;
use crate::render::{self, DEFAULT_TITLE};
use crate::usage::UsageCounter;
use crate::verify;

/// What the docx artifact of a run contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocxOutput {
    /// The input bytes, unchanged.
    #[default]
    PassThrough,
    /// A new document with keyword heading paragraphs before each promoted paragraph.
    Restructured,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub policy: Policy,
    pub docx_output: DocxOutput,
    /// Render headings from paragraph style names and skip keyword matching.
    pub use_styles: bool,
    pub title: String,
    /// Re-parse the rendered html and compare its text with the source paragraphs.
    pub verify: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            docx_output: DocxOutput::default(),
            use_styles: false,
            title: DEFAULT_TITLE.to_string(),
            verify: false,
        }
    }
}

/// Result of running the allocator over one document.
#[derive(Debug, Clone)]
pub struct Transform {
    pub paragraphs: Vec<AnnotatedParagraph>,
    pub usage: UsageCounter,
}

/// Annotate already-normalized paragraphs with a fresh usage counter.
pub fn transform_paragraphs(
    paragraphs: &[Paragraph],
    keywords: &KeywordSet,
    policy: &Policy,
) -> Result<Transform> {
    let matcher = Matcher::new(keywords, policy.match_policy)?;
    let mut usage = UsageCounter::new(policy.quota);
    let paragraphs = paragraphs
        .iter()
        .map(|p| matcher.allocate(&p.text, &mut usage, policy))
        .collect();
    Ok(Transform { paragraphs, usage })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordUsage {
    pub keyword: String,
    pub tier: Tier,
    pub h1: u32,
    pub h2: u32,
    pub h3: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub paragraphs_read: usize,
    pub paragraphs_rendered: usize,
    pub promoted_paragraphs: usize,
    pub keywords: Vec<KeywordUsage>,
    /// Keywords that ended below the minimum heading target.
    pub below_target: Vec<String>,
}

impl Report {
    fn build(read: usize, transform: &Transform, keywords: &KeywordSet, policy: &Policy) -> Self {
        let usage = &transform.usage;
        let entries: Vec<KeywordUsage> = keywords
            .iter()
            .map(|k| KeywordUsage {
                keyword: k.text().to_string(),
                tier: k.tier(),
                h1: usage.count(k.text(), HeadingLevel::H1),
                h2: usage.count(k.text(), HeadingLevel::H2),
                h3: usage.count(k.text(), HeadingLevel::H3),
                total: usage.total(k.text()),
            })
            .collect();
        let below_target = entries
            .iter()
            .filter(|e| e.total < policy.min_headings)
            .map(|e| e.keyword.clone())
            .collect();

        Self {
            paragraphs_read: read,
            paragraphs_rendered: transform.paragraphs.len(),
            promoted_paragraphs: transform.paragraphs.iter().filter(|p| p.is_promoted()).count(),
            keywords: entries,
            below_target,
        }
    }
}

/// Everything one run hands back to the caller.
#[derive(Debug, Clone)]
pub struct Output {
    pub html: String,
    pub docx: Vec<u8>,
    pub report: Report,
}

/// Transform paragraphs that were already read from a document.
///
/// Returns the html, the annotated paragraphs (empty on the style path) and
/// the report.
pub fn render_paragraphs(
    raw: Vec<Paragraph>,
    keywords: &KeywordSet,
    options: &Options,
) -> Result<(String, Vec<AnnotatedParagraph>, Report)> {
    let read = raw.len();
    let paragraphs = normalize_paragraphs(raw);

    let (html, annotated, report) = if options.use_styles {
        let html = render::render_styled_document(&paragraphs, &options.title);
        let report = Report {
            paragraphs_read: read,
            paragraphs_rendered: paragraphs.len(),
            ..Report::default()
        };
        (html, Vec::new(), report)
    } else {
        let transform = transform_paragraphs(&paragraphs, keywords, &options.policy)?;
        let html = render::render_document(&transform.paragraphs, options.policy.markup, &options.title);
        let report = Report::build(read, &transform, keywords, &options.policy);
        (html, transform.paragraphs, report)
    };

    if options.verify {
        let expected: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
        verify::check_content(&html, &expected)?;
    }

    info!(
        read = report.paragraphs_read,
        rendered = report.paragraphs_rendered,
        promoted = report.promoted_paragraphs,
        "document transformed"
    );
    if !keywords.is_empty() && !options.use_styles {
        for keyword in &report.below_target {
            warn!(keyword = %keyword, min_headings = options.policy.min_headings, "keyword below heading target");
        }
    }

    Ok((html, annotated, report))
}

/// Read a `.docx`, promote keywords and produce the html and docx artifacts.
///
/// Nothing is returned unless every step succeeds.
pub fn process_docx(bytes: &[u8], keywords: &KeywordSet, options: &Options) -> Result<Output> {
    if options.use_styles && options.docx_output == DocxOutput::Restructured {
        return Err(Error::Options(
            "restructured docx output needs keyword annotations and cannot be combined with style-based rendering",
        ));
    }

    let raw = docx::read_paragraphs(bytes)?;
    let (html, annotated, report) = render_paragraphs(raw, keywords, options)?;

    let docx = match options.docx_output {
        DocxOutput::PassThrough => bytes.to_vec(),
        DocxOutput::Restructured => docx::write_docx(&docx::restructure(&annotated))?,
    };

    Ok(Output { html, docx, report })
}
