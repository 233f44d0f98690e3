//! Promote SEO keywords found in Word document paragraphs to HTML headings.
//!
//! A run reads the body paragraphs of a `.docx`, decides for each paragraph
//! which keyword occurrences become headings (bounded by a per-keyword,
//! per-level quota) and renders a right-to-left HTML document around them.

mod error;
mod escape;
mod matcher;
mod usage;

pub mod docx;
pub mod keywords;
pub mod paragraph;
pub mod policy;
pub mod render;
pub mod transform;
pub mod verify;

pub use error::{Error, Result};
pub use escape::escape_html;
pub use keywords::{Keyword, KeywordSet, Tier};
pub use matcher::Matcher;
pub use paragraph::{AnnotatedParagraph, Fragment, HeadingLevel, Paragraph, Promotion};
pub use policy::{Markup, MatchPolicy, Policy, PromotionMode};
pub use transform::{
    process_docx, transform_paragraphs, DocxOutput, KeywordUsage, Options, Output, Report,
    Transform,
};
pub use usage::UsageCounter;
