use crate::escape::escape_html;
use crate::keywords::Tier;
use crate::paragraph::{AnnotatedParagraph, Fragment, HeadingLevel, Paragraph};
use crate::policy::Markup;

pub const DEFAULT_TITLE: &str = "SEO Optimized Document";

fn style_block() -> &'static str {
    // Promoted headings sit inside running text, so they stay inline there.
    r#"<style>
        body { direction: rtl; text-align: right; font-family: Tahoma, Arial, sans-serif; line-height: 1.7; }
        .kw-block { margin: 0 0 1em 0; }
        .kw-block h1, .kw-block h2, .kw-block h3 { display: inline; margin: 0; font-size: 1.1em; }
        h1, mark.kw-h1 { color: #b71c1c; }
        h2, mark.kw-h2 { color: #0d47a1; }
        h3, mark.kw-h3 { color: #1b5e20; }
        mark { background: #fff8c4; padding: 0 2px; }
        .kw-primary { font-weight: bold; }
    </style>"#
}

fn tier_class(tier: Tier) -> &'static str {
    match tier {
        Tier::Primary => "kw-primary",
        Tier::Secondary => "kw-secondary",
    }
}

fn push_promoted(out: &mut String, text: &str, level: HeadingLevel, tier: Tier, markup: Markup) {
    let escaped = escape_html(text);
    match markup {
        Markup::Heading => {
            let tag = level.tag();
            out.push_str(&format!("<{tag} class=\"{}\">{escaped}</{tag}>", tier_class(tier)));
        }
        Markup::Highlight => {
            out.push_str(&format!(
                "<mark class=\"kw-{} {}\">{escaped}</mark>",
                level.tag(),
                tier_class(tier)
            ));
        }
    }
}

/// Render one annotated paragraph as a single block element.
pub fn render_paragraph(paragraph: &AnnotatedParagraph, markup: Markup) -> String {
    let mut inner = String::with_capacity(paragraph.text().len() + 32);
    for fragment in paragraph.fragments() {
        let text = paragraph.slice(fragment);
        match fragment {
            Fragment::Plain(_) => inner.push_str(&escape_html(text)),
            Fragment::Promoted { level, tier, .. } => {
                push_promoted(&mut inner, text, *level, *tier, markup)
            }
        }
    }

    // Headings are not allowed inside <p>, so promoted paragraphs get a <div>.
    if paragraph.is_promoted() && markup == Markup::Heading {
        format!("<div dir=\"rtl\" class=\"kw-block\">{inner}</div>")
    } else {
        format!("<p dir=\"rtl\">{inner}</p>")
    }
}

/// Heading level encoded in a Word style name such as `Heading 2`,
/// `heading 2` or the style id `Heading2`.
pub fn heading_level_for_style(style: &str) -> Option<u8> {
    let lower = style.trim().to_ascii_lowercase();
    let rest = lower.strip_prefix("heading")?.trim_start();
    let level: u8 = rest.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Render paragraphs whose heading structure already lives in their style names.
pub fn render_styled_paragraph(paragraph: &Paragraph) -> String {
    let text = escape_html(&paragraph.text);
    match paragraph.style.as_deref().and_then(heading_level_for_style) {
        Some(n) => format!("<h{n} dir=\"rtl\">{text}</h{n}>"),
        None => format!("<p dir=\"rtl\">{text}</p>"),
    }
}

pub fn render_document(paragraphs: &[AnnotatedParagraph], markup: Markup, title: &str) -> String {
    let body: Vec<String> = paragraphs
        .iter()
        .map(|p| render_paragraph(p, markup))
        .collect();
    wrap_document(title, &body.join("\n"))
}

pub fn render_styled_document(paragraphs: &[Paragraph], title: &str) -> String {
    let body: Vec<String> = paragraphs.iter().map(render_styled_paragraph).collect();
    wrap_document(title, &body.join("\n"))
}

fn wrap_document(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    {style}
</head>
<body>
{body}
</body>
</html>"#,
        title = escape_html(title),
        style = style_block(),
    )
}
