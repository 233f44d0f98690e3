use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::{Error, Result};

fn find_body(node: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &node.data {
        if name.local.to_string().eq_ignore_ascii_case("body") {
            return Some(node.clone());
        }
    }
    for child in node.children.borrow().iter() {
        if let Some(body) = find_body(child) {
            return Some(body);
        }
    }
    None
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// Visible text of each top-level block inside `<body>`, as a browser would parse it.
pub fn block_texts(html: &str) -> Vec<String> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let Some(body) = find_body(&dom.document) else {
        return Vec::new();
    };

    let texts: Vec<String> = body
        .children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .map(|child| {
            let mut text = String::new();
            collect_text(child, &mut text);
            text
        })
        .collect();
    texts
}

fn normalize_newlines(s: &str) -> String {
    // The HTML parser folds CR and CRLF into LF.
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Check that every block of `html` carries exactly the expected paragraph text.
pub fn check_content<S: AsRef<str>>(html: &str, expected: &[S]) -> Result<()> {
    let found = block_texts(html);
    for (index, want) in expected.iter().enumerate() {
        let want = normalize_newlines(want.as_ref());
        let got = found.get(index).cloned().unwrap_or_default();
        if got != want {
            return Err(Error::ContentMismatch {
                index,
                expected: want,
                found: got,
            });
        }
    }
    if found.len() > expected.len() {
        return Err(Error::ContentMismatch {
            index: expected.len(),
            expected: String::new(),
            found: found[expected.len()].clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::Tier;
    use crate::paragraph::{AnnotatedParagraph, HeadingLevel};
    use crate::policy::Markup;
    use crate::render::{render_document, DEFAULT_TITLE};

    #[test]
    fn reads_back_block_text_through_markup_and_entities() {
        let p = AnnotatedParagraph::from_spans(
            "AI & <ML> today".to_string(),
            &[(0..2, HeadingLevel::H2, Tier::Primary)],
        );
        let html = render_document(&[p, AnnotatedParagraph::plain("x")], Markup::Heading, DEFAULT_TITLE);
        assert_eq!(block_texts(&html), vec!["AI & <ML> today".to_string(), "x".to_string()]);
        check_content(&html, &["AI & <ML> today", "x"]).unwrap();
    }

    #[test]
    fn reports_first_mismatching_paragraph() {
        let html = "<!DOCTYPE html><html><body><p>one</p><p>tw0</p></body></html>";
        let err = check_content(html, &["one", "two"]).unwrap_err();
        match err {
            Error::ContentMismatch { index, found, .. } => {
                assert_eq!(index, 1);
                assert_eq!(found, "tw0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extra_blocks_are_a_mismatch() {
        let html = "<html><body><p>one</p><p>two</p></body></html>";
        assert!(check_content(html, &["one"]).is_err());
    }

    #[test]
    fn injected_script_text_stays_text() {
        let html = render_document(&[AnnotatedParagraph::plain("<script>alert(1)</script>")], Markup::Heading, DEFAULT_TITLE);
        check_content(&html, &["<script>alert(1)</script>"]).unwrap();
    }
}
