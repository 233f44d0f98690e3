use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::escape::escape_html;
use crate::paragraph::{AnnotatedParagraph, HeadingLevel, Paragraph};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Map paragraph style ids (`Heading1`) to their display names (`heading 1`).
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:style" => {
                current_id = attr_value(&e, b"w:styleId")?;
            }
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"w:name" => {
                if let (Some(id), Some(name)) = (&current_id, attr_value(&e, b"w:val")?) {
                    names.insert(id.clone(), name);
                }
            }
            Event::End(e) if e.name().as_ref() == b"w:style" => current_id = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(names)
}

/// Body paragraphs of `word/document.xml`, untrimmed, with raw style ids.
fn parse_paragraphs(xml: &str) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = Paragraph::default();

    let mut paragraph_depth = 0usize;
    let mut table_depth = 0usize;
    let mut run_depth = 0usize;
    // Text box content (`w:txbxContent`) and its VML copy under
    // `mc:Fallback` are not part of the paragraph's own text.
    let mut skip_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        current = Paragraph::default();
                    }
                }
                b"w:tbl" => table_depth += 1,
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                b"mc:Fallback" | b"w:txbxContent" => skip_depth += 1,
                b"w:pStyle" if paragraph_depth == 1 => current.style = attr_value(&e, b"w:val")?,
                _ => {}
            },
            Event::Empty(e) => {
                let inside_run = paragraph_depth > 0 && run_depth > 0 && skip_depth == 0;
                match e.name().as_ref() {
                    b"w:p" if paragraph_depth == 0 && table_depth == 0 => {
                        paragraphs.push(Paragraph::default());
                    }
                    b"w:pStyle" if paragraph_depth == 1 => {
                        current.style = attr_value(&e, b"w:val")?;
                    }
                    b"w:tab" | b"w:ptab" if inside_run => current.text.push('\t'),
                    b"w:noBreakHyphen" if inside_run => current.text.push('-'),
                    b"w:br" | b"w:cr" if inside_run => current.text.push('\n'),
                    _ => {}
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                    if paragraph_depth == 0 && table_depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"mc:Fallback" | b"w:txbxContent" => skip_depth = skip_depth.saturating_sub(1),
                _ => {}
            },
            Event::Text(t) if in_text && paragraph_depth > 0 && skip_depth == 0 => {
                current.text.push_str(&t.unescape()?);
            }
            Event::CData(c) if in_text && paragraph_depth > 0 && skip_depth == 0 => {
                current.text.push_str(&String::from_utf8_lossy(&c));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Read the body paragraphs of a `.docx` file.
///
/// Style ids are resolved to style names through `word/styles.xml` when the
/// archive has one. Paragraphs inside tables are not part of the body text.
pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<Paragraph>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let document = read_part(&mut archive, DOCUMENT_PART)?.ok_or(Error::MissingPart(DOCUMENT_PART))?;
    let styles = match read_part(&mut archive, STYLES_PART)? {
        Some(xml) => parse_style_names(&xml)?,
        None => HashMap::new(),
    };

    let mut paragraphs = parse_paragraphs(&document)?;
    for p in &mut paragraphs {
        if let Some(id) = p.style.take() {
            p.style = Some(styles.get(&id).cloned().unwrap_or(id));
        }
    }
    Ok(paragraphs)
}

/// A paragraph of a restructured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    Heading { level: HeadingLevel, text: &'a str },
    Body(&'a str),
}

/// Lay annotated paragraphs out as heading paragraphs (one per promoted
/// keyword) followed by the original text as a body paragraph.
pub fn restructure(paragraphs: &[AnnotatedParagraph]) -> Vec<Block<'_>> {
    let mut blocks = Vec::with_capacity(paragraphs.len() * 2);
    for p in paragraphs {
        for promotion in p.promotions() {
            blocks.push(Block::Heading {
                level: promotion.level,
                text: promotion.text,
            });
        }
        blocks.push(Block::Body(p.text()));
    }
    blocks
}

fn push_runs(body: &mut String, text: &str) {
    // Tabs and line breaks are elements in WordprocessingML, not characters.
    let mut chunk = String::new();
    let flush = |body: &mut String, chunk: &mut String| {
        if !chunk.is_empty() {
            body.push_str(r#"<w:r><w:rPr><w:rtl/></w:rPr><w:t xml:space="preserve">"#);
            body.push_str(&escape_html(chunk));
            body.push_str("</w:t></w:r>");
            chunk.clear();
        }
    };
    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(body, &mut chunk);
                body.push_str("<w:r><w:tab/></w:r>");
            }
            '\n' => {
                flush(body, &mut chunk);
                body.push_str("<w:r><w:br/></w:r>");
            }
            '\r' => {}
            _ => chunk.push(ch),
        }
    }
    flush(body, &mut chunk);
}

fn build_document_xml(blocks: &[Block<'_>]) -> String {
    let mut body = String::new();
    for block in blocks {
        body.push_str("<w:p>");
        match block {
            Block::Heading { level, text } => {
                body.push_str(&format!(
                    r#"<w:pPr><w:pStyle w:val="Heading{}"/><w:bidi/></w:pPr>"#,
                    level.number()
                ));
                push_runs(&mut body, text);
            }
            Block::Body(text) => {
                body.push_str("<w:pPr><w:bidi/></w:pPr>");
                push_runs(&mut body, text);
            }
        }
        body.push_str("</w:p>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
 xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    {body}
    <w:sectPr>
      <w:pgSz w:w="12240" w:h="15840"/>
      <w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>
      <w:bidi/>
    </w:sectPr>
  </w:body>
</w:document>"#
    )
}

// Minimal OPC package: content types, the package relationship to the main
// document, and the document's relationship to its styles part.
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_RELS_PART: &str = "_rels/.rels";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

fn heading_style_xml(level: HeadingLevel) -> String {
    let (before, after, size) = match level {
        HeadingLevel::H1 => (240, 120, 32),
        HeadingLevel::H2 => (200, 100, 28),
        HeadingLevel::H3 => (160, 80, 24),
    };
    let n = level.number();
    format!(
        r#"  <w:style w:type="paragraph" w:styleId="Heading{n}">
    <w:name w:val="heading {n}"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr>
      <w:spacing w:before="{before}" w:after="{after}"/>
      <w:keepNext/>
      <w:keepLines/>
      <w:outlineLvl w:val="{outline}"/>
    </w:pPr>
    <w:rPr>
      <w:b/>
      <w:sz w:val="{size}"/>
      <w:szCs w:val="{size}"/>
    </w:rPr>
  </w:style>
"#,
        outline = n - 1,
    )
}

fn styles_xml() -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
    <w:pPr>
      <w:bidi/>
    </w:pPr>
  </w:style>
"#,
    );
    for level in HeadingLevel::ALL {
        out.push_str(&heading_style_xml(level));
    }
    out.push_str("</w:styles>");
    out
}

/// Serialize blocks into a complete `.docx` archive held in memory.
pub fn write_docx(blocks: &[Block<'_>]) -> Result<Vec<u8>> {
    let document_xml = build_document_xml(blocks);
    let styles = styles_xml();
    let parts: [(&str, &str); 5] = [
        (CONTENT_TYPES_PART, CONTENT_TYPES_XML),
        (PACKAGE_RELS_PART, PACKAGE_RELS_XML),
        (DOCUMENT_PART, &document_xml),
        (DOCUMENT_RELS_PART, DOCUMENT_RELS_XML),
        (STYLES_PART, &styles),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opt = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, xml) in parts {
        zip.start_file(name, opt)?;
        zip.write_all(xml.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
