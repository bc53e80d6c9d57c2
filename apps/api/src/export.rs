//! PDF export: flattens a document to text lines, paginates them to US
//! letter, and builds the PDF. Stateless leaf operation: nothing here
//! touches the store or the session.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

use crate::document::model::{Document, SectionContent};
use crate::errors::AppError;

// US letter, 1" margins, body text at 11pt.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;

/// Weight of one flattened line. Drives font size and line height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Name,
    SectionTitle,
    Body,
    Blank,
}

impl LineKind {
    fn font_size(&self) -> f32 {
        match self {
            LineKind::Name => 18.0,
            LineKind::SectionTitle => 13.0,
            LineKind::Body | LineKind::Blank => 11.0,
        }
    }

    fn line_height(&self) -> f32 {
        self.font_size() * 1.3
    }

    /// Rough average glyph width for wrapping; Helvetica body glyphs
    /// average just over half an em.
    fn max_chars(&self) -> usize {
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        (usable / (self.font_size() * 0.55)) as usize
    }
}

#[derive(Debug, Clone)]
struct Line {
    kind: LineKind,
    text: String,
}

impl Line {
    fn body(text: impl Into<String>) -> Line {
        Line {
            kind: LineKind::Body,
            text: text.into(),
        }
    }

    fn blank() -> Line {
        Line {
            kind: LineKind::Blank,
            text: String::new(),
        }
    }
}

/// Renders the document's PDF bytes.
pub fn export_pdf(doc: &Document) -> Result<Vec<u8>, AppError> {
    let lines = flatten(doc);
    let pages = paginate(&lines);
    build_pdf(&pages).map_err(|e| AppError::Internal(anyhow::anyhow!("pdf build failed: {e}")))
}

/// Flattens sections in render order into wrapped text lines. Empty
/// sections are skipped; the export mirrors the read-only view.
fn flatten(doc: &Document) -> Vec<Line> {
    let mut lines = Vec::new();
    for section in &doc.sections {
        let Some(content) = doc.content.get(&section.id) else {
            continue;
        };
        if content.is_empty() {
            continue;
        }
        match content {
            SectionContent::Header(t) => {
                push_wrapped(&mut lines, LineKind::Name, &t.title);
                push_wrapped(&mut lines, LineKind::Body, &t.body);
            }
            SectionContent::Summary(t) => {
                push_wrapped(&mut lines, LineKind::SectionTitle, &t.title);
                push_wrapped(&mut lines, LineKind::Body, &t.body);
            }
            SectionContent::Experience(c) => {
                push_wrapped(&mut lines, LineKind::SectionTitle, &c.title);
                for item in &c.items {
                    let heading = join_nonempty(&[
                        &item.role,
                        &item.company,
                        &join_nonempty(&[&item.date_start, &item.date_end], "-"),
                    ], ", ");
                    push_wrapped(&mut lines, LineKind::Body, &heading);
                    push_wrapped(&mut lines, LineKind::Body, &item.description);
                }
            }
            SectionContent::Projects(c) => {
                push_wrapped(&mut lines, LineKind::SectionTitle, &c.title);
                for item in &c.items {
                    push_wrapped(
                        &mut lines,
                        LineKind::Body,
                        &join_nonempty(&[&item.title, &item.link], " - "),
                    );
                    push_wrapped(&mut lines, LineKind::Body, &item.description);
                }
            }
            SectionContent::Skills(c) => {
                push_wrapped(&mut lines, LineKind::SectionTitle, &c.title);
                let joined = c
                    .items
                    .iter()
                    .map(|i| join_nonempty(&[&i.name, &i.level], " "))
                    .collect::<Vec<_>>()
                    .join(", ");
                push_wrapped(&mut lines, LineKind::Body, &joined);
            }
            SectionContent::Testimonials(c) => {
                push_wrapped(&mut lines, LineKind::SectionTitle, &c.title);
                for item in &c.items {
                    push_wrapped(&mut lines, LineKind::Body, &format!("\"{}\"", item.quote));
                    push_wrapped(
                        &mut lines,
                        LineKind::Body,
                        &join_nonempty(&[&item.author, &item.role], ", "),
                    );
                }
            }
            SectionContent::Gallery(c) => {
                push_wrapped(&mut lines, LineKind::SectionTitle, &c.title);
                for item in &c.items {
                    push_wrapped(&mut lines, LineKind::Body, &item.caption);
                }
            }
            SectionContent::Faq(c) => {
                push_wrapped(&mut lines, LineKind::SectionTitle, &c.title);
                for item in &c.items {
                    push_wrapped(&mut lines, LineKind::Body, &item.question);
                    push_wrapped(&mut lines, LineKind::Body, &item.answer);
                }
            }
            SectionContent::LineBreak => {}
        }
        lines.push(Line::blank());
    }
    while lines.last().map(|l| l.kind) == Some(LineKind::Blank) {
        lines.pop();
    }
    lines
}

fn push_wrapped(lines: &mut Vec<Line>, kind: LineKind, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    for wrapped in wrap(text.trim(), kind.max_chars()) {
        lines.push(Line {
            kind,
            text: wrapped,
        });
    }
}

fn join_nonempty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Greedy word wrap; a single overlong word gets a line of its own rather
/// than being split mid-word.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Splits lines into pages by accumulated line height against the usable
/// page height.
fn paginate(lines: &[Line]) -> Vec<Vec<Line>> {
    let usable = PAGE_HEIGHT - 2.0 * MARGIN;
    let mut pages: Vec<Vec<Line>> = Vec::new();
    let mut current: Vec<Line> = Vec::new();
    let mut used = 0.0_f32;

    for line in lines {
        let height = line.kind.line_height();
        if used + height > usable && !current.is_empty() {
            pages.push(std::mem::take(&mut current));
            used = 0.0;
            // No leading blank after a page break.
            if line.kind == LineKind::Blank {
                continue;
            }
        }
        used += height;
        current.push(line.clone());
    }
    if !current.is_empty() {
        pages.push(current);
    }
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

fn build_pdf(pages: &[Vec<Line>]) -> Result<Vec<u8>, lopdf::Error> {
    let mut pdf = lopdf::Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
            "F2" => bold_id,
        },
    });

    let mut page_ids: Vec<Object> = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        let mut y = PAGE_HEIGHT - MARGIN;
        for line in page {
            y -= line.kind.line_height();
            if line.kind == LineKind::Blank {
                continue;
            }
            let font = match line.kind {
                LineKind::Name | LineKind::SectionTitle => "F2",
                _ => "F1",
            };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![font.into(), line.kind.font_size().into()],
            ));
            operations.push(Operation::new("Td", vec![MARGIN.into(), y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.text.as_str())],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());
    }

    let count = page_ids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                PAGE_WIDTH.into(),
                PAGE_HEIGHT.into(),
            ],
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.compress();

    let mut buffer = Vec::new();
    pdf.save_to(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::SectionKind;
    use crate::document::reducer::{self, Intent};

    fn make_doc() -> Document {
        let mut doc = Document::default_resume("r", 1_000);
        let header = doc.sections[0].id.clone();
        reducer::apply(
            &mut doc,
            &Intent::EditSectionField {
                id: header,
                field: "title".to_string(),
                value: "Jo Doe".to_string(),
            },
            0,
        )
        .unwrap();
        doc
    }

    #[test]
    fn test_wrap_respects_max_chars() {
        let lines = wrap("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        for line in &lines {
            assert!(line.chars().count() <= 9);
        }
    }

    #[test]
    fn test_wrap_keeps_overlong_word_whole() {
        let lines = wrap("a superlongunbreakableword b", 10);
        assert_eq!(lines[1], "superlongunbreakableword");
    }

    #[test]
    fn test_flatten_skips_empty_sections() {
        let doc = make_doc();
        let lines = flatten(&doc);
        assert!(lines.iter().any(|l| l.text == "Jo Doe"));
        // The empty experience/projects/skills sections contribute nothing.
        assert!(!lines.iter().any(|l| l.kind == LineKind::SectionTitle));
    }

    #[test]
    fn test_paginate_splits_on_page_capacity() {
        // 45 body lines fit one page (45 * 14.3 < 648); 60 do not.
        let short: Vec<Line> = (0..45).map(|i| Line::body(format!("l{i}"))).collect();
        assert_eq!(paginate(&short).len(), 1);

        let long: Vec<Line> = (0..60).map(|i| Line::body(format!("l{i}"))).collect();
        let pages = paginate(&long);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len() + pages[1].len(), 60);
    }

    #[test]
    fn test_export_produces_pdf_bytes() {
        let bytes = export_pdf(&make_doc()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert!(bytes.len() > 200);
    }

    #[test]
    fn test_export_of_empty_document_still_yields_a_page() {
        let doc = Document::with_skeleton("blank", &[SectionKind::LineBreak], 1_000);
        let bytes = export_pdf(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
