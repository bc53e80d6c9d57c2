//! Renderer: maps each section's content variant to an HTML template.
//!
//! Two modes: `Editable` (form controls annotated with `data-section` /
//! `data-field` so the client can raise reducer intents) and `ReadOnly`
//! (plain display for public share pages). The two renderings are visually
//! consistent except for input affordances. Sections with empty required
//! content are suppressed in read-only mode but always shown in editable
//! mode so the owner can fill them in.

mod sections;

use crate::document::model::{Document, SectionContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Editable,
    ReadOnly,
}

/// Renders the full document as a standalone HTML page, styling applied
/// from the document's `StyleRecord`.
pub fn render_document(doc: &Document, mode: RenderMode) -> String {
    let mut body = String::new();
    for section in &doc.sections {
        // Transient drag states aside, every ref has content; skip rather
        // than panic if a stale ref slips through.
        let Some(content) = doc.content.get(&section.id) else {
            continue;
        };
        if mode == RenderMode::ReadOnly && content.is_empty() {
            continue;
        }
        body.push_str(&render_section(section.id.as_str(), content, mode));
    }

    let style = &doc.styling;
    let background = match &style.background_image {
        Some(url) => format!(
            "background-color:{};background-image:url('{}')",
            escape_html(&style.background_color),
            escape_html(url)
        ),
        None => format!("background-color:{}", escape_html(&style.background_color)),
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>body{{font-family:'{font}',sans-serif;{background}}}\
         h2{{color:{accent}}}.folio-doc{{max-width:48rem;margin:0 auto;padding:2rem}}</style>\n\
         </head>\n<body class=\"template-{template}\">\n<main class=\"folio-doc\">\n{body}</main>\n</body>\n</html>\n",
        title = escape_html(&doc.name),
        font = escape_html(&style.font_family),
        accent = escape_html(&style.accent_color),
        template = escape_html(&style.template),
        background = background,
        body = body,
    )
}

/// One section. Exhaustive over the content variants; adding a kind without
/// a template is a compile error.
fn render_section(id: &str, content: &SectionContent, mode: RenderMode) -> String {
    let inner = match content {
        SectionContent::Header(t) => sections::header(id, t, mode),
        SectionContent::Summary(t) => sections::summary(id, t, mode),
        SectionContent::Experience(c) => sections::experience(id, c, mode),
        SectionContent::Projects(c) => sections::projects(id, c, mode),
        SectionContent::Skills(c) => sections::skills(id, c, mode),
        SectionContent::Testimonials(c) => sections::testimonials(id, c, mode),
        SectionContent::Gallery(c) => sections::gallery(id, c, mode),
        SectionContent::Faq(c) => sections::faq(id, c, mode),
        SectionContent::LineBreak => sections::line_break(),
    };
    format!(
        "<section class=\"section section-{kind}\" data-section=\"{id}\">\n{inner}</section>\n",
        kind = content.kind(),
        id = escape_html(id),
    )
}

/// Minimal HTML escaping for user-controlled text.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::SectionKind;
    use crate::document::reducer::{self, Intent};

    fn make_doc() -> Document {
        Document::default_resume("Jo's Resume", 1_000)
    }

    #[test]
    fn test_read_only_suppresses_empty_sections() {
        let doc = make_doc();
        // Everything in a fresh skeleton is empty, so the page
        // body carries no sections at all.
        let html = render_document(&doc, RenderMode::ReadOnly);
        assert!(!html.contains("<section"));

        let editable = render_document(&doc, RenderMode::Editable);
        assert!(editable.contains("section-header"));
        assert!(editable.contains("section-experience"));
    }

    #[test]
    fn test_read_only_shows_filled_sections() {
        let mut doc = make_doc();
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
        let html = render_document(&doc, RenderMode::ReadOnly);
        assert!(html.contains("Jo Doe"));
        assert!(html.contains("section-header"));
        // Still-empty sections stay suppressed.
        assert!(!html.contains("section-experience"));
    }

    #[test]
    fn test_editable_mode_carries_form_affordances() {
        let doc = make_doc();
        let html = render_document(&doc, RenderMode::Editable);
        assert!(html.contains("data-field=\"title\""));
        assert!(html.contains("<input"));
        let read_only = render_document(&doc, RenderMode::ReadOnly);
        assert!(!read_only.contains("<input"));
    }

    #[test]
    fn test_user_content_is_escaped() {
        let mut doc = make_doc();
        let header = doc.sections[0].id.clone();
        reducer::apply(
            &mut doc,
            &Intent::EditSectionField {
                id: header,
                field: "title".to_string(),
                value: "<script>alert(1)</script>".to_string(),
            },
            0,
        )
        .unwrap();
        let html = render_document(&doc, RenderMode::ReadOnly);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_line_break_renders_in_both_modes() {
        let mut doc = make_doc();
        reducer::apply(
            &mut doc,
            &Intent::AddSection {
                kind: SectionKind::LineBreak,
                after: None,
            },
            2_000,
        )
        .unwrap();
        for mode in [RenderMode::Editable, RenderMode::ReadOnly] {
            assert!(render_document(&doc, mode).contains("section-line_break"));
        }
    }

    #[test]
    fn test_styling_flows_into_the_page() {
        let mut doc = make_doc();
        reducer::apply(
            &mut doc,
            &Intent::SetStyle {
                option: "accent_color".to_string(),
                value: "#00ff00".to_string(),
            },
            0,
        )
        .unwrap();
        let html = render_document(&doc, RenderMode::Editable);
        assert!(html.contains("#00ff00"));
        assert!(html.contains("template-classic"));
    }
}
