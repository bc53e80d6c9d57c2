//! Document Model: ordered sections, per-section content, styling.
//!
//! A `Document` is an ordered sequence of `SectionRef`s plus a map from
//! section id to `SectionContent`. Sequence order is the only source of
//! layout order. Invariants maintained by the reducer:
//!
//! - Section ids are unique within a document.
//! - Every `SectionRef` has a matching `content` entry and vice versa.
//! - The `header` section is never removed.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Section identity
// ────────────────────────────────────────────────────────────────────────────

/// Section kind tag. Closed set; the renderer matches exhaustively on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    Summary,
    Experience,
    Projects,
    Skills,
    Testimonials,
    Gallery,
    Faq,
    LineBreak,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Header => "header",
            SectionKind::Summary => "summary",
            SectionKind::Experience => "experience",
            SectionKind::Projects => "projects",
            SectionKind::Skills => "skills",
            SectionKind::Testimonials => "testimonials",
            SectionKind::Gallery => "gallery",
            SectionKind::Faq => "faq",
            SectionKind::LineBreak => "line_break",
        }
    }

    /// List kinds hold an ordered item sequence; the rest hold a title/body
    /// pair (or nothing, for `LineBreak`).
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            SectionKind::Experience
                | SectionKind::Projects
                | SectionKind::Skills
                | SectionKind::Testimonials
                | SectionKind::Gallery
                | SectionKind::Faq
        )
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section id, generated as `{kind}_{unix_millis}`. Unique per document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(raw: impl Into<String>) -> Self {
        SectionId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry in the ordered section sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRef {
    pub id: SectionId,
    pub kind: SectionKind,
}

// ────────────────────────────────────────────────────────────────────────────
// Items
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum ContentError {
    #[error("Unknown field '{0}' for this section kind")]
    UnknownField(String),

    #[error("Section kind does not hold items")]
    NotAList,

    #[error("Item index {index} out of range (len {len})")]
    ItemOutOfRange { index: usize, len: usize },
}

/// Common surface of every item variant: a stable generated id plus
/// by-name field assignment for form edits.
pub trait SectionItem: Sized {
    fn with_id(id: String) -> Self;
    fn id(&self) -> &str;
    /// Returns `false` when the field name is not part of this item's shape.
    fn set_field(&mut self, field: &str, value: &str) -> bool;
}

macro_rules! section_item {
    ($name:ident { $($field:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub id: String,
            $(pub $field: String,)+
        }

        impl SectionItem for $name {
            fn with_id(id: String) -> Self {
                Self { id, ..Default::default() }
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn set_field(&mut self, field: &str, value: &str) -> bool {
                match field {
                    $(stringify!($field) => self.$field = value.to_string(),)+
                    _ => return false,
                }
                true
            }
        }
    };
}

section_item!(ExperienceItem { company, role, date_start, date_end, description });
section_item!(ProjectItem { title, description, image, link });
section_item!(SkillItem { name, level });
section_item!(TestimonialItem { author, role, quote });
section_item!(GalleryItem { image, caption });
section_item!(FaqItem { question, answer });

// ────────────────────────────────────────────────────────────────────────────
// Section content
// ────────────────────────────────────────────────────────────────────────────

/// Title/body pair held by text kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub title: String,
    pub body: String,
}

/// Title plus ordered item sequence held by list kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListContent<T> {
    pub title: String,
    pub items: Vec<T>,
}

impl<T> Default for ListContent<T> {
    fn default() -> Self {
        ListContent {
            title: String::new(),
            items: Vec::new(),
        }
    }
}

impl<T: SectionItem> ListContent<T> {
    /// Appends a blank item with a fresh id. Wall clocks repeat, so the
    /// millisecond component is bumped until the id is unique in this list.
    fn push_default(&mut self, now_ms: i64) {
        let mut ms = now_ms;
        let mut id = format!("item_{ms}");
        while self.items.iter().any(|i| i.id() == id) {
            ms += 1;
            id = format!("item_{ms}");
        }
        self.items.push(T::with_id(id));
    }

    fn edit(&mut self, index: usize, field: &str, value: &str) -> Result<(), ContentError> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(ContentError::ItemOutOfRange { index, len })?;
        if !item.set_field(field, value) {
            return Err(ContentError::UnknownField(field.to_string()));
        }
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<(), ContentError> {
        if index >= self.items.len() {
            return Err(ContentError::ItemOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.items.remove(index);
        Ok(())
    }
}

/// Per-section content, keyed by the section's kind tag. Closed tagged
/// variant, one renderer function per variant, checked exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionContent {
    Header(TextContent),
    Summary(TextContent),
    Experience(ListContent<ExperienceItem>),
    Projects(ListContent<ProjectItem>),
    Skills(ListContent<SkillItem>),
    Testimonials(ListContent<TestimonialItem>),
    Gallery(ListContent<GalleryItem>),
    Faq(ListContent<FaqItem>),
    LineBreak,
}

macro_rules! for_each_list {
    ($self:ident, $c:ident => $body:expr, $otherwise:expr) => {
        match $self {
            SectionContent::Experience($c) => $body,
            SectionContent::Projects($c) => $body,
            SectionContent::Skills($c) => $body,
            SectionContent::Testimonials($c) => $body,
            SectionContent::Gallery($c) => $body,
            SectionContent::Faq($c) => $body,
            _ => $otherwise,
        }
    };
}

impl SectionContent {
    /// Default (empty) content for a freshly added section of `kind`.
    pub fn default_for(kind: SectionKind) -> SectionContent {
        match kind {
            SectionKind::Header => SectionContent::Header(TextContent::default()),
            SectionKind::Summary => SectionContent::Summary(TextContent::default()),
            SectionKind::Experience => SectionContent::Experience(ListContent::default()),
            SectionKind::Projects => SectionContent::Projects(ListContent::default()),
            SectionKind::Skills => SectionContent::Skills(ListContent::default()),
            SectionKind::Testimonials => SectionContent::Testimonials(ListContent::default()),
            SectionKind::Gallery => SectionContent::Gallery(ListContent::default()),
            SectionKind::Faq => SectionContent::Faq(ListContent::default()),
            SectionKind::LineBreak => SectionContent::LineBreak,
        }
    }

    pub fn kind(&self) -> SectionKind {
        match self {
            SectionContent::Header(_) => SectionKind::Header,
            SectionContent::Summary(_) => SectionKind::Summary,
            SectionContent::Experience(_) => SectionKind::Experience,
            SectionContent::Projects(_) => SectionKind::Projects,
            SectionContent::Skills(_) => SectionKind::Skills,
            SectionContent::Testimonials(_) => SectionKind::Testimonials,
            SectionContent::Gallery(_) => SectionKind::Gallery,
            SectionContent::Faq(_) => SectionKind::Faq,
            SectionContent::LineBreak => SectionKind::LineBreak,
        }
    }

    /// Section-level field edit: `title`/`body` on text kinds, `title` on
    /// list kinds. `LineBreak` has no editable fields.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), ContentError> {
        match self {
            SectionContent::Header(t) | SectionContent::Summary(t) => match field {
                "title" => t.title = value.to_string(),
                "body" => t.body = value.to_string(),
                _ => return Err(ContentError::UnknownField(field.to_string())),
            },
            SectionContent::LineBreak => {
                return Err(ContentError::UnknownField(field.to_string()))
            }
            list => {
                if field != "title" {
                    return Err(ContentError::UnknownField(field.to_string()));
                }
                for_each_list!(list, c => c.title = value.to_string(), unreachable!());
            }
        }
        Ok(())
    }

    pub fn add_item(&mut self, now_ms: i64) -> Result<(), ContentError> {
        for_each_list!(self, c => Ok(c.push_default(now_ms)), Err(ContentError::NotAList))
    }

    pub fn edit_item(
        &mut self,
        index: usize,
        field: &str,
        value: &str,
    ) -> Result<(), ContentError> {
        for_each_list!(self, c => c.edit(index, field, value), Err(ContentError::NotAList))
    }

    pub fn remove_item(&mut self, index: usize) -> Result<(), ContentError> {
        for_each_list!(self, c => c.remove(index), Err(ContentError::NotAList))
    }

    pub fn item_count(&self) -> usize {
        for_each_list!(self, c => c.items.len(), 0)
    }

    /// True when the section has no required content: an empty item list for
    /// list kinds, a blank title and body for text kinds. The read-only
    /// renderer suppresses empty sections; the editable renderer never does.
    pub fn is_empty(&self) -> bool {
        match self {
            SectionContent::Header(t) | SectionContent::Summary(t) => {
                t.title.trim().is_empty() && t.body.trim().is_empty()
            }
            SectionContent::LineBreak => false,
            list => for_each_list!(list, c => c.items.is_empty(), unreachable!()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Styling
// ────────────────────────────────────────────────────────────────────────────

/// Flat style options applied to the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub template: String,
    pub font_family: String,
    pub accent_color: String,
    pub background_color: String,
    pub background_image: Option<String>,
}

impl Default for StyleRecord {
    fn default() -> Self {
        StyleRecord {
            template: "classic".to_string(),
            font_family: "Inter".to_string(),
            accent_color: "#1a73e8".to_string(),
            background_color: "#ffffff".to_string(),
            background_image: None,
        }
    }
}

impl StyleRecord {
    /// Style-option assignment by name, driven by the `SetStyle` intent.
    pub fn set_option(&mut self, option: &str, value: &str) -> Result<(), ContentError> {
        match option {
            "template" => self.template = value.to_string(),
            "font_family" => self.font_family = value.to_string(),
            "accent_color" => self.accent_color = value.to_string(),
            "background_color" => self.background_color = value.to_string(),
            "background_image" => {
                self.background_image = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            _ => return Err(ContentError::UnknownField(option.to_string())),
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub is_published: bool,
    /// Ordered section sequence. Order here is render order.
    pub sections: Vec<SectionRef>,
    pub content: BTreeMap<SectionId, SectionContent>,
    pub styling: StyleRecord,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// A minimal document: just the non-removable header section.
    pub fn new(name: impl Into<String>, now_ms: i64) -> Document {
        Self::with_skeleton(name, &[SectionKind::Header], now_ms)
    }

    /// The default resume skeleton created on signup.
    pub fn default_resume(name: impl Into<String>, now_ms: i64) -> Document {
        Self::with_skeleton(
            name,
            &[
                SectionKind::Header,
                SectionKind::Summary,
                SectionKind::Experience,
                SectionKind::Projects,
                SectionKind::Skills,
            ],
            now_ms,
        )
    }

    /// The default portfolio skeleton created on first visit to the editor.
    pub fn default_portfolio(name: impl Into<String>, now_ms: i64) -> Document {
        Self::with_skeleton(
            name,
            &[
                SectionKind::Header,
                SectionKind::Summary,
                SectionKind::Projects,
                SectionKind::Gallery,
            ],
            now_ms,
        )
    }

    pub fn with_skeleton(name: impl Into<String>, kinds: &[SectionKind], now_ms: i64) -> Document {
        let mut doc = Document {
            id: Uuid::new_v4(),
            name: name.into(),
            is_published: false,
            sections: Vec::new(),
            content: BTreeMap::new(),
            styling: StyleRecord::default(),
            updated_at: Utc::now(),
        };
        for kind in kinds {
            let id = doc.generate_section_id(*kind, now_ms);
            doc.content
                .insert(id.clone(), SectionContent::default_for(*kind));
            doc.sections.push(SectionRef { id, kind: *kind });
        }
        doc
    }

    /// Allocates a `{kind}_{millis}` id, bumping the millisecond component
    /// until unique within this document.
    pub fn generate_section_id(&self, kind: SectionKind, now_ms: i64) -> SectionId {
        let mut ms = now_ms;
        loop {
            let candidate = SectionId::new(format!("{}_{ms}", kind.as_str()));
            if !self.content.contains_key(&candidate)
                && !self.sections.iter().any(|s| s.id == candidate)
            {
                return candidate;
            }
            ms += 1;
        }
    }

    pub fn section_index(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| &s.id == id)
    }

    pub fn section_ref(&self, id: &SectionId) -> Option<&SectionRef> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Checks the structural invariants: unique ids and a bijection between
    /// the section sequence and the content map.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (i, s) in self.sections.iter().enumerate() {
            if self.sections[..i].iter().any(|p| p.id == s.id) {
                return Err(format!("duplicate section id {}", s.id));
            }
            match self.content.get(&s.id) {
                None => return Err(format!("section {} has no content entry", s.id)),
                Some(c) if c.kind() != s.kind => {
                    return Err(format!("section {} content kind mismatch", s.id))
                }
                Some(_) => {}
            }
        }
        for id in self.content.keys() {
            if self.section_index(id).is_none() {
                return Err(format!("orphan content entry {id}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_header_only() {
        let doc = Document::new("My Resume", 1_700_000_000_000);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].kind, SectionKind::Header);
        assert!(doc.check_invariants().is_ok());
    }

    #[test]
    fn test_skeleton_ids_unique_at_same_millisecond() {
        // Two sections of the same kind allocated in the same millisecond
        // must still get distinct ids.
        let doc = Document::with_skeleton(
            "p",
            &[SectionKind::Projects, SectionKind::Projects],
            42,
        );
        assert_eq!(doc.sections[0].id.as_str(), "projects_42");
        assert_eq!(doc.sections[1].id.as_str(), "projects_43");
        assert!(doc.check_invariants().is_ok());
    }

    #[test]
    fn test_set_field_on_text_and_list_kinds() {
        let mut header = SectionContent::default_for(SectionKind::Header);
        header.set_field("title", "Ada Lovelace").unwrap();
        header.set_field("body", "Engineer").unwrap();
        assert_eq!(
            header.set_field("company", "x"),
            Err(ContentError::UnknownField("company".to_string()))
        );

        let mut exp = SectionContent::default_for(SectionKind::Experience);
        exp.set_field("title", "Work History").unwrap();
        assert_eq!(
            exp.set_field("body", "x"),
            Err(ContentError::UnknownField("body".to_string()))
        );
    }

    #[test]
    fn test_line_break_has_no_editable_fields() {
        let mut lb = SectionContent::LineBreak;
        assert!(lb.set_field("title", "x").is_err());
        assert_eq!(lb.add_item(0), Err(ContentError::NotAList));
    }

    #[test]
    fn test_item_ids_bump_on_collision() {
        let mut exp = SectionContent::default_for(SectionKind::Experience);
        exp.add_item(7).unwrap();
        exp.add_item(7).unwrap();
        match exp {
            SectionContent::Experience(ref c) => {
                assert_eq!(c.items[0].id, "item_7");
                assert_eq!(c.items[1].id, "item_8");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_edit_item_out_of_range() {
        let mut exp = SectionContent::default_for(SectionKind::Experience);
        assert_eq!(
            exp.edit_item(0, "company", "Acme"),
            Err(ContentError::ItemOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_emptiness_rules() {
        let mut summary = SectionContent::default_for(SectionKind::Summary);
        assert!(summary.is_empty());
        summary.set_field("body", "Hello").unwrap();
        assert!(!summary.is_empty());

        let mut skills = SectionContent::default_for(SectionKind::Skills);
        skills.set_field("title", "Skills").unwrap();
        // A list section with a title but no items is still empty.
        assert!(skills.is_empty());
        skills.add_item(1).unwrap();
        assert!(!skills.is_empty());

        assert!(!SectionContent::LineBreak.is_empty());
    }

    #[test]
    fn test_style_record_options() {
        let mut style = StyleRecord::default();
        style.set_option("accent_color", "#ff0000").unwrap();
        assert_eq!(style.accent_color, "#ff0000");
        style.set_option("background_image", "https://x/bg.png").unwrap();
        assert_eq!(style.background_image.as_deref(), Some("https://x/bg.png"));
        style.set_option("background_image", "").unwrap();
        assert_eq!(style.background_image, None);
        assert!(style.set_option("margin", "2").is_err());
    }

    #[test]
    fn test_document_serde_round_trip() {
        let mut doc = Document::default_resume("r", 1_000);
        let id = doc.sections[2].id.clone();
        doc.content
            .get_mut(&id)
            .unwrap()
            .set_field("title", "Work History")
            .unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }
}
