//! Editor Reducer: pure state transitions on the Document Model.
//!
//! Every user gesture in the editor (drag end, form edit, button click) is
//! expressed as one `Intent`. `apply` validates the intent against the
//! current model, then mutates in place. No transition may leave `sections`
//! referencing an id absent from `content`, duplicate an id, or orphan a
//! content entry.
//!
//! ## Intent semantics
//!
//! ### AddSection
//! - Fresh `{kind}_{millis}` id, default content for the kind.
//! - Inserted immediately after `after`'s current index; appended when
//!   `after` is absent or does not resolve (drop on empty canvas space).
//!
//! ### ReorderSection
//! - Both ids must already exist and differ, otherwise a no-op.
//! - Array-move: remove at the source index, insert at the target's
//!   pre-removal index.
//!
//! ### RemoveSection
//! - Removing the header is always a no-op.
//! - Deletes both the section ref and its content entry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::model::{ContentError, Document, SectionContent, SectionId, SectionKind, SectionRef};

/// A discrete user intent against one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Intent {
    AddSection {
        kind: SectionKind,
        /// Insert after this section; append when absent or unresolved.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after: Option<SectionId>,
    },
    ReorderSection {
        source: SectionId,
        target: SectionId,
    },
    RemoveSection {
        id: SectionId,
    },
    EditSectionField {
        id: SectionId,
        field: String,
        value: String,
    },
    AddItem {
        section: SectionId,
    },
    EditItem {
        section: SectionId,
        index: usize,
        field: String,
        value: String,
    },
    RemoveItem {
        section: SectionId,
        index: usize,
    },
    SetStyle {
        option: String,
        value: String,
    },
}

/// Outcome of a successfully validated intent. `Noop` means the model is
/// unchanged and the persistence bridge must not be armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    Noop,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReduceError {
    #[error("Section not found: {0}")]
    SectionNotFound(SectionId),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Applies one intent to the document. Pure with respect to I/O; `now_ms`
/// feeds id generation so transitions stay deterministic under test.
pub fn apply(doc: &mut Document, intent: &Intent, now_ms: i64) -> Result<Applied, ReduceError> {
    match intent {
        Intent::AddSection { kind, after } => {
            let id = doc.generate_section_id(*kind, now_ms);
            let position = after
                .as_ref()
                .and_then(|target| doc.section_index(target))
                .map(|i| i + 1)
                .unwrap_or(doc.sections.len());
            doc.content
                .insert(id.clone(), SectionContent::default_for(*kind));
            doc.sections.insert(position, SectionRef { id, kind: *kind });
            Ok(Applied::Changed)
        }

        Intent::ReorderSection { source, target } => {
            let (from, to) = match (doc.section_index(source), doc.section_index(target)) {
                (Some(f), Some(t)) => (f, t),
                // Dropping onto a non-canvas target (or a stale id) is a no-op.
                _ => return Ok(Applied::Noop),
            };
            if from == to {
                return Ok(Applied::Noop);
            }
            let moved = doc.sections.remove(from);
            doc.sections.insert(to, moved);
            Ok(Applied::Changed)
        }

        Intent::RemoveSection { id } => {
            let index = doc
                .section_index(id)
                .ok_or_else(|| ReduceError::SectionNotFound(id.clone()))?;
            // The header section is non-removable regardless of model state.
            if doc.sections[index].kind == SectionKind::Header {
                return Ok(Applied::Noop);
            }
            doc.sections.remove(index);
            doc.content.remove(id);
            Ok(Applied::Changed)
        }

        Intent::EditSectionField { id, field, value } => {
            let content = doc
                .content
                .get_mut(id)
                .ok_or_else(|| ReduceError::SectionNotFound(id.clone()))?;
            content.set_field(field, value)?;
            Ok(Applied::Changed)
        }

        Intent::AddItem { section } => {
            let content = doc
                .content
                .get_mut(section)
                .ok_or_else(|| ReduceError::SectionNotFound(section.clone()))?;
            content.add_item(now_ms)?;
            Ok(Applied::Changed)
        }

        Intent::EditItem {
            section,
            index,
            field,
            value,
        } => {
            let content = doc
                .content
                .get_mut(section)
                .ok_or_else(|| ReduceError::SectionNotFound(section.clone()))?;
            content.edit_item(*index, field, value)?;
            Ok(Applied::Changed)
        }

        Intent::RemoveItem { section, index } => {
            let content = doc
                .content
                .get_mut(section)
                .ok_or_else(|| ReduceError::SectionNotFound(section.clone()))?;
            content.remove_item(*index)?;
            Ok(Applied::Changed)
        }

        Intent::SetStyle { option, value } => {
            doc.styling.set_option(option, value)?;
            Ok(Applied::Changed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc() -> Document {
        Document::new("test", 1_000)
    }

    fn header_id(doc: &Document) -> SectionId {
        doc.sections[0].id.clone()
    }

    fn add(doc: &mut Document, kind: SectionKind, after: Option<SectionId>, now_ms: i64) -> SectionId {
        apply(doc, &Intent::AddSection { kind, after }, now_ms).unwrap();
        doc.sections
            .iter()
            .map(|s| s.id.clone())
            .find(|id| doc.content.contains_key(id) && id.as_str().starts_with(kind.as_str()))
            .unwrap()
    }

    // ── AddSection ──────────────────────────────────────────────────────────

    #[test]
    fn test_add_section_appends_without_target() {
        let mut doc = make_doc();
        apply(
            &mut doc,
            &Intent::AddSection {
                kind: SectionKind::Experience,
                after: None,
            },
            2_000,
        )
        .unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[1].id.as_str(), "experience_2000");
        assert!(doc.content.contains_key(&doc.sections[1].id));
        doc.check_invariants().unwrap();
    }

    #[test]
    fn test_add_section_inserts_after_target() {
        let mut doc = make_doc();
        let header = header_id(&doc);
        add(&mut doc, SectionKind::Skills, None, 2_000);
        // Insert after the header (index 0) → new section lands at index 1,
        // skills shifts right to index 2.
        apply(
            &mut doc,
            &Intent::AddSection {
                kind: SectionKind::Summary,
                after: Some(header),
            },
            3_000,
        )
        .unwrap();
        let kinds: Vec<SectionKind> = doc.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::Header, SectionKind::Summary, SectionKind::Skills]
        );
        doc.check_invariants().unwrap();
    }

    #[test]
    fn test_add_section_appends_when_target_unresolved() {
        let mut doc = make_doc();
        apply(
            &mut doc,
            &Intent::AddSection {
                kind: SectionKind::Faq,
                after: Some(SectionId::new("gone_1")),
            },
            2_000,
        )
        .unwrap();
        assert_eq!(doc.sections.last().unwrap().kind, SectionKind::Faq);
    }

    #[test]
    fn test_add_same_kind_twice_in_same_millisecond() {
        let mut doc = make_doc();
        let add_faq = Intent::AddSection {
            kind: SectionKind::Faq,
            after: None,
        };
        apply(&mut doc, &add_faq, 2_000).unwrap();
        apply(&mut doc, &add_faq, 2_000).unwrap();
        assert_eq!(doc.sections[1].id.as_str(), "faq_2000");
        assert_eq!(doc.sections[2].id.as_str(), "faq_2001");
        doc.check_invariants().unwrap();
    }

    // ── ReorderSection ──────────────────────────────────────────────────────

    #[test]
    fn test_reorder_moves_source_to_target_index() {
        let mut doc = Document::with_skeleton(
            "t",
            &[
                SectionKind::Header,
                SectionKind::Summary,
                SectionKind::Experience,
                SectionKind::Skills,
            ],
            1_000,
        );
        let skills = doc.sections[3].id.clone();
        let summary = doc.sections[1].id.clone();
        apply(
            &mut doc,
            &Intent::ReorderSection {
                source: skills,
                target: summary,
            },
            0,
        )
        .unwrap();
        let kinds: Vec<SectionKind> = doc.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Header,
                SectionKind::Skills,
                SectionKind::Summary,
                SectionKind::Experience,
            ]
        );
        doc.check_invariants().unwrap();
    }

    #[test]
    fn test_reorder_downward_uses_pre_removal_target_index() {
        let mut doc = Document::with_skeleton(
            "t",
            &[SectionKind::Header, SectionKind::Summary, SectionKind::Skills],
            1_000,
        );
        let summary = doc.sections[1].id.clone();
        let skills = doc.sections[2].id.clone();
        apply(
            &mut doc,
            &Intent::ReorderSection {
                source: summary,
                target: skills,
            },
            0,
        )
        .unwrap();
        let kinds: Vec<SectionKind> = doc.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::Header, SectionKind::Skills, SectionKind::Summary]
        );
    }

    #[test]
    fn test_reorder_to_self_is_noop() {
        let mut doc = make_doc();
        let header = header_id(&doc);
        let before = doc.clone();
        let applied = apply(
            &mut doc,
            &Intent::ReorderSection {
                source: header.clone(),
                target: header,
            },
            0,
        )
        .unwrap();
        assert_eq!(applied, Applied::Noop);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_reorder_with_unknown_id_is_noop() {
        let mut doc = make_doc();
        let header = header_id(&doc);
        let before = doc.clone();
        let applied = apply(
            &mut doc,
            &Intent::ReorderSection {
                source: header,
                target: SectionId::new("ghost_9"),
            },
            0,
        )
        .unwrap();
        assert_eq!(applied, Applied::Noop);
        assert_eq!(doc, before);
    }

    // ── RemoveSection ───────────────────────────────────────────────────────

    #[test]
    fn test_remove_header_is_noop() {
        let mut doc = Document::default_resume("t", 1_000);
        let header = header_id(&doc);
        let before = doc.clone();
        let applied = apply(&mut doc, &Intent::RemoveSection { id: header }, 0).unwrap();
        assert_eq!(applied, Applied::Noop);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_remove_unknown_section_is_error() {
        let mut doc = make_doc();
        let err = apply(
            &mut doc,
            &Intent::RemoveSection {
                id: SectionId::new("ghost_9"),
            },
            0,
        )
        .unwrap_err();
        assert_eq!(err, ReduceError::SectionNotFound(SectionId::new("ghost_9")));
    }

    // ── Items ───────────────────────────────────────────────────────────────

    #[test]
    fn test_item_lifecycle() {
        let mut doc = make_doc();
        let exp = add(&mut doc, SectionKind::Experience, None, 2_000);
        apply(&mut doc, &Intent::AddItem { section: exp.clone() }, 5).unwrap();
        apply(
            &mut doc,
            &Intent::EditItem {
                section: exp.clone(),
                index: 0,
                field: "company".to_string(),
                value: "Acme".to_string(),
            },
            0,
        )
        .unwrap();
        match doc.content.get(&exp).unwrap() {
            SectionContent::Experience(c) => assert_eq!(c.items[0].company, "Acme"),
            _ => unreachable!(),
        }
        apply(
            &mut doc,
            &Intent::RemoveItem {
                section: exp.clone(),
                index: 0,
            },
            0,
        )
        .unwrap();
        assert_eq!(doc.content.get(&exp).unwrap().item_count(), 0);
    }

    #[test]
    fn test_edit_item_unknown_field_is_error() {
        let mut doc = make_doc();
        let exp = add(&mut doc, SectionKind::Experience, None, 2_000);
        apply(&mut doc, &Intent::AddItem { section: exp.clone() }, 5).unwrap();
        let err = apply(
            &mut doc,
            &Intent::EditItem {
                section: exp,
                index: 0,
                field: "salary".to_string(),
                value: "1".to_string(),
            },
            0,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReduceError::Content(ContentError::UnknownField("salary".to_string()))
        );
    }

    // ── Invariants over sequences ───────────────────────────────────────────

    #[test]
    fn test_invariants_hold_over_mixed_sequences() {
        let mut doc = make_doc();
        let header = header_id(&doc);
        let mut now = 2_000;
        for kind in [
            SectionKind::Summary,
            SectionKind::Experience,
            SectionKind::Projects,
            SectionKind::LineBreak,
            SectionKind::Faq,
        ] {
            apply(
                &mut doc,
                &Intent::AddSection {
                    kind,
                    after: Some(header.clone()),
                },
                now,
            )
            .unwrap();
            now += 1;
            doc.check_invariants().unwrap();
        }
        let faq = doc.sections[1].id.clone();
        let last = doc.sections.last().unwrap().id.clone();
        apply(
            &mut doc,
            &Intent::ReorderSection {
                source: faq.clone(),
                target: last,
            },
            0,
        )
        .unwrap();
        doc.check_invariants().unwrap();
        apply(&mut doc, &Intent::RemoveSection { id: faq }, 0).unwrap();
        doc.check_invariants().unwrap();
    }

    // ── End-to-end scenario ─────────────────────────────────────────────────

    #[test]
    fn test_end_to_end_scenario() {
        // Start with the default single-section document {header}.
        let mut doc = make_doc();
        let header = header_id(&doc);
        apply(
            &mut doc,
            &Intent::AddSection {
                kind: SectionKind::Experience,
                after: Some(header),
            },
            2_000,
        )
        .unwrap();
        let exp = doc.sections[1].id.clone();
        assert_eq!(exp.as_str(), "experience_2000");
        assert_eq!(doc.sections.len(), 2);

        apply(
            &mut doc,
            &Intent::EditSectionField {
                id: exp.clone(),
                field: "title".to_string(),
                value: "Work History".to_string(),
            },
            0,
        )
        .unwrap();
        match doc.content.get(&exp).unwrap() {
            SectionContent::Experience(c) => assert_eq!(c.title, "Work History"),
            _ => unreachable!(),
        }

        apply(&mut doc, &Intent::RemoveSection { id: exp.clone() }, 0).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].kind, SectionKind::Header);
        assert!(!doc.content.contains_key(&exp));
        doc.check_invariants().unwrap();
    }

    #[test]
    fn test_intent_serde_shape() {
        let intent: Intent = serde_json::from_str(
            r#"{"op":"edit_section_field","id":"summary_1","field":"body","value":"hi"}"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            Intent::EditSectionField {
                id: SectionId::new("summary_1"),
                field: "body".to_string(),
                value: "hi".to_string(),
            }
        );
    }
}
