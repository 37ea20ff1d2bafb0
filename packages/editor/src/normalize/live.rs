//! Live normalization: repairs one collapsible section through the
//! tree-mutation API, right after an edit touched it.
//!
//! Each pass applies the first rule that fires, then the section is
//! re-inspected; the loop ends once no rule fires.

use folio_document::{Element, ElementType, MutationError, Node, Path, TreeEditor};
use tracing::{debug, warn};

/// Repair rule applied by a single pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// Empty section received a label and a body paragraph
    FilledEmpty,
    /// Label-only section received a body paragraph
    AddedBody,
    /// Section without a leading label received an empty one
    InsertedLabel,
    /// Block content was moved out of the label into the body
    SplitLabel { moved: usize },
    /// Label without inline content received an empty text child
    RefilledLabel,
}

/// Repair the section at `section` until it satisfies the invariant
///
/// Returns whether anything changed. Never fails: a primitive that errors
/// stops the loop and leaves the tree as the last successful step left it.
pub fn normalize_live<E: TreeEditor + ?Sized>(
    editor: &mut E,
    section: &Path,
    max_passes: usize,
) -> bool {
    let mut changed = false;

    for _ in 0..max_passes {
        match repair_once(editor, section) {
            Ok(None) => return changed,
            Ok(Some(repair)) => {
                debug!(section = %section, ?repair, "Repaired collapsible section");
                changed = true;
            }
            Err(err) => {
                warn!(section = %section, error = %err, "Section repair failed");
                return changed;
            }
        }
    }

    warn!(section = %section, max_passes, "Section did not settle");
    changed
}

/// What the next pass has to do, decided before touching the tree
enum Plan {
    Settled,
    FillEmpty,
    AddBody,
    InsertLabel,
    FixLabel { blocks: Vec<usize> },
}

fn plan(element: &Element) -> Plan {
    match element.children.as_slice() {
        [] => Plan::FillEmpty,
        [_] => Plan::AddBody,
        [first, ..] if !first.is_summary() => Plan::InsertLabel,
        [label, ..] => {
            let children = label.children().map(Vec::as_slice).unwrap_or_default();
            let blocks: Vec<usize> = children
                .iter()
                .enumerate()
                .filter(|(_, child)| child.is_block())
                .map(|(index, _)| index)
                .collect();

            if blocks.is_empty() && children.iter().any(Node::is_inline) {
                Plan::Settled
            } else {
                Plan::FixLabel { blocks }
            }
        }
    }
}

fn repair_once<E: TreeEditor + ?Sized>(
    editor: &mut E,
    section: &Path,
) -> Result<Option<Repair>, MutationError> {
    let plan = match editor.node(section).and_then(Node::as_element) {
        Some(element) if element.kind == ElementType::Details => plan(element),
        _ => return Ok(None),
    };

    match plan {
        Plan::Settled => Ok(None),

        Plan::FillEmpty => {
            editor.insert_nodes(vec![empty_label(), empty_paragraph()], &section.child(0))?;
            Ok(Some(Repair::FilledEmpty))
        }

        Plan::AddBody => {
            editor.insert_nodes(vec![empty_paragraph()], &section.child(1))?;
            Ok(Some(Repair::AddedBody))
        }

        // The old first child shifts to position 1, i.e. into the body.
        Plan::InsertLabel => {
            editor.insert_nodes(vec![empty_label()], &section.child(0))?;
            Ok(Some(Repair::InsertedLabel))
        }

        Plan::FixLabel { blocks } => {
            let label = section.child(0);

            // Highest index first so the remaining indices stay valid; each
            // block lands at the head of the body, ahead of the one moved
            // before it, which keeps their relative order.
            for index in blocks.iter().rev() {
                editor.move_nodes(&label.child(*index), &section.child(1))?;
            }

            let remaining = editor.node(&label).and_then(Node::children);
            let has_inline = remaining.is_some_and(|c| c.iter().any(Node::is_inline));
            if !has_inline {
                let len = remaining.map_or(0, Vec::len);
                editor.insert_nodes(vec![Node::empty_text()], &label.child(len))?;
            }

            if blocks.is_empty() {
                Ok(Some(Repair::RefilledLabel))
            } else {
                Ok(Some(Repair::SplitLabel {
                    moved: blocks.len(),
                }))
            }
        }
    }
}

fn empty_label() -> Node {
    Element::summary("").into()
}

fn empty_paragraph() -> Node {
    Element::paragraph("").into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_document::Document;

    fn section(children: Vec<Node>) -> Document {
        Document::new(vec![Element::details(children).into()])
    }

    fn children(doc: &Document) -> &Vec<Node> {
        doc.node(&Path::from([0])).unwrap().children().unwrap()
    }

    #[test]
    fn test_empty_section_gets_label_and_body() {
        let mut doc = section(vec![]);
        assert!(normalize_live(&mut doc, &Path::from([0]), 16));

        let children = children(&doc);
        assert_eq!(children.len(), 2);
        assert!(children[0].is_summary());
        assert_eq!(children[1].kind(), Some(&ElementType::Paragraph));
    }

    #[test]
    fn test_label_only_section_gets_body() {
        let mut doc = section(vec![Element::summary("Title").into()]);
        assert!(normalize_live(&mut doc, &Path::from([0]), 16));

        let children = children(&doc);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].string(), "Title");
        assert_eq!(children[1].kind(), Some(&ElementType::Paragraph));
    }

    #[test]
    fn test_single_body_child_ends_with_label_first() {
        let mut doc = section(vec![Element::paragraph("only").into()]);
        assert!(normalize_live(&mut doc, &Path::from([0]), 16));

        let children = children(&doc);
        assert_eq!(children.len(), 3);
        assert!(children[0].is_summary());
        assert_eq!(children[1].string(), "only");
        assert_eq!(children[2].string(), "");
    }

    #[test]
    fn test_missing_label_demotes_first_child() {
        let mut doc = section(vec![
            Element::paragraph("A").into(),
            Element::paragraph("B").into(),
        ]);
        assert!(normalize_live(&mut doc, &Path::from([0]), 16));

        let texts: Vec<String> = children(&doc).iter().map(Node::string).collect();
        assert_eq!(texts, vec!["", "A", "B"]);
        assert!(children(&doc)[0].is_summary());
    }

    #[test]
    fn test_block_content_leaves_label_in_order() {
        let label = Element::new(ElementType::Summary).with_children(vec![
            Node::text("Title"),
            Element::paragraph("first").into(),
            Node::text(" tail"),
            Element::paragraph("second").into(),
        ]);
        let mut doc = section(vec![label.into(), Element::paragraph("body").into()]);

        assert!(normalize_live(&mut doc, &Path::from([0]), 16));

        let texts: Vec<String> = children(&doc).iter().map(Node::string).collect();
        assert_eq!(texts, vec!["Title tail", "first", "second", "body"]);
    }

    #[test]
    fn test_label_left_without_inline_gets_empty_text() {
        let label = Element::new(ElementType::Summary)
            .with_children(vec![Element::paragraph("moved").into()]);
        let mut doc = section(vec![label.into(), Element::paragraph("body").into()]);

        assert!(normalize_live(&mut doc, &Path::from([0]), 16));

        let label = children(&doc)[0].as_element().unwrap();
        assert_eq!(label.children, vec![Node::empty_text()]);
        assert_eq!(children(&doc)[1].string(), "moved");
    }

    #[test]
    fn test_valid_section_is_untouched() {
        let mut doc = section(vec![
            Element::summary("Title").into(),
            Element::paragraph("body").into(),
        ]);
        let before = doc.clone();

        assert!(!normalize_live(&mut doc, &Path::from([0]), 16));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_live_output_is_stable() {
        let mut doc = section(vec![Element::new(ElementType::Summary).into()]);
        normalize_live(&mut doc, &Path::from([0]), 16);
        let once = doc.clone();

        assert!(!normalize_live(&mut doc, &Path::from([0]), 16));
        assert_eq!(doc, once);
    }

    #[test]
    fn test_non_section_paths_are_ignored() {
        let mut doc = Document::new(vec![Element::paragraph("text").into()]);
        assert!(!normalize_live(&mut doc, &Path::from([0]), 16));
        assert!(!normalize_live(&mut doc, &Path::from([3]), 16));
    }
}
