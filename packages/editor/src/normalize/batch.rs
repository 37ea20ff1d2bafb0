//! Batch normalization: one pure pass over an externally sourced tree.
//!
//! Children are repaired before their parent re-homes them, so deeply nested
//! sections are fixed independently of their ancestors. Unlike the live pass,
//! block content found inside a label is left where it is.

use folio_document::visitor::{walk_element_mut, VisitorMut};
use folio_document::{Document, Element, ElementType, Node};
use tracing::{debug, instrument};

/// Repair every collapsible section in `document`, at any depth
#[instrument(skip_all, fields(top_level = document.children.len()))]
pub fn normalize_batch(mut document: Document) -> Document {
    let mut normalizer = BatchNormalizer::default();
    normalizer.visit_document_mut(&mut document);
    debug!(
        sections = normalizer.sections,
        repaired = normalizer.repaired,
        "Batch normalization complete"
    );
    document
}

/// Same as [`normalize_batch`], for a detached fragment
pub fn normalize_batch_node(mut node: Node) -> Node {
    BatchNormalizer::default().visit_node_mut(&mut node);
    node
}

#[derive(Default)]
struct BatchNormalizer {
    sections: usize,
    repaired: usize,
}

impl VisitorMut for BatchNormalizer {
    fn visit_element_mut(&mut self, element: &mut Element) {
        walk_element_mut(self, element);

        if element.kind == ElementType::Details {
            self.sections += 1;
            if rehome(element) {
                self.repaired += 1;
            }
        }
    }
}

/// Rebuild a section's children as `[label, ...body]`
fn rehome(section: &mut Element) -> bool {
    let mut children = std::mem::take(&mut section.children);

    let (mut label, mut changed) = match children.iter().position(Node::is_summary) {
        Some(index) => (children.remove(index), index != 0),
        None => (Element::new(ElementType::Summary).into(), true),
    };

    if let Some(label_children) = label.children_mut() {
        if label_children.is_empty() {
            label_children.push(Node::empty_text());
            changed = true;
        }
    }

    section.children = std::iter::once(label).chain(children).collect();
    changed
}
