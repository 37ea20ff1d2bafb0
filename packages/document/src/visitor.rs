use crate::{Document, Element, Node, Text};

/// Visitor pattern for traversing document trees immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &Element) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _text: &Text) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor pattern for transforming document trees
///
/// Similar to Visitor, but provides mutable access to nodes.
/// Use this when you need to modify the tree during traversal.
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, doc: &mut Document) {
        walk_document_mut(self, doc);
    }

    fn visit_node_mut(&mut self, node: &mut Node) {
        walk_node_mut(self, node);
    }

    fn visit_element_mut(&mut self, element: &mut Element) {
        walk_element_mut(self, element);
    }

    fn visit_text_mut(&mut self, _text: &mut Text) {
        // Leaf node, no children to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for node in &doc.children {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Element(element) => visitor.visit_element(element),
        Node::Text(text) => visitor.visit_text(text),
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &Element) {
    for child in &element.children {
        visitor.visit_node(child);
    }
}

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, doc: &mut Document) {
    for node in &mut doc.children {
        visitor.visit_node_mut(node);
    }
}

pub fn walk_node_mut<V: VisitorMut>(visitor: &mut V, node: &mut Node) {
    match node {
        Node::Element(element) => visitor.visit_element_mut(element),
        Node::Text(text) => visitor.visit_text_mut(text),
    }
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut Element) {
    for child in &mut element.children {
        visitor.visit_node_mut(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementType;

    #[derive(Default)]
    struct ElementCounter {
        count: usize,
    }

    impl Visitor for ElementCounter {
        fn visit_element(&mut self, element: &Element) {
            self.count += 1;
            walk_element(self, element);
        }
    }

    struct Uppercase;

    impl VisitorMut for Uppercase {
        fn visit_text_mut(&mut self, text: &mut Text) {
            text.text = text.text.to_uppercase();
        }
    }

    fn sample() -> Document {
        Document::new(vec![Element::details(vec![
            Element::summary("label").into(),
            Element::new(ElementType::Blockquote)
                .with_children(vec![Element::paragraph("quoted").into()])
                .into(),
        ])
        .into()])
    }

    #[test]
    fn test_visitor_counts_nested_elements() {
        let mut counter = ElementCounter::default();
        counter.visit_document(&sample());
        assert_eq!(counter.count, 4);
    }

    #[test]
    fn test_visitor_mut_rewrites_text() {
        let mut doc = sample();
        Uppercase.visit_document_mut(&mut doc);
        assert_eq!(doc.text_payloads(), vec!["LABEL", "QUOTED"]);
    }
}
