//! # Document Tree
//!
//! Root of an ordered, rooted node tree. The root itself is not a node: it
//! only owns the top-level children, so every node has a non-empty path.
//!
//! Lookups by path are positional; lookups by `NodeId` walk the tree and stay
//! valid while siblings come and go.

use crate::visitor::{walk_element, Visitor};
use crate::{Element, MutationError, Node, NodeId, Path, Text};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Parse the persisted JSON payload (an array of nodes)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn node(&self, path: &Path) -> Option<&Node> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.children.get(*first)?;
        for index in rest {
            node = node.children()?.get(*index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for index in rest {
            node = node.children_mut()?.get_mut(*index)?;
        }
        Some(node)
    }

    pub fn element(&self, path: &Path) -> Option<&Element> {
        self.node(path).and_then(Node::as_element)
    }

    /// Children of the node at `path`, or the top-level nodes for the root
    pub fn children_at(&self, path: &Path) -> Option<&Vec<Node>> {
        if path.is_empty() {
            Some(&self.children)
        } else {
            self.node(path).and_then(Node::children)
        }
    }

    pub fn children_at_mut(&mut self, path: &Path) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            Some(&mut self.children)
        } else {
            self.node_mut(path).and_then(Node::children_mut)
        }
    }

    /// Current path of the element carrying `id`
    pub fn find_path(&self, id: &NodeId) -> Option<Path> {
        fn search(nodes: &[Node], id: &NodeId, path: &mut Vec<usize>) -> bool {
            for (index, node) in nodes.iter().enumerate() {
                path.push(index);
                if node.id() == Some(id) {
                    return true;
                }
                if let Some(children) = node.children() {
                    if search(children, id, path) {
                        return true;
                    }
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.children, id, &mut path).then(|| Path::new(path))
    }

    /// Insert consecutive siblings starting at `at`
    pub fn insert(&mut self, at: &Path, nodes: Vec<Node>) -> Result<(), MutationError> {
        let index = at.last().ok_or(MutationError::RootPath)?;
        let parent = at.parent().ok_or(MutationError::RootPath)?;
        let siblings = self
            .children_at_mut(&parent)
            .ok_or_else(|| MutationError::ParentNotFound(at.clone()))?;

        if index > siblings.len() {
            return Err(MutationError::OutOfBounds {
                path: parent,
                index,
                len: siblings.len(),
            });
        }

        siblings.splice(index..index, nodes);
        Ok(())
    }

    pub fn remove(&mut self, at: &Path) -> Result<Node, MutationError> {
        let index = at.last().ok_or(MutationError::RootPath)?;
        let parent = at.parent().ok_or(MutationError::RootPath)?;
        let siblings = self
            .children_at_mut(&parent)
            .ok_or_else(|| MutationError::NodeNotFound(at.clone()))?;

        if index >= siblings.len() {
            return Err(MutationError::NodeNotFound(at.clone()));
        }

        Ok(siblings.remove(index))
    }

    /// Move a node; `to` is its final position (see `Mutation::MoveNode`)
    pub fn move_node(&mut self, from: &Path, to: &Path) -> Result<(), MutationError> {
        let node = self.remove(from)?;

        if let Err(err) = self.insert(to, vec![node.clone()]) {
            self.insert(from, vec![node])?;
            return Err(err);
        }

        Ok(())
    }

    /// Every node with its path, in document order
    pub fn descendants(&self) -> Vec<(Path, &Node)> {
        fn collect<'a>(nodes: &'a [Node], parent: &Path, out: &mut Vec<(Path, &'a Node)>) {
            for (index, node) in nodes.iter().enumerate() {
                let path = parent.child(index);
                out.push((path.clone(), node));
                if let Some(children) = node.children() {
                    collect(children, &path, out);
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.children, &Path::root(), &mut out);
        out
    }

    /// Paths of every collapsible section, in document order
    pub fn details_paths(&self) -> Vec<Path> {
        self.descendants()
            .into_iter()
            .filter(|(_, node)| node.is_details())
            .map(|(path, _)| path)
            .collect()
    }

    /// Non-empty text payloads in document order
    pub fn text_payloads(&self) -> Vec<String> {
        let mut collector = TextCollector::default();
        collector.visit_document(self);
        collector.texts
    }

    /// Ids of placeholder nodes still present in the tree
    pub fn placeholder_ids(&self) -> Vec<NodeId> {
        let mut collector = PlaceholderCollector::default();
        collector.visit_document(self);
        collector.ids
    }
}

#[derive(Default)]
struct TextCollector {
    texts: Vec<String>,
}

impl Visitor for TextCollector {
    fn visit_text(&mut self, text: &Text) {
        if !text.text.is_empty() {
            self.texts.push(text.text.clone());
        }
    }
}

#[derive(Default)]
struct PlaceholderCollector {
    ids: Vec<NodeId>,
}

impl Visitor for PlaceholderCollector {
    fn visit_element(&mut self, element: &Element) {
        if element.kind == crate::ElementType::Placeholder {
            if let Some(id) = &element.id {
                self.ids.push(id.clone());
            }
        }
        walk_element(self, element);
    }
}
