use crate::{Document, MutationError, Node, NodeId, Path};

/// Tree-mutation API shared by the normalizer and the upload engine
///
/// Hosts own the tree; engines only ever touch it through these primitives,
/// which are atomic with respect to each other.
pub trait TreeEditor {
    fn document(&self) -> &Document;

    /// Insert consecutive siblings starting at `at`
    fn insert_nodes(&mut self, nodes: Vec<Node>, at: &Path) -> Result<(), MutationError>;

    fn remove_nodes(&mut self, at: &Path) -> Result<Node, MutationError>;

    /// Move the node at `from` so that it ends up at `to`
    fn move_nodes(&mut self, from: &Path, to: &Path) -> Result<(), MutationError>;

    fn node(&self, at: &Path) -> Option<&Node> {
        self.document().node(at)
    }

    fn find_path(&self, id: &NodeId) -> Option<Path> {
        self.document().find_path(id)
    }

    /// Run `f` without recording undo history
    fn without_history<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R
    where
        Self: Sized;

    /// Rewrite recorded history so that past insertions of the node carrying
    /// `id` replay `node` instead
    fn amend_history(&mut self, _id: &NodeId, _node: &Node) {}
}

/// A bare document is an editor without history
impl TreeEditor for Document {
    fn document(&self) -> &Document {
        self
    }

    fn insert_nodes(&mut self, nodes: Vec<Node>, at: &Path) -> Result<(), MutationError> {
        self.insert(at, nodes)
    }

    fn remove_nodes(&mut self, at: &Path) -> Result<Node, MutationError> {
        self.remove(at)
    }

    fn move_nodes(&mut self, from: &Path, to: &Path) -> Result<(), MutationError> {
        self.move_node(from, to)
    }

    fn without_history<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        f(self)
    }
}
