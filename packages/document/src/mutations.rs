//! # Tree Mutations
//!
//! Primitive, path-addressed operations on a document tree.
//!
//! ## Semantics
//!
//! ### InsertNodes
//! - Inserts consecutive siblings, the first one landing at `at`
//! - `at` may address one past the last child (append)
//!
//! ### RemoveNode
//! - Removes the node at `at` together with its descendants
//!
//! ### MoveNode
//! - Removes the node at `from`, then inserts it at `to`
//! - `to` addresses the tree *after* removal, i.e. the node's final position
//! - Atomic: if the insertion fails the node goes back where it was
//!
//! Every mutation can produce its inverse against the document it is about
//! to be applied to; the undo stack relies on that.

use crate::{Document, Node, Path};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a mutation changed the tree
///
/// `parents` lost or gained children but nothing new appeared below them;
/// `inserted` are the roots of subtrees that arrived with the mutation and
/// may carry structure of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Affected {
    pub parents: Vec<Path>,
    pub inserted: Vec<Path>,
}

impl Affected {
    pub fn parents(parents: Vec<Path>) -> Self {
        Self {
            parents,
            inserted: Vec::new(),
        }
    }

    pub fn inserted(inserted: Vec<Path>) -> Self {
        Self {
            parents: Vec::new(),
            inserted,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty() && self.inserted.is_empty()
    }
}

/// Primitive tree mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    InsertNodes { at: Path, nodes: Vec<Node> },

    RemoveNode { at: Path },

    MoveNode { from: Path, to: Path },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found at {0}")]
    NodeNotFound(Path),

    #[error("Parent not found for {0}")]
    ParentNotFound(Path),

    #[error("Node at {0} is not an element")]
    NotAnElement(Path),

    #[error("Index {index} out of bounds at {path} (len {len})")]
    OutOfBounds { path: Path, index: usize, len: usize },

    #[error("The document root cannot be addressed here")]
    RootPath,
}

impl Mutation {
    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut Document) -> Result<(), MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::InsertNodes { at, nodes } => doc.insert(at, nodes.clone()),
            Mutation::RemoveNode { at } => doc.remove(at).map(|_| ()),
            Mutation::MoveNode { from, to } => doc.move_node(from, to),
        }
    }

    /// Validate without applying
    ///
    /// Move targets are only checked for shape here; whether `to` exists is
    /// known after the removal, which `apply` handles atomically.
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::InsertNodes { at, .. } => {
                let index = at.last().ok_or(MutationError::RootPath)?;
                let parent = at.parent().ok_or(MutationError::RootPath)?;
                let siblings = doc
                    .children_at(&parent)
                    .ok_or_else(|| MutationError::ParentNotFound(at.clone()))?;

                if index > siblings.len() {
                    return Err(MutationError::OutOfBounds {
                        path: parent,
                        index,
                        len: siblings.len(),
                    });
                }

                Ok(())
            }

            Mutation::RemoveNode { at } => {
                if at.is_empty() {
                    return Err(MutationError::RootPath);
                }
                doc.node(at)
                    .ok_or_else(|| MutationError::NodeNotFound(at.clone()))?;
                Ok(())
            }

            Mutation::MoveNode { from, to } => {
                if from.is_empty() || to.is_empty() {
                    return Err(MutationError::RootPath);
                }
                doc.node(from)
                    .ok_or_else(|| MutationError::NodeNotFound(from.clone()))?;
                Ok(())
            }
        }
    }

    /// Mutations that undo this one, in application order
    ///
    /// Must be computed against the document *before* `apply`.
    pub fn to_inverse(&self, doc: &Document) -> Result<Vec<Mutation>, MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::InsertNodes { at, nodes } => Ok(nodes
                .iter()
                .map(|_| Mutation::RemoveNode { at: at.clone() })
                .collect()),

            Mutation::RemoveNode { at } => {
                let node = doc
                    .node(at)
                    .ok_or_else(|| MutationError::NodeNotFound(at.clone()))?;
                Ok(vec![Mutation::InsertNodes {
                    at: at.clone(),
                    nodes: vec![node.clone()],
                }])
            }

            Mutation::MoveNode { from, to } => Ok(vec![Mutation::MoveNode {
                from: to.clone(),
                to: from.clone(),
            }]),
        }
    }

    /// Region of the tree this mutation changed, in post-mutation
    /// coordinates
    pub fn affected(&self) -> Affected {
        match self {
            Mutation::InsertNodes { at, nodes } => {
                let Some(first) = at.last() else {
                    return Affected::default();
                };
                Affected::inserted(
                    (0..nodes.len())
                        .filter_map(|offset| at.sibling(first + offset))
                        .collect(),
                )
            }
            Mutation::RemoveNode { at } => Affected::parents(at.parent().into_iter().collect()),
            Mutation::MoveNode { from, to } => Affected {
                // The source parent was addressed before the node re-entered
                // the tree at `to`
                parents: from
                    .parent()
                    .map(|parent| parent.shifted_by_insert(to))
                    .into_iter()
                    .collect(),
                inserted: vec![to.clone()],
            },
        }
    }

    /// Debug name
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertNodes { .. } => "insert_nodes",
            Mutation::RemoveNode { .. } => "remove_node",
            Mutation::MoveNode { .. } => "move_node",
        }
    }
}
