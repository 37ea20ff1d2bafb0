//! # History-Recording Editor
//!
//! Concrete host of the tree-mutation API: every primitive goes through the
//! undo stack, and every user mutation is followed by the post-effect pass
//! inside the same undo step.

use crate::post_effects::PostEffectEngine;
use crate::{EditorConfig, EditorError, UndoStack};
use folio_document::{
    Affected, Document, Mutation, MutationError, Node, NodeId, Path, TreeEditor,
};
use std::sync::Arc;
use tracing::debug;

/// Result of applying a user mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationResult {
    /// New version number
    pub version: u64,

    /// Nodes repaired by post-effects after the mutation
    pub repaired: usize,
}

#[derive(Debug)]
pub struct Editor {
    document: Document,
    undo_stack: UndoStack,
    post_effects: Arc<PostEffectEngine>,
    recording: bool,
    version: u64,
}

impl Editor {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, &EditorConfig::default())
    }

    pub fn with_config(document: Document, config: &EditorConfig) -> Self {
        Self {
            document,
            undo_stack: UndoStack::with_max_levels(config.max_undo_levels),
            post_effects: Arc::new(PostEffectEngine::new(config.normalize.max_passes)),
            recording: true,
            version: 0,
        }
    }

    /// Bumped by every change to the tree, undo and redo included
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    /// Apply a user mutation, then repair whatever it touched
    ///
    /// The mutation and its repairs form one undo step.
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        self.undo_stack.begin_batch();
        self.undo_stack.set_batch_description(mutation.name());

        let result = self.record(&mutation).map(|_| {
            let affected = mutation.affected();
            self.run_post_effects(&affected)
        });

        self.undo_stack.end_batch();
        let repaired = result?;

        debug!(op = mutation.name(), version = self.version, repaired, "Applied mutation");

        Ok(MutationResult {
            version: self.version,
            repaired,
        })
    }

    /// Run post-effects over `affected` as if an edit had touched it
    pub fn normalize_at(&mut self, affected: &Affected) -> usize {
        self.run_post_effects(affected)
    }

    /// Group every primitive issued by `f` into a single undo step
    pub fn batch<R>(&mut self, description: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.undo_stack.begin_batch();
        self.undo_stack.set_batch_description(description);
        let result = f(self);
        self.undo_stack.end_batch();
        result
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let undone = self.undo_stack.undo(&mut self.document)?;
        if undone {
            self.version += 1;
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let redone = self.undo_stack.redo(&mut self.document)?;
        if redone {
            self.version += 1;
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_stack.can_redo()
    }

    /// Toggle history recording; returns the previous setting
    pub(crate) fn set_recording(&mut self, recording: bool) -> bool {
        std::mem::replace(&mut self.recording, recording)
    }

    fn run_post_effects(&mut self, affected: &Affected) -> usize {
        let effects = Arc::clone(&self.post_effects);
        effects.run(affected, self)
    }

    fn record(&mut self, mutation: &Mutation) -> Result<(), MutationError> {
        if self.recording {
            self.undo_stack.apply(mutation, &mut self.document)?;
        } else {
            mutation.apply(&mut self.document)?;
        }
        self.version += 1;
        Ok(())
    }
}

impl TreeEditor for Editor {
    fn document(&self) -> &Document {
        &self.document
    }

    fn insert_nodes(&mut self, nodes: Vec<Node>, at: &Path) -> Result<(), MutationError> {
        self.record(&Mutation::InsertNodes {
            at: at.clone(),
            nodes,
        })
    }

    fn remove_nodes(&mut self, at: &Path) -> Result<Node, MutationError> {
        let node = self
            .document
            .node(at)
            .cloned()
            .ok_or_else(|| MutationError::NodeNotFound(at.clone()))?;
        self.record(&Mutation::RemoveNode { at: at.clone() })?;
        Ok(node)
    }

    fn move_nodes(&mut self, from: &Path, to: &Path) -> Result<(), MutationError> {
        self.record(&Mutation::MoveNode {
            from: from.clone(),
            to: to.clone(),
        })
    }

    fn without_history<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.set_recording(false);
        let result = f(self);
        self.set_recording(previous);
        result
    }

    fn amend_history(&mut self, id: &NodeId, node: &Node) {
        self.undo_stack.amend_inserted(id, node);
    }
}
