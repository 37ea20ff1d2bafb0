//! # Undo/Redo Stack
//!
//! Tracks mutation history and enables undo/redo operations.
//!
//! ## Design
//!
//! - Each mutation records its inverse before being applied
//! - Undo applies the inverses and moves the batch to the redo stack
//! - Redo reapplies the original mutations
//! - New mutations clear the redo stack
//! - Batches nest: only the outermost `end_batch` pushes an undo step
//! - Recorded insertions can be amended in place, so a placeholder swapped
//!   for its uploaded media replays as the media node
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//! let mut doc = Document::new(vec![]);
//!
//! stack.apply(&Mutation::InsertNodes { at, nodes }, &mut doc)?;
//! stack.undo(&mut doc)?;
//! stack.redo(&mut doc)?;
//! ```

use folio_document::{Document, Mutation, MutationError, Node, NodeId};

/// A group of mutations that should be undone/redone together
#[derive(Debug, Clone, Default)]
pub struct MutationBatch {
    /// The mutations in this batch (in application order)
    pub mutations: Vec<Mutation>,

    /// The inverse mutations (in undo application order)
    pub inverses: Vec<Mutation>,

    /// Optional description of this batch
    pub description: Option<String>,
}

impl MutationBatch {
    /// Create a single-mutation batch
    pub fn single(mutation: Mutation, inverses: Vec<Mutation>) -> Self {
        Self {
            mutations: vec![mutation],
            inverses,
            description: None,
        }
    }

    fn record(&mut self, mutation: Mutation, inverses: Vec<Mutation>) {
        self.mutations.push(mutation);
        // Later mutations are undone first
        self.inverses.splice(0..0, inverses);
    }

    fn amend(&mut self, id: &NodeId, node: &Node) -> bool {
        let mut amended = false;
        for mutation in self.mutations.iter_mut().chain(self.inverses.iter_mut()) {
            if let Mutation::InsertNodes { nodes, .. } = mutation {
                amended |= replace_by_id(nodes, id, node);
            }
        }
        amended
    }
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct UndoStack {
    /// Stack of applied mutations (most recent last)
    undo_stack: Vec<MutationBatch>,

    /// Stack of undone mutations (most recent last)
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Currently building a batch
    current_batch: Option<MutationBatch>,

    /// Nesting depth of `begin_batch` calls
    batch_depth: usize,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
            batch_depth: 0,
        }
    }

    /// Apply a mutation and record it for undo
    pub fn apply(&mut self, mutation: &Mutation, doc: &mut Document) -> Result<(), MutationError> {
        // Generate inverse before applying
        let inverses = mutation.to_inverse(doc)?;

        mutation.apply(doc)?;

        if let Some(batch) = &mut self.current_batch {
            batch.record(mutation.clone(), inverses);
        } else {
            self.push_batch(MutationBatch::single(mutation.clone(), inverses));
        }

        Ok(())
    }

    /// Start a batch of mutations (will be undone/redone together)
    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.current_batch = Some(MutationBatch::default());
        }
        self.batch_depth += 1;
    }

    /// End the current batch and push to undo stack
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;

        if self.batch_depth == 0 {
            if let Some(batch) = self.current_batch.take() {
                if !batch.mutations.is_empty() {
                    self.push_batch(batch);
                }
            }
        }
    }

    /// Set description for current batch (if batching)
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    /// Push a batch to the undo stack
    fn push_batch(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates future
        self.redo_stack.clear();
    }

    /// Undo the most recent mutation/batch
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool, MutationError> {
        if let Some(batch) = self.undo_stack.pop() {
            for inverse in &batch.inverses {
                inverse.apply(doc)?;
            }

            self.redo_stack.push(batch);

            Ok(true)
        } else {
            Ok(false) // Nothing to undo
        }
    }

    /// Redo the most recently undone mutation/batch
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool, MutationError> {
        if let Some(batch) = self.redo_stack.pop() {
            for mutation in &batch.mutations {
                mutation.apply(doc)?;
            }

            self.undo_stack.push(batch);

            Ok(true)
        } else {
            Ok(false) // Nothing to redo
        }
    }

    /// Replace, everywhere in recorded history, inserted nodes carrying `id`
    /// by `node`
    pub fn amend_inserted(&mut self, id: &NodeId, node: &Node) -> bool {
        let mut amended = false;
        for batch in self
            .undo_stack
            .iter_mut()
            .chain(self.redo_stack.iter_mut())
            .chain(self.current_batch.iter_mut())
        {
            amended |= batch.amend(id, node);
        }
        amended
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

fn replace_by_id(nodes: &mut [Node], id: &NodeId, replacement: &Node) -> bool {
    let mut replaced = false;
    for node in nodes.iter_mut() {
        if node.id() == Some(id) {
            *node = replacement.clone();
            replaced = true;
        } else if let Some(children) = node.children_mut() {
            replaced |= replace_by_id(children, id, replacement);
        }
    }
    replaced
}
