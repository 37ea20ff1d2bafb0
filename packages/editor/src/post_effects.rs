//! # Post-Effect System
//!
//! Mutations trigger cascading repairs to maintain document integrity.
//!
//! ## Design
//!
//! When a mutation is applied, the regions it touched may need follow-up
//! changes to keep the document valid. Each post-effect:
//! - inspects the paths the mutation affected and picks the nodes it cares
//!   about (`analyze`)
//! - repairs each of them through the tree-mutation API (`repair`)
//!
//! Post-effects are:
//! - **Deterministic**: Same mutation always produces same repairs
//! - **Minimal**: Only the touched region is revisited
//! - **Local**: A repair only changes the subtree of the node it targets

use crate::normalize::normalize_live;
use folio_document::{Affected, Document, Path, TreeEditor};
use tracing::debug;

/// Post-effect that can be triggered by a mutation
pub trait PostEffect: std::fmt::Debug + Send + Sync {
    /// Nodes to repair after a change to `affected`, in repair order
    fn analyze(&self, affected: &Affected, doc: &Document) -> Vec<Path>;

    /// Repair one node; returns whether the tree changed
    fn repair(&self, editor: &mut dyn TreeEditor, target: &Path) -> bool;
}

/// Live normalization of collapsible sections touched by an edit
#[derive(Debug)]
pub struct NormalizeSections {
    pub max_passes: usize,
}

impl PostEffect for NormalizeSections {
    fn analyze(&self, affected: &Affected, doc: &Document) -> Vec<Path> {
        let mut sections = Vec::new();

        // Enclosing sections, the node itself included
        for path in affected.parents.iter().chain(&affected.inserted) {
            for candidate in path.ancestors().into_iter().chain(Some(path.clone())) {
                if doc.node(&candidate).is_some_and(|n| n.is_details()) {
                    sections.push(candidate);
                }
            }
        }

        // Sections brought in by the edit
        if !affected.inserted.is_empty() {
            for (descendant, node) in doc.descendants() {
                let brought_in = affected
                    .inserted
                    .iter()
                    .any(|path| path.is_ancestor_of(&descendant));
                if node.is_details() && brought_in {
                    sections.push(descendant);
                }
            }
        }

        // Deepest first: a repair only shifts paths inside its own section
        sections.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        sections.dedup();
        sections
    }

    fn repair(&self, editor: &mut dyn TreeEditor, target: &Path) -> bool {
        normalize_live(editor, target, self.max_passes)
    }
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new(max_passes: usize) -> Self {
        Self {
            effects: vec![Box::new(NormalizeSections { max_passes })],
        }
    }

    pub fn with_effects(effects: Vec<Box<dyn PostEffect>>) -> Self {
        Self { effects }
    }

    /// Run every effect over the region `affected`; returns the number of
    /// nodes that were repaired
    pub fn run(&self, affected: &Affected, editor: &mut dyn TreeEditor) -> usize {
        let mut repaired = 0;

        for effect in &self.effects {
            for target in effect.analyze(affected, editor.document()) {
                if effect.repair(editor, &target) {
                    repaired += 1;
                }
            }
        }

        if repaired > 0 {
            debug!(repaired, "Post-effects repaired document");
        }
        repaired
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new(crate::config::NormalizeConfig::default().max_passes)
    }
}
