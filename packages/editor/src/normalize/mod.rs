//! # Structural Normalizer
//!
//! Keeps every collapsible section (`details`) shaped as a label
//! (`summary`) followed by body content.
//!
//! Two enforcement paths exist and intentionally disagree on one point:
//!
//! - **live** ([`normalize_live`]) runs per edit through the tree-mutation
//!   API and moves block content out of a label into the body;
//! - **batch** ([`normalize_batch`]) runs once over imported content as a
//!   pure function and treats the extracted label as opaque.
//!
//! Content imported before the live rules existed renders with blocks inside
//! its label; [`validate_sections`] reports those as
//! [`Violation::BlockOnlyLabel`] rather than rewriting them.
//!
//! Neither path knows about uploads.

mod batch;
mod live;

pub use batch::{normalize_batch, normalize_batch_node};
pub use live::{normalize_live, Repair};

use folio_document::{Document, Node, Path};
use serde::Serialize;
use std::fmt;

/// Collapsible section that breaks the invariant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionViolation {
    pub path: Path,
    pub violation: Violation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// No children at all
    Empty,
    /// First child is not a label
    MissingLabel,
    /// Label has no children, so nothing can be typed into it
    EmptyLabel,
    /// Label holds only block content; accepted by the batch pass, split by
    /// the live pass
    BlockOnlyLabel,
}

impl Violation {
    /// Whether the batch pass guarantees this never survives normalization
    pub fn is_structural(&self) -> bool {
        !matches!(self, Violation::BlockOnlyLabel)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Violation::Empty => "section has no children",
            Violation::MissingLabel => "first child is not a summary",
            Violation::EmptyLabel => "summary is empty",
            Violation::BlockOnlyLabel => "summary holds only block content",
        };
        f.write_str(message)
    }
}

/// Every section in `document` breaking the invariant, in document order
pub fn validate_sections(document: &Document) -> Vec<SectionViolation> {
    document
        .descendants()
        .into_iter()
        .filter(|(_, node)| node.is_details())
        .filter_map(|(path, node)| {
            check_section(node).map(|violation| SectionViolation { path, violation })
        })
        .collect()
}

fn check_section(section: &Node) -> Option<Violation> {
    let children = section.children()?;
    let Some(label) = children.first() else {
        return Some(Violation::Empty);
    };
    if !label.is_summary() {
        return Some(Violation::MissingLabel);
    }

    let label_children = label.children()?;
    if label_children.is_empty() {
        Some(Violation::EmptyLabel)
    } else if !label_children.iter().any(Node::is_inline) {
        Some(Violation::BlockOnlyLabel)
    } else {
        None
    }
}
