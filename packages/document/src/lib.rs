//! # Folio Document
//!
//! Plain-data model of a rich document: an ordered tree of text nodes and
//! typed elements, addressed by positional `Path`s or stable `NodeId`s.
//!
//! ```text
//! Document
//! ├── p ─── "intro"
//! └── details
//!     ├── summary ─── "Spoilers"
//!     └── p ─── "body"
//! ```
//!
//! Everything that edits a tree goes through [`TreeEditor`]: a bare
//! [`Document`] implements it directly, editing sessions add undo history
//! on top.

pub mod ast;
pub mod document;
pub mod editor;
pub mod id_generator;
pub mod mutations;
pub mod path;
pub mod visitor;

pub use ast::{Element, ElementType, MediaKind, Node, NodeId, Text};
pub use document::Document;
pub use editor::TreeEditor;
pub use id_generator::{get_seed, IdGenerator};
pub use mutations::{Affected, Mutation, MutationError};
pub use path::Path;
pub use visitor::{Visitor, VisitorMut};
