//! # Folio Editor
//!
//! Integrity engine for rich documents: keeps collapsible sections well
//! formed and binds asynchronously uploaded media into the tree.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: node tree, paths, mutations       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - Apply mutations with undo history        │
//! │  - Post-effects: live section normalization │
//! │  - Placeholder registry + upload engine     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ persistence: batch-normalized snapshot      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is plain data**: normalizers are functions over it
//! 2. **One writer**: only the session mutates the tree, uploads send events
//! 3. **Ids, not paths**: upload results find their node by id when applied
//! 4. **The registry owns upload state**: undo and normalization never touch it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{EditSession, FileBlob, Mutation};
//!
//! let mut session = EditSession::new("doc-1", document, uploader);
//!
//! // Edits are normalized as they land
//! session.apply(mutation)?;
//!
//! // Paste two images at the cursor
//! session.set_selection(Some(path));
//! let ids = session.insert_files(vec![a, b])?;
//!
//! // Apply upload results as they arrive
//! while let Some(outcome) = session.next_upload_event().await {
//!     println!("{:?}", outcome);
//! }
//!
//! save(session.persistable_document());
//! ```

pub mod config;
mod editor;
mod errors;
pub mod normalize;
mod post_effects;
mod session;
mod undo_stack;
pub mod uploads;

pub use config::{EditorConfig, FailurePolicy, NormalizeConfig, UploadConfig};
pub use editor::{Editor, MutationResult};
pub use errors::EditorError;
pub use normalize::{
    normalize_batch, normalize_batch_node, normalize_live, validate_sections, Repair,
    SectionViolation, Violation,
};
pub use post_effects::{NormalizeSections, PostEffect, PostEffectEngine};
pub use session::EditSession;
pub use undo_stack::{MutationBatch, UndoStack};
pub use uploads::{
    FileBlob, InsertionContext, ProgressReporter, Resolution, UploadEngine, UploadError,
    UploadEvent, UploadEventKind, UploadOutcome, UploadState, UploadedFile, Uploader,
};

// Re-export document types for convenience
pub use folio_document::{
    Affected, Document, Element, ElementType, MediaKind, Mutation, MutationError, Node, NodeId,
    Path, TreeEditor,
};
