//! # Placeholder Resolution Engine
//!
//! Binds asynchronously uploaded media into the document tree.
//!
//! ```text
//! paste/drop ──► register_uploads ──► placeholder nodes + registry entries
//!                       │
//!                       ▼
//!               tokio task per file ──► Uploader::upload
//!                       │
//!                       ▼ UploadEvent (mpsc)
//!     session thread ──► UploadEngine::apply ──► resolve | fail
//! ```
//!
//! Per id the lifecycle is `Pending → Resolved` or `Pending → Failed`, and a
//! terminal transition happens exactly once. Paths are looked up by id at
//! apply time, never cached.

mod engine;
mod placeholder;
mod registry;
mod uploader;

pub use engine::{Failure, InsertionContext, Resolution, UploadEngine, UploadOutcome};
pub use placeholder::{placeholder_media, placeholder_node, resolved_node};
pub use registry::{FailedUpload, PendingUpload, UploadRegistry, UploadState};
pub use uploader::{
    FileBlob, ProgressReporter, UploadError, UploadEvent, UploadEventKind, UploadedFile, Uploader,
};
