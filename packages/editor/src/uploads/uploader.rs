//! Boundary with the external upload collaborator.

use async_trait::async_trait;
use folio_document::{MediaKind, NodeId};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// File captured from a paste, drop, or file picker
#[derive(Debug, Clone, PartialEq)]
pub struct FileBlob {
    pub name: String,
    pub mime: String,
    pub data: Arc<Vec<u8>>,
    /// Known pixel dimensions (images and videos)
    pub dimensions: Option<(u32, u32)>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: Arc::new(data),
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Successful upload result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
    /// Display name, when the storage layer renamed the file
    pub name: Option<String>,
}

impl UploadedFile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Upload transport failed: {0}")]
    Transport(String),

    #[error("File rejected: {0}")]
    Rejected(String),

    #[error("Upload task aborted: {0}")]
    Aborted(String),
}

/// Network/storage upload transport
///
/// Timeouts and retries inside a single attempt belong to the implementor;
/// the engine only reacts to the final result.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        file: FileBlob,
        progress: ProgressReporter,
    ) -> Result<UploadedFile, UploadError>;
}

/// Message from an upload task back to the session owning the tree
#[derive(Debug, Clone, PartialEq)]
pub struct UploadEvent {
    pub id: NodeId,
    pub kind: UploadEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEventKind {
    Progress(u8),
    Completed(UploadedFile),
    Failed(UploadError),
}

/// Progress sink handed to an uploader
///
/// Reports are best-effort: when the session lags behind, intermediate
/// percentages are dropped. Terminal events are never dropped.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    id: NodeId,
    tx: mpsc::Sender<UploadEvent>,
}

impl ProgressReporter {
    pub(crate) fn new(id: NodeId, tx: mpsc::Sender<UploadEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Report progress in percent, clamped to 0..=100
    pub fn report(&self, percent: f64) {
        let progress = percent.clamp(0.0, 100.0).round() as u8;
        let _ = self.tx.try_send(UploadEvent {
            id: self.id.clone(),
            kind: UploadEventKind::Progress(progress),
        });
    }

    /// Report progress from transferred byte counts
    pub fn report_bytes(&self, sent: u64, total: u64) {
        if total > 0 {
            self.report(sent as f64 * 100.0 / total as f64);
        }
    }
}
