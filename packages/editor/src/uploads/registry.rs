//! Side table of in-flight uploads, keyed by placeholder id.
//!
//! Authoritative for upload state: undo/redo and normalization only ever
//! see the tree, so they cannot revive or destroy an entry here.

use super::uploader::FileBlob;
use chrono::{DateTime, Utc};
use folio_document::NodeId;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file: FileBlob,
    /// Percent complete, 0..=100
    pub progress: u8,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FailedUpload {
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// Upload state as seen by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Pending { progress: u8 },
    Failed { reason: String },
}

#[derive(Debug, Default)]
pub struct UploadRegistry {
    pending: HashMap<NodeId, PendingUpload>,

    /// Files captured for an id whose upload has not started yet; taking
    /// one out is what starts the upload
    captured: HashMap<NodeId, FileBlob>,

    failed: HashMap<NodeId, FailedUpload>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the pending entry for a freshly inserted placeholder
    pub fn register(&mut self, id: NodeId, file: FileBlob) {
        self.captured.insert(id.clone(), file.clone());
        self.pending.insert(
            id,
            PendingUpload {
                file,
                progress: 0,
                started_at: Utc::now(),
            },
        );
    }

    /// Hand out the captured file for `id`, at most once
    pub fn take_captured(&mut self, id: &NodeId) -> Option<FileBlob> {
        self.captured.remove(id)
    }

    /// Record progress for a pending upload; unknown ids are ignored
    pub fn set_progress(&mut self, id: &NodeId, progress: u8) -> bool {
        match self.pending.get_mut(id) {
            Some(entry) => {
                entry.progress = progress.min(100);
                true
            }
            None => false,
        }
    }

    pub fn pending(&self, id: &NodeId) -> Option<&PendingUpload> {
        self.pending.get(id)
    }

    /// Destroy the pending entry on successful completion
    pub fn finish(&mut self, id: &NodeId) -> Option<PendingUpload> {
        self.captured.remove(id);
        self.pending.remove(id)
    }

    /// Move a pending entry to the failed table; false if it was not pending
    pub fn mark_failed(&mut self, id: &NodeId, reason: impl Into<String>) -> bool {
        if self.finish(id).is_none() {
            return false;
        }
        self.failed.insert(
            id.clone(),
            FailedUpload {
                reason: reason.into(),
                failed_at: Utc::now(),
            },
        );
        true
    }

    pub fn failure(&self, id: &NodeId) -> Option<&FailedUpload> {
        self.failed.get(id)
    }

    pub fn clear_failure(&mut self, id: &NodeId) -> Option<FailedUpload> {
        self.failed.remove(id)
    }

    pub fn state(&self, id: &NodeId) -> Option<UploadState> {
        if let Some(entry) = self.pending.get(id) {
            return Some(UploadState::Pending {
                progress: entry.progress,
            });
        }
        self.failed.get(id).map(|failure| UploadState::Failed {
            reason: failure.reason.clone(),
        })
    }

    pub fn is_pending(&self, id: &NodeId) -> bool {
        self.pending.contains_key(id)
    }

    /// Whether the registry knows `id` at all (pending or failed)
    pub fn is_tracked(&self, id: &NodeId) -> bool {
        self.pending.contains_key(id) || self.failed.contains_key(id)
    }

    /// Pending ids, sorted for stable output
    pub fn pending_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.pending.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of uploads still waiting for a terminal event
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.captured.clear();
        self.failed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> FileBlob {
        FileBlob::new("cat.png", "image/png", vec![1, 2, 3])
    }

    #[test]
    fn test_captured_file_is_consumed_once() {
        let mut registry = UploadRegistry::new();
        let id = NodeId::from("up-1");
        registry.register(id.clone(), file());

        assert!(registry.take_captured(&id).is_some());
        assert!(registry.take_captured(&id).is_none());
        assert!(registry.is_pending(&id));
    }

    #[test]
    fn test_settled_uploads_leave_nothing_behind() {
        let mut registry = UploadRegistry::new();
        let done = NodeId::from("up-1");
        let failed = NodeId::from("up-2");
        for id in [&done, &failed] {
            registry.register(id.clone(), file());
            registry.take_captured(id);
        }

        registry.finish(&done);
        registry.mark_failed(&failed, "offline");
        registry.clear_failure(&failed);

        assert!(registry.pending.is_empty());
        assert!(registry.captured.is_empty());
        assert!(registry.failed.is_empty());
        assert!(registry.take_captured(&done).is_none());
    }

    #[test]
    fn test_progress_only_for_pending() {
        let mut registry = UploadRegistry::new();
        let id = NodeId::from("up-1");

        assert!(!registry.set_progress(&id, 10));

        registry.register(id.clone(), file());
        assert!(registry.set_progress(&id, 40));
        assert_eq!(registry.state(&id), Some(UploadState::Pending { progress: 40 }));
    }

    #[test]
    fn test_terminal_transition_happens_once() {
        let mut registry = UploadRegistry::new();
        let id = NodeId::from("up-1");
        registry.register(id.clone(), file());

        assert!(registry.mark_failed(&id, "offline"));
        assert!(!registry.mark_failed(&id, "offline again"));
        assert!(registry.finish(&id).is_none());
        assert_eq!(
            registry.state(&id),
            Some(UploadState::Failed {
                reason: "offline".to_string()
            })
        );
    }

    #[test]
    fn test_finish_clears_entry() {
        let mut registry = UploadRegistry::new();
        let id = NodeId::from("up-1");
        registry.register(id.clone(), file());

        let entry = registry.finish(&id).unwrap();
        assert_eq!(entry.file.name, "cat.png");
        assert_eq!(registry.state(&id), None);
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut registry = UploadRegistry::new();
        registry.register(NodeId::from("a"), file());
        registry.register(NodeId::from("b"), file());
        registry.mark_failed(&NodeId::from("b"), "nope");

        assert_eq!(registry.pending_ids(), vec![NodeId::from("a")]);
        registry.clear();
        assert!(!registry.is_tracked(&NodeId::from("a")));
        assert!(!registry.is_tracked(&NodeId::from("b")));
    }
}
