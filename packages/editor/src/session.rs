//! # Edit Session Management
//!
//! One open document: the tree with its undo history, the selection, and
//! the uploads started from it.
//!
//! The session is the only thing that mutates the tree. Upload tasks run on
//! the tokio runtime and hand their results back as events, which the
//! session applies on its own thread via [`EditSession::apply_upload_event`],
//! [`EditSession::drain_upload_events`] or [`EditSession::next_upload_event`].

use crate::editor::{Editor, MutationResult};
use crate::normalize::normalize_batch;
use crate::uploads::{
    FileBlob, InsertionContext, UploadEngine, UploadEvent, UploadEventKind, UploadOutcome,
    UploadRegistry, UploadState, Uploader,
};
use crate::{EditorConfig, EditorError};
use folio_document::visitor::{walk_document_mut, walk_element_mut, VisitorMut};
use folio_document::{
    Affected, Document, Element, Mutation, MutationError, Node, NodeId, Path, TreeEditor,
};
use std::sync::Arc;
use tracing::{debug, info};

pub struct EditSession {
    /// Unique session identifier, also seeds placeholder ids
    pub id: String,

    editor: Editor,

    uploads: UploadEngine,

    /// Block the cursor sits in
    selection: Option<Path>,

    config: EditorConfig,
}

impl EditSession {
    pub fn new(id: impl Into<String>, document: Document, uploader: Arc<dyn Uploader>) -> Self {
        Self::with_config(id, document, uploader, EditorConfig::default())
    }

    pub fn with_config(
        id: impl Into<String>,
        document: Document,
        uploader: Arc<dyn Uploader>,
        config: EditorConfig,
    ) -> Self {
        let id = id.into();
        let mut uploads = UploadEngine::new(&id, uploader, &config.uploads);
        uploads.reserve_ids(&document);
        info!(session = %id, "Opened edit session");

        Self {
            editor: Editor::with_config(document, &config),
            uploads,
            selection: None,
            config,
            id,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.editor.version()
    }

    /// Apply a user mutation; sections it touched are repaired in the same
    /// undo step
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        self.editor.apply(mutation)
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.editor.undo()
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.editor.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    pub fn selection(&self) -> Option<&Path> {
        self.selection.as_ref()
    }

    /// Update selection
    pub fn set_selection(&mut self, selection: Option<Path>) {
        self.selection = selection;
    }

    /// Paste/drop entry point: one placeholder per file at the selection,
    /// or at the end of the document without one
    pub fn insert_files(&mut self, files: Vec<FileBlob>) -> Result<Vec<NodeId>, EditorError> {
        let ctx = match &self.selection {
            Some(path) => InsertionContext::fill(path.clone()),
            None => InsertionContext::at(Path::from(vec![self.document().children.len()])),
        };
        self.insert_files_at(files, &ctx)
    }

    /// Insert placeholders for `files` as one undoable action
    pub fn insert_files_at(
        &mut self,
        files: Vec<FileBlob>,
        ctx: &InsertionContext,
    ) -> Result<Vec<NodeId>, EditorError> {
        let uploads = &mut self.uploads;
        let ids = self.editor.batch("insert_files", |editor| {
            let ids = uploads.register_uploads(editor, files, ctx)?;

            // A placeholder dropped into a label gets moved to the body
            let paths: Vec<Path> = ids.iter().filter_map(|id| editor.find_path(id)).collect();
            editor.normalize_at(&Affected::inserted(paths));

            Ok::<_, EditorError>(ids)
        })?;

        if let Some(last) = ids.last().and_then(|id| self.editor.find_path(id)) {
            self.selection = Some(last);
        }
        Ok(ids)
    }

    /// Re-entrant setup hook: start the upload captured for `id`, once
    pub fn start_upload(&mut self, id: &NodeId) -> bool {
        self.uploads.start(id)
    }

    pub fn upload_state(&self, id: &NodeId) -> Option<UploadState> {
        self.uploads.state(id)
    }

    pub fn uploads(&self) -> &UploadRegistry {
        self.uploads.registry()
    }

    /// Apply one upload event to the tree
    pub fn apply_upload_event(&mut self, event: UploadEvent) -> UploadOutcome {
        let terminal = !matches!(event.kind, UploadEventKind::Progress(_));
        let before = self.editor.find_path(&event.id);

        let uploads = &mut self.uploads;
        let outcome = if terminal {
            self.editor.batch("upload", |editor| {
                let outcome = uploads.apply(editor, event);

                // A removed placeholder may leave its section without a body
                if let (UploadOutcome::Failed { removed: true, .. }, Some(path)) = (&outcome, &before) {
                    let affected = Mutation::RemoveNode { at: path.clone() }.affected();
                    editor.normalize_at(&affected);
                }
                outcome
            })
        } else {
            uploads.apply(&mut self.editor, event)
        };

        debug!(session = %self.id, ?outcome, "Applied upload event");
        outcome
    }

    /// Apply every upload event delivered so far, without waiting
    pub fn drain_upload_events(&mut self) -> Vec<UploadOutcome> {
        self.uploads
            .drain_events()
            .into_iter()
            .map(|event| self.apply_upload_event(event))
            .collect()
    }

    /// Wait for the next upload event and apply it
    pub async fn next_upload_event(&mut self) -> Option<UploadOutcome> {
        let event = self.uploads.next_event().await?;
        Some(self.apply_upload_event(event))
    }

    /// Apply events until no upload is pending any more
    pub async fn settle_uploads(&mut self) -> Vec<UploadOutcome> {
        let mut outcomes = Vec::new();
        while self.uploads.registry().in_flight() > 0 {
            match self.next_upload_event().await {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }
        outcomes
    }

    /// Restart a failed upload in place of its placeholder
    pub fn retry_upload(
        &mut self,
        id: &NodeId,
        file: FileBlob,
    ) -> Result<Option<NodeId>, EditorError> {
        self.uploads.retry(&mut self.editor, id, file)
    }

    /// Snapshot ready to persist
    ///
    /// Placeholders the registry no longer tracks (neither pending nor
    /// failed) are dropped, then every section is batch-normalized.
    pub fn persistable_document(&self) -> Document {
        let mut document = self.document().clone();

        let mut pruner = OrphanPruner {
            registry: self.uploads.registry(),
            removed: 0,
        };
        pruner.visit_document_mut(&mut document);
        if pruner.removed > 0 {
            debug!(session = %self.id, removed = pruner.removed, "Dropped orphan placeholders");
        }

        normalize_batch(document)
    }

    /// Tear down: every upload is forgotten, results still in flight are
    /// discarded
    pub fn close(&mut self) {
        self.uploads.close();
        info!(session = %self.id, "Closed edit session");
    }
}

impl TreeEditor for EditSession {
    fn document(&self) -> &Document {
        self.editor.document()
    }

    fn insert_nodes(&mut self, nodes: Vec<Node>, at: &Path) -> Result<(), MutationError> {
        self.editor.insert_nodes(nodes, at)
    }

    fn remove_nodes(&mut self, at: &Path) -> Result<Node, MutationError> {
        self.editor.remove_nodes(at)
    }

    fn move_nodes(&mut self, from: &Path, to: &Path) -> Result<(), MutationError> {
        self.editor.move_nodes(from, to)
    }

    fn without_history<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.editor.set_recording(false);
        let result = f(self);
        self.editor.set_recording(previous);
        result
    }

    fn amend_history(&mut self, id: &NodeId, node: &Node) {
        self.editor.amend_history(id, node);
    }
}

struct OrphanPruner<'a> {
    registry: &'a UploadRegistry,
    removed: usize,
}

impl OrphanPruner<'_> {
    fn prune(&mut self, nodes: &mut Vec<Node>) {
        let before = nodes.len();
        nodes.retain(|node| {
            !node.is_placeholder() || node.id().is_some_and(|id| self.registry.is_tracked(id))
        });
        self.removed += before - nodes.len();
    }
}

impl VisitorMut for OrphanPruner<'_> {
    fn visit_document_mut(&mut self, doc: &mut Document) {
        self.prune(&mut doc.children);
        walk_document_mut(self, doc);
    }

    fn visit_element_mut(&mut self, element: &mut Element) {
        self.prune(&mut element.children);
        walk_element_mut(self, element);
    }
}
