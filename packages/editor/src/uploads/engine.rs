//! Placeholder lifecycle: insert, upload, then resolve or fail by id.
//!
//! Upload tasks never touch the tree. They report back through a channel and
//! the owner of the tree applies each event with [`UploadEngine::apply`],
//! re-resolving the placeholder's path by id every time.

use super::placeholder::{placeholder_node, resolved_node};
use super::registry::{UploadRegistry, UploadState};
use super::uploader::{
    FileBlob, ProgressReporter, UploadError, UploadEvent, UploadEventKind, UploadedFile, Uploader,
};
use crate::config::{FailurePolicy, UploadConfig};
use crate::EditorError;
use folio_document::{
    Document, ElementType, IdGenerator, MutationError, Node, NodeId, Path, TreeEditor,
};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Where the placeholders of one user gesture go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionContext {
    pub at: Path,

    /// The node at `at` triggered the gesture; an empty one is replaced by
    /// the first placeholder, anything else gets it as next sibling
    pub fill: bool,
}

impl InsertionContext {
    pub fn at(path: Path) -> Self {
        Self {
            at: path,
            fill: false,
        }
    }

    pub fn fill(path: Path) -> Self {
        Self {
            at: path,
            fill: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The placeholder was swapped for the media node at `path`
    Resolved { path: Path },
    /// Nothing to resolve: the node is gone or the id is no longer pending
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Failure recorded; `removed` tells whether the placeholder left the tree
    Recorded { removed: bool },
    /// The id was not pending
    Ignored,
}

/// What applying one upload event did
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Progress { id: NodeId, progress: u8 },
    Resolved { id: NodeId, path: Path },
    Failed { id: NodeId, reason: String, removed: bool },
    Stale { id: NodeId },
    Ignored { id: NodeId },
}

pub struct UploadEngine {
    registry: UploadRegistry,
    ids: IdGenerator,
    uploader: Arc<dyn Uploader>,
    tx: mpsc::Sender<UploadEvent>,
    rx: mpsc::Receiver<UploadEvent>,
    failure_policy: FailurePolicy,
}

impl std::fmt::Debug for UploadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadEngine")
            .field("registry", &self.registry)
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}

impl UploadEngine {
    pub fn new(session: &str, uploader: Arc<dyn Uploader>, config: &UploadConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        Self {
            registry: UploadRegistry::new(),
            ids: IdGenerator::new(session),
            uploader,
            tx,
            rx,
            failure_policy: config.failure_policy,
        }
    }

    /// Never hand out an id already present in `document`
    ///
    /// Reopened documents may still carry placeholders minted by an earlier
    /// session under the same name.
    pub fn reserve_ids(&mut self, document: &Document) {
        let existing = document.descendants();
        self.ids
            .skip_past(existing.iter().filter_map(|(_, node)| node.id()));
    }

    pub fn registry(&self) -> &UploadRegistry {
        &self.registry
    }

    pub fn state(&self, id: &NodeId) -> Option<UploadState> {
        self.registry.state(id)
    }

    /// Insert a placeholder for `file` and start uploading it
    pub fn register_upload<E: TreeEditor + ?Sized>(
        &mut self,
        editor: &mut E,
        file: FileBlob,
        ctx: &InsertionContext,
    ) -> Result<NodeId, EditorError> {
        Handle::try_current().map_err(|_| EditorError::NoRuntime)?;

        let id = self.next_id(&*editor);
        insert_placeholders(editor, vec![placeholder_node(&id, &file)], ctx)?;
        self.track(vec![(id.clone(), file)]);

        Ok(id)
    }

    /// Insert one placeholder per file and start every upload
    ///
    /// The first placeholder fills the triggering node (or lands at
    /// `ctx.at`); the others follow it in a single insertion. Each id then
    /// lives its own lifecycle.
    pub fn register_uploads<E: TreeEditor + ?Sized>(
        &mut self,
        editor: &mut E,
        files: Vec<FileBlob>,
        ctx: &InsertionContext,
    ) -> Result<Vec<NodeId>, EditorError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        Handle::try_current().map_err(|_| EditorError::NoRuntime)?;

        let ids: Vec<NodeId> = files.iter().map(|_| self.next_id(&*editor)).collect();
        let nodes = ids
            .iter()
            .zip(&files)
            .map(|(id, file)| placeholder_node(id, file))
            .collect();

        insert_placeholders(editor, nodes, ctx)?;
        self.track(ids.iter().cloned().zip(files).collect());

        Ok(ids)
    }

    /// Next id that neither the tree nor the registry knows
    fn next_id<E: TreeEditor + ?Sized>(&mut self, editor: &E) -> NodeId {
        loop {
            let id = self.ids.new_id();
            if editor.find_path(&id).is_none() && !self.registry.is_tracked(&id) {
                return id;
            }
            debug!(id = %id, "Skipping id already in use");
        }
    }

    fn track(&mut self, uploads: Vec<(NodeId, FileBlob)>) {
        let ids: Vec<NodeId> = uploads.iter().map(|(id, _)| id.clone()).collect();
        for (id, file) in uploads {
            info!(id = %id, name = %file.name, size = file.size(), "Registered upload");
            self.registry.register(id, file);
        }
        for id in &ids {
            self.start(id);
        }
    }

    /// Start the upload captured for `id`
    ///
    /// Consumes the captured file exactly once; later calls for the same id
    /// are no-ops returning `false`.
    pub fn start(&mut self, id: &NodeId) -> bool {
        let Ok(handle) = Handle::try_current() else {
            warn!(id = %id, "No runtime to start upload on");
            return false;
        };
        let Some(file) = self.registry.take_captured(id) else {
            debug!(id = %id, "Upload already started");
            return false;
        };

        let uploader = Arc::clone(&self.uploader);
        let reporter = ProgressReporter::new(id.clone(), self.tx.clone());
        let tx = self.tx.clone();
        let id = id.clone();

        handle.spawn(async move {
            // Inner task so a panicking uploader still yields a terminal event
            let upload = tokio::spawn(async move { uploader.upload(file, reporter).await });
            let kind = match upload.await {
                Ok(Ok(uploaded)) => UploadEventKind::Completed(uploaded),
                Ok(Err(err)) => UploadEventKind::Failed(err),
                Err(err) => UploadEventKind::Failed(UploadError::Aborted(err.to_string())),
            };
            // The receiver is gone once the session closes
            let _ = tx.send(UploadEvent { id, kind }).await;
        });

        true
    }

    pub fn report_progress(&mut self, id: &NodeId, progress: u8) -> bool {
        let known = self.registry.set_progress(id, progress);
        if known {
            debug!(id = %id, progress, "Upload progress");
        }
        known
    }

    /// Swap the placeholder for its media node, outside undo history
    ///
    /// Recorded insertions of the placeholder are amended so undo/redo
    /// replays the media node. A placeholder that left the tree makes this a
    /// no-op on the tree.
    #[instrument(skip_all, fields(id = %id))]
    pub fn resolve<E: TreeEditor>(
        &mut self,
        editor: &mut E,
        id: &NodeId,
        uploaded: UploadedFile,
    ) -> Result<Resolution, MutationError> {
        let Some(pending) = self.registry.pending(id) else {
            debug!("Resolution for an id that is not pending");
            return Ok(Resolution::Stale);
        };
        let media = resolved_node(id, &pending.file, &uploaded);
        editor.amend_history(id, &media);

        let path = editor
            .find_path(id)
            .filter(|path| editor.node(path).is_some_and(Node::is_placeholder));
        let Some(path) = path else {
            self.registry.finish(id);
            warn!("Placeholder left the tree before its upload finished");
            return Ok(Resolution::Stale);
        };

        editor.without_history(|e| -> Result<(), MutationError> {
            e.remove_nodes(&path)?;
            e.insert_nodes(vec![media], &path)
        })?;
        self.registry.finish(id);

        info!(path = %path, url = %uploaded.url, "Resolved upload");
        Ok(Resolution::Resolved { path })
    }

    /// Record a failed upload and apply the failure policy to its node
    pub fn fail<E: TreeEditor + ?Sized>(
        &mut self,
        editor: &mut E,
        id: &NodeId,
        error: &UploadError,
    ) -> Result<Failure, MutationError> {
        if !self.registry.mark_failed(id, error.to_string()) {
            return Ok(Failure::Ignored);
        }
        warn!(id = %id, error = %error, policy = ?self.failure_policy, "Upload failed");

        let removed = match (self.failure_policy, editor.find_path(id)) {
            (FailurePolicy::Remove, Some(path)) => {
                editor.remove_nodes(&path)?;
                true
            }
            _ => false,
        };

        Ok(Failure::Recorded { removed })
    }

    /// Restart a failed upload with `file` under a fresh id
    ///
    /// Returns `None` when `id` has not failed or its node is gone.
    pub fn retry<E: TreeEditor>(
        &mut self,
        editor: &mut E,
        id: &NodeId,
        file: FileBlob,
    ) -> Result<Option<NodeId>, EditorError> {
        if self.registry.failure(id).is_none() {
            return Ok(None);
        }
        let Some(path) = editor.find_path(id) else {
            return Ok(None);
        };
        Handle::try_current().map_err(|_| EditorError::NoRuntime)?;

        let new_id = self.next_id(&*editor);
        let node = placeholder_node(&new_id, &file);

        editor.without_history(|e| -> Result<(), MutationError> {
            e.remove_nodes(&path)?;
            e.insert_nodes(vec![node.clone()], &path)
        })?;
        editor.amend_history(id, &node);

        self.registry.clear_failure(id);
        self.registry.register(new_id.clone(), file);
        info!(id = %new_id, previous = %id, "Retrying upload");
        self.start(&new_id);

        Ok(Some(new_id))
    }

    /// Apply one event from an upload task to the tree
    ///
    /// Never fails: tree errors during resolution turn into the failed state.
    pub fn apply<E: TreeEditor>(&mut self, editor: &mut E, event: UploadEvent) -> UploadOutcome {
        let UploadEvent { id, kind } = event;

        match kind {
            UploadEventKind::Progress(progress) => {
                if self.report_progress(&id, progress) {
                    UploadOutcome::Progress { id, progress }
                } else {
                    UploadOutcome::Ignored { id }
                }
            }
            UploadEventKind::Completed(uploaded) => match self.resolve(editor, &id, uploaded) {
                Ok(Resolution::Resolved { path }) => UploadOutcome::Resolved { id, path },
                Ok(Resolution::Stale) => UploadOutcome::Stale { id },
                Err(err) => {
                    let error = UploadError::Aborted(err.to_string());
                    self.apply_failure(editor, id, &error)
                }
            },
            UploadEventKind::Failed(error) => self.apply_failure(editor, id, &error),
        }
    }

    fn apply_failure<E: TreeEditor + ?Sized>(
        &mut self,
        editor: &mut E,
        id: NodeId,
        error: &UploadError,
    ) -> UploadOutcome {
        match self.fail(editor, &id, error) {
            Ok(Failure::Recorded { removed }) => UploadOutcome::Failed {
                id,
                reason: error.to_string(),
                removed,
            },
            Ok(Failure::Ignored) => UploadOutcome::Ignored { id },
            Err(err) => {
                warn!(id = %id, error = %err, "Could not remove failed placeholder");
                UploadOutcome::Failed {
                    id,
                    reason: error.to_string(),
                    removed: false,
                }
            }
        }
    }

    /// Events already delivered by upload tasks, without waiting
    pub fn drain_events(&mut self) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait for the next event from any upload task
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        self.rx.recv().await
    }

    /// Forget every upload; tasks still running report into the void
    pub fn close(&mut self) {
        self.registry.clear();
        self.rx.close();
    }
}

/// Insert the placeholders of one gesture
///
/// The first fills the trigger or lands at `ctx.at`, the rest follow it in a
/// single insertion. On failure the tree is put back as it was.
fn insert_placeholders<E: TreeEditor + ?Sized>(
    editor: &mut E,
    nodes: Vec<Node>,
    ctx: &InsertionContext,
) -> Result<(), MutationError> {
    let mut nodes = nodes.into_iter();
    let Some(first) = nodes.next() else {
        return Ok(());
    };
    let rest: Vec<Node> = nodes.collect();

    let placed = place_first(editor, first, ctx)?;
    if rest.is_empty() {
        return Ok(());
    }

    let inserted = placed
        .path
        .next()
        .ok_or(MutationError::RootPath)
        .and_then(|next| editor.insert_nodes(rest, &next));
    if let Err(err) = inserted {
        roll_back(editor, placed);
        return Err(err);
    }
    Ok(())
}

/// Where the first placeholder landed and the trigger it replaced, if any
struct Placed {
    path: Path,
    replaced: Option<Node>,
}

fn place_first<E: TreeEditor + ?Sized>(
    editor: &mut E,
    node: Node,
    ctx: &InsertionContext,
) -> Result<Placed, MutationError> {
    if ctx.fill {
        if let Some(trigger) = editor.node(&ctx.at) {
            if is_fillable(trigger) {
                let trigger = editor.remove_nodes(&ctx.at)?;
                let placed = Placed {
                    path: ctx.at.clone(),
                    replaced: Some(trigger),
                };
                if let Err(err) = editor.insert_nodes(vec![node], &ctx.at) {
                    restore_trigger(editor, placed);
                    return Err(err);
                }
                return Ok(placed);
            }

            let next = ctx.at.next().ok_or(MutationError::RootPath)?;
            editor.insert_nodes(vec![node], &next)?;
            return Ok(Placed {
                path: next,
                replaced: None,
            });
        }
    }

    editor.insert_nodes(vec![node], &ctx.at)?;
    Ok(Placed {
        path: ctx.at.clone(),
        replaced: None,
    })
}

/// Take the first placeholder out again
fn roll_back<E: TreeEditor + ?Sized>(editor: &mut E, placed: Placed) {
    if let Err(err) = editor.remove_nodes(&placed.path) {
        warn!(path = %placed.path, error = %err, "Could not roll back placeholder");
        return;
    }
    restore_trigger(editor, placed);
}

fn restore_trigger<E: TreeEditor + ?Sized>(editor: &mut E, placed: Placed) {
    let Some(trigger) = placed.replaced else {
        return;
    };
    if let Err(err) = editor.insert_nodes(vec![trigger], &placed.path) {
        warn!(path = %placed.path, error = %err, "Could not restore replaced node");
    }
}

/// Empty text blocks can be replaced without losing content
fn is_fillable(node: &Node) -> bool {
    matches!(
        node.kind(),
        Some(ElementType::Paragraph) | Some(ElementType::Heading(_))
    ) && node.string().is_empty()
}
