//! Placeholder lifecycle through an edit session, with a scripted uploader

use folio_editor::{
    validate_sections, Document, EditSession, EditorConfig, Element, ElementType, FailurePolicy,
    FileBlob, MediaKind, Mutation, Node, NodeId, Path, ProgressReporter, TreeEditor, UploadError,
    UploadOutcome, UploadState, UploadedFile, Uploader,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct ScriptedUploader {
    /// File names whose upload fails
    failures: HashSet<String>,
    /// Progress reported before finishing
    progress: Vec<f64>,
}

#[async_trait::async_trait]
impl Uploader for ScriptedUploader {
    async fn upload(
        &self,
        file: FileBlob,
        progress: ProgressReporter,
    ) -> Result<UploadedFile, UploadError> {
        for pct in &self.progress {
            progress.report(*pct);
        }
        if self.failures.contains(&file.name) {
            return Err(UploadError::Transport(format!("{} timed out", file.name)));
        }
        Ok(UploadedFile::new(format!("https://cdn.example/{}", file.name)))
    }
}

struct Panicking;

#[async_trait::async_trait]
impl Uploader for Panicking {
    async fn upload(
        &self,
        _file: FileBlob,
        _progress: ProgressReporter,
    ) -> Result<UploadedFile, UploadError> {
        panic!("storage client crashed")
    }
}

fn png(name: &str) -> FileBlob {
    FileBlob::new(name, "image/png", vec![0x89, 0x50, 0x4e, 0x47]).with_dimensions(64, 48)
}

fn doc() -> Document {
    Document::new(vec![
        Element::details(vec![
            Element::summary("Screenshots").into(),
            Element::paragraph("").into(),
        ])
        .into(),
        Element::paragraph("After").into(),
    ])
}

fn session_with(uploader: ScriptedUploader) -> EditSession {
    EditSession::new("doc-42", doc(), Arc::new(uploader))
}

async fn settle(session: &mut EditSession) -> Vec<UploadOutcome> {
    tokio::time::timeout(Duration::from_secs(5), session.settle_uploads())
        .await
        .expect("uploads did not settle")
}

fn url_at(session: &EditSession, path: &Path) -> Option<String> {
    session
        .node(path)?
        .as_element()?
        .attribute_str("url")
        .map(str::to_string)
}

async fn next(session: &mut EditSession) -> UploadOutcome {
    tokio::time::timeout(Duration::from_secs(5), session.next_upload_event())
        .await
        .expect("no upload event")
        .expect("upload channel closed")
}

fn failing(names: &[&str]) -> ScriptedUploader {
    ScriptedUploader {
        failures: names.iter().map(|n| n.to_string()).collect(),
        progress: Vec::new(),
    }
}

fn has_media(doc: &Document) -> bool {
    doc.descendants()
        .iter()
        .any(|(_, node)| matches!(node.kind(), Some(ElementType::Media(_))))
}

fn resolved_ids(outcomes: &[UploadOutcome]) -> Vec<NodeId> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            UploadOutcome::Resolved { id, .. } => Some(id.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_happy_path_resolves_placeholder() {
    let mut session = session_with(ScriptedUploader::default());
    session.set_selection(Some(Path::from([0, 1])));

    let ids = session.insert_files(vec![png("cat.png")]).unwrap();
    assert_eq!(ids.len(), 1);
    let id = &ids[0];

    assert!(session.node(&Path::from([0, 1])).unwrap().is_placeholder());
    assert_eq!(session.upload_state(id), Some(UploadState::Pending { progress: 0 }));

    let outcomes = settle(&mut session).await;
    assert_eq!(
        outcomes.last(),
        Some(&UploadOutcome::Resolved {
            id: id.clone(),
            path: Path::from([0, 1]),
        })
    );

    let media = session.node(&Path::from([0, 1])).unwrap();
    assert_eq!(media.kind(), Some(&ElementType::Media(MediaKind::Image)));
    assert_eq!(media.id(), Some(id));
    assert_eq!(
        media.as_element().unwrap().attribute("width"),
        Some(&serde_json::json!(64))
    );
    assert_eq!(
        url_at(&session, &Path::from([0, 1])).as_deref(),
        Some("https://cdn.example/cat.png")
    );
    assert_eq!(session.upload_state(id), None);
    assert!(session.document().placeholder_ids().is_empty());
}

#[tokio::test]
async fn test_progress_is_tracked_until_resolution() {
    let mut session = session_with(ScriptedUploader {
        failures: HashSet::new(),
        progress: vec![25.0, 75.0],
    });
    let id = session.insert_files(vec![png("cat.png")]).unwrap().remove(0);

    assert_eq!(
        next(&mut session).await,
        UploadOutcome::Progress {
            id: id.clone(),
            progress: 25
        }
    );
    assert_eq!(session.upload_state(&id), Some(UploadState::Pending { progress: 25 }));

    assert_eq!(
        next(&mut session).await,
        UploadOutcome::Progress {
            id: id.clone(),
            progress: 75
        }
    );
    assert!(matches!(next(&mut session).await, UploadOutcome::Resolved { .. }));
    assert_eq!(session.upload_state(&id), None);
}

#[tokio::test]
async fn test_deleted_placeholder_resolves_as_noop() {
    let mut session = session_with(ScriptedUploader::default());
    session.set_selection(Some(Path::from([0, 1])));
    let id = session.insert_files(vec![png("cat.png")]).unwrap().remove(0);

    // The user deletes the placeholder before the upload result is applied
    session
        .apply(Mutation::RemoveNode {
            at: Path::from([0, 1]),
        })
        .unwrap();
    let before = session.document().clone();

    let outcomes = settle(&mut session).await;
    assert_eq!(outcomes.last(), Some(&UploadOutcome::Stale { id: id.clone() }));
    assert_eq!(session.document(), &before);
    assert!(!has_media(session.document()));
    assert_eq!(session.upload_state(&id), None);

    // Undoing the deletion brings back the uploaded media, not a dead placeholder
    session.undo().unwrap();
    assert_eq!(
        url_at(&session, &Path::from([0, 1])).as_deref(),
        Some("https://cdn.example/cat.png")
    );
    assert!(session.document().placeholder_ids().is_empty());
}

#[tokio::test]
async fn test_fan_out_failures_are_independent() {
    let mut session = session_with(failing(&["b.png"]));
    session.set_selection(Some(Path::from([0, 1])));

    let ids = session
        .insert_files(vec![png("a.png"), png("b.png"), png("c.png")])
        .unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
    for (offset, id) in ids.iter().enumerate() {
        assert_eq!(session.find_path(id), Some(Path::from([0, 1 + offset])));
        assert!(session.uploads().is_pending(id));
    }
    assert_eq!(session.uploads().in_flight(), 3);

    let outcomes = settle(&mut session).await;
    let mut resolved = resolved_ids(&outcomes);
    resolved.sort();
    let mut expected = vec![ids[0].clone(), ids[2].clone()];
    expected.sort();
    assert_eq!(resolved, expected);

    assert_eq!(
        url_at(&session, &Path::from([0, 1])).as_deref(),
        Some("https://cdn.example/a.png")
    );
    assert!(session.node(&Path::from([0, 2])).unwrap().is_placeholder());
    assert_eq!(
        url_at(&session, &Path::from([0, 3])).as_deref(),
        Some("https://cdn.example/c.png")
    );
    assert_eq!(
        session.upload_state(&ids[1]),
        Some(UploadState::Failed {
            reason: "Upload transport failed: b.png timed out".to_string()
        })
    );
}

#[tokio::test]
async fn test_second_start_is_a_noop() {
    let mut session = session_with(ScriptedUploader::default());
    let id = session.insert_files(vec![png("cat.png")]).unwrap().remove(0);

    assert!(!session.start_upload(&id));
    settle(&mut session).await;
    assert!(!session.start_upload(&id));

    // Exactly one terminal event was produced
    assert!(session.drain_upload_events().is_empty());
}

#[tokio::test]
async fn test_remove_policy_drops_placeholder_and_repairs_section() {
    let config = EditorConfig {
        uploads: folio_editor::UploadConfig {
            failure_policy: FailurePolicy::Remove,
            ..Default::default()
        },
        ..EditorConfig::default()
    };
    let mut session = EditSession::with_config("doc-42", doc(), Arc::new(failing(&["bad.png"])), config);
    session.set_selection(Some(Path::from([0, 1])));
    let id = session.insert_files(vec![png("bad.png")]).unwrap().remove(0);

    let outcomes = settle(&mut session).await;
    assert!(matches!(
        outcomes.last(),
        Some(UploadOutcome::Failed { removed: true, .. })
    ));

    assert_eq!(session.find_path(&id), None);
    let section = session.node(&Path::from([0])).unwrap().children().unwrap();
    assert_eq!(section.len(), 2);
    assert_eq!(section[1].kind(), Some(&ElementType::Paragraph));
    assert!(validate_sections(session.document()).is_empty());
}

#[tokio::test]
async fn test_retry_starts_a_fresh_lifecycle() {
    let mut session = session_with(failing(&["flaky.png"]));
    session.set_selection(Some(Path::from([0, 1])));
    let id = session.insert_files(vec![png("flaky.png")]).unwrap().remove(0);

    settle(&mut session).await;
    assert!(matches!(session.upload_state(&id), Some(UploadState::Failed { .. })));
    assert!(session.node(&Path::from([0, 1])).unwrap().is_placeholder());

    let retried = session.retry_upload(&id, png("fixed.png")).unwrap().unwrap();
    assert_ne!(retried, id);
    assert_eq!(session.upload_state(&id), None);
    assert_eq!(session.find_path(&retried), Some(Path::from([0, 1])));

    let outcomes = settle(&mut session).await;
    assert_eq!(resolved_ids(&outcomes), vec![retried]);
    assert_eq!(
        url_at(&session, &Path::from([0, 1])).as_deref(),
        Some("https://cdn.example/fixed.png")
    );
}

#[tokio::test]
async fn test_paste_into_label_lands_in_body() {
    let mut session = session_with(ScriptedUploader::default());
    session.set_selection(Some(Path::from([0, 0, 0])));

    let id = session.insert_files(vec![png("cat.png")]).unwrap().remove(0);

    assert_eq!(session.find_path(&id), Some(Path::from([0, 1])));
    assert_eq!(session.node(&Path::from([0, 0])).unwrap().string(), "Screenshots");
    assert!(validate_sections(session.document()).is_empty());

    settle(&mut session).await;
    assert!(url_at(&session, &Path::from([0, 1])).is_some());
}

#[tokio::test]
async fn test_paste_is_one_undo_step_and_replays_resolved_media() {
    let mut session = session_with(ScriptedUploader::default());
    let id = session.insert_files(vec![png("cat.png")]).unwrap().remove(0);
    assert_eq!(session.find_path(&id), Some(Path::from([2])));

    settle(&mut session).await;
    assert!(url_at(&session, &Path::from([2])).is_some());

    session.undo().unwrap();
    assert_eq!(session.document(), &doc());
    assert!(!session.can_undo());

    session.redo().unwrap();
    let node = session.node(&Path::from([2])).unwrap();
    assert!(!node.is_placeholder());
    assert_eq!(node.id(), Some(&id));
    assert!(url_at(&session, &Path::from([2])).is_some());
}

#[tokio::test]
async fn test_undone_paste_resolves_into_history() {
    let mut session = session_with(ScriptedUploader::default());
    let id = session.insert_files(vec![png("cat.png")]).unwrap().remove(0);

    session.undo().unwrap();
    let outcomes = settle(&mut session).await;
    assert_eq!(outcomes.last(), Some(&UploadOutcome::Stale { id: id.clone() }));
    assert_eq!(session.document(), &doc());

    session.redo().unwrap();
    let node: &Node = session.node(&Path::from([2])).unwrap();
    assert_eq!(node.kind(), Some(&ElementType::Media(MediaKind::Image)));
}

#[tokio::test]
async fn test_panicking_uploader_becomes_failure() {
    let mut session = EditSession::new("doc-42", doc(), Arc::new(Panicking));
    let id = session.insert_files(vec![png("cat.png")]).unwrap().remove(0);

    let outcomes = settle(&mut session).await;
    match outcomes.last() {
        Some(UploadOutcome::Failed { reason, removed, .. }) => {
            assert!(reason.starts_with("Upload task aborted"), "{}", reason);
            assert!(!removed);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(matches!(session.upload_state(&id), Some(UploadState::Failed { .. })));
}

#[tokio::test]
async fn test_closed_session_persists_without_placeholders() {
    let mut session = session_with(ScriptedUploader::default());
    session.insert_files(vec![png("cat.png")]).unwrap();
    assert_eq!(session.persistable_document().placeholder_ids().len(), 1);

    session.close();

    assert!(settle(&mut session).await.is_empty());
    let persisted = session.persistable_document();
    assert!(persisted.placeholder_ids().is_empty());
    assert_eq!(persisted, doc());
}

#[tokio::test]
async fn test_reopened_document_never_reuses_placeholder_ids() {
    let mut first = session_with(failing(&["old.png"]));
    first.set_selection(Some(Path::from([0, 1])));
    let old = first.insert_files(vec![png("old.png")]).unwrap().remove(0);
    settle(&mut first).await;
    let persisted = first.persistable_document();
    assert_eq!(persisted.placeholder_ids(), vec![old.clone()]);

    // Same session name, so ids come from the same seed
    let mut reopened = EditSession::new("doc-42", persisted, Arc::new(ScriptedUploader::default()));
    let new = reopened.insert_files(vec![png("new.png")]).unwrap().remove(0);
    assert_ne!(new, old);

    let outcomes = settle(&mut reopened).await;
    assert_eq!(resolved_ids(&outcomes), vec![new.clone()]);

    assert!(reopened.node(&Path::from([0, 1])).unwrap().is_placeholder());
    assert_eq!(reopened.find_path(&old), Some(Path::from([0, 1])));
    assert_eq!(
        url_at(&reopened, &Path::from([2])).as_deref(),
        Some("https://cdn.example/new.png")
    );
    assert_eq!(reopened.document().placeholder_ids(), vec![old]);
}
