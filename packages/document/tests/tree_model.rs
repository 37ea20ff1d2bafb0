use folio_document::{
    Document, Element, ElementType, IdGenerator, MediaKind, Mutation, MutationError, Node, Path,
    TreeEditor,
};

const PERSISTED: &str = r#"[
    {"type": "h2", "children": [{"text": "Release notes"}]},
    {"type": "details", "id": "sec-1", "open": true, "children": [
        {"type": "summary", "children": [{"text": "Known issues", "bold": true}]},
        {"type": "p", "children": [{"text": "None so far."}]},
        {"type": "img", "id": "img-1", "url": "https://cdn.example/a.png", "children": [{"text": ""}]}
    ]},
    {"type": "callout", "children": [{"text": "Custom block"}]}
]"#;

#[test]
fn test_parse_persisted_document() {
    let doc = Document::from_json(PERSISTED).unwrap();

    assert_eq!(doc.children.len(), 3);
    assert_eq!(doc.children[0].kind(), Some(&ElementType::Heading(2)));
    assert_eq!(
        doc.children[2].kind(),
        Some(&ElementType::Custom("callout".to_string()))
    );
    assert_eq!(doc.details_paths(), vec![Path::from([1])]);

    let section = doc.element(&Path::from([1])).unwrap();
    assert_eq!(section.attribute("open"), Some(&serde_json::json!(true)));

    let label = doc.node(&Path::from([1, 0, 0])).unwrap().as_text().unwrap();
    assert_eq!(label.marks.get("bold"), Some(&serde_json::json!(true)));

    let image = doc.find_path(&"img-1".into()).unwrap();
    assert_eq!(image, Path::from([1, 2]));
    assert_eq!(
        doc.node(&image).unwrap().kind(),
        Some(&ElementType::Media(MediaKind::Image))
    );
}

#[test]
fn test_persisted_document_survives_reserialization() {
    let doc = Document::from_json(PERSISTED).unwrap();
    let again = Document::from_json(&doc.to_json_pretty().unwrap()).unwrap();
    assert_eq!(doc, again);
}

#[test]
fn test_inverses_replay_to_original() {
    let original = Document::from_json(PERSISTED).unwrap();
    let mut doc = original.clone();

    let mutations = vec![
        Mutation::InsertNodes {
            at: Path::from([1, 1]),
            nodes: vec![
                Element::paragraph("one").into(),
                Element::paragraph("two").into(),
            ],
        },
        Mutation::MoveNode {
            from: Path::from([1, 4]),
            to: Path::from([0]),
        },
        Mutation::RemoveNode {
            at: Path::from([3]),
        },
    ];

    let mut inverses = Vec::new();
    for mutation in &mutations {
        let mut inverse = mutation.to_inverse(&doc).unwrap();
        mutation.apply(&mut doc).unwrap();
        inverse.extend(inverses);
        inverses = inverse;
    }

    assert_eq!(doc.children.len(), 3);
    assert_eq!(doc.find_path(&"img-1".into()), Some(Path::from([0])));

    for inverse in &inverses {
        inverse.apply(&mut doc).unwrap();
    }
    assert_eq!(doc, original);
}

#[test]
fn test_rejected_mutation_leaves_tree_untouched() {
    let mut doc = Document::from_json(PERSISTED).unwrap();
    let before = doc.clone();

    let err = Mutation::InsertNodes {
        at: Path::from([1, 9]),
        nodes: vec![Node::text("x")],
    }
    .apply(&mut doc)
    .unwrap_err();
    assert!(matches!(err, MutationError::OutOfBounds { index: 9, .. }));

    assert!(doc.move_nodes(&Path::from([1, 0]), &Path::from([7])).is_err());
    assert_eq!(doc, before);
}

#[test]
fn test_document_is_a_tree_editor() {
    let mut doc = Document::new(vec![Element::paragraph("a").into()]);
    let mut ids = IdGenerator::new("tree-model");
    let id = ids.new_id();

    doc.insert_nodes(
        vec![Element::new(ElementType::Placeholder).with_id(id.clone()).into()],
        &Path::from([1]),
    )
    .unwrap();
    assert_eq!(doc.find_path(&id), Some(Path::from([1])));
    assert_eq!(doc.placeholder_ids(), vec![id.clone()]);

    let removed = doc.without_history(|doc| doc.remove_nodes(&Path::from([1]))).unwrap();
    assert_eq!(removed.id(), Some(&id));
    assert!(doc.placeholder_ids().is_empty());
}
