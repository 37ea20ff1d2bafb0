//! Placeholder and resolved media nodes.

use super::uploader::{FileBlob, UploadedFile};
use folio_document::{Element, ElementType, MediaKind, Node, NodeId};

/// Node standing in for `file` until its upload completes
pub fn placeholder_node(id: &NodeId, file: &FileBlob) -> Node {
    let element = Element::new(ElementType::Placeholder)
        .with_id(id.clone())
        .with_attribute("media", file.media_kind().as_str())
        .with_attribute("name", file.name.as_str());

    with_dimensions(element, file).into()
}

/// Media node replacing the placeholder for `file`; keeps the same id
pub fn resolved_node(id: &NodeId, file: &FileBlob, uploaded: &UploadedFile) -> Node {
    let name = uploaded.name.as_deref().unwrap_or(&file.name);
    let element = Element::new(ElementType::Media(file.media_kind()))
        .with_id(id.clone())
        .with_attribute("url", uploaded.url.as_str())
        .with_attribute("name", name);

    with_dimensions(element, file).into()
}

/// Media kind a placeholder node stands for
pub fn placeholder_media(node: &Node) -> Option<MediaKind> {
    let element = node.as_element()?;
    if element.kind != ElementType::Placeholder {
        return None;
    }
    element.attribute_str("media").and_then(MediaKind::parse)
}

fn with_dimensions(element: Element, file: &FileBlob) -> Element {
    let element = match file.dimensions {
        Some((width, height)) => element
            .with_attribute("width", width)
            .with_attribute("height", height),
        None => element,
    };
    // Void elements keep one empty text child so the cursor can land on them
    element.with_children(vec![Node::empty_text()])
}
