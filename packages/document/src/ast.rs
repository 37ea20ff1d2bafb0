use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Stable node identifier, independent of the node's position in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of embedded media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    File,
}

impl MediaKind {
    /// Element tag of the resolved media node
    pub fn tag(&self) -> &'static str {
        match self {
            MediaKind::Image => "img",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::File => "file",
        }
    }

    /// Value of the `media` attribute on a placeholder
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::File => "file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(MediaKind::Image),
            "audio" => Some(MediaKind::Audio),
            "video" => Some(MediaKind::Video),
            "file" => Some(MediaKind::File),
            _ => None,
        }
    }

    /// Guess the media kind from a MIME type (`image/png` → Image)
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or_default() {
            "image" => MediaKind::Image,
            "audio" => MediaKind::Audio,
            "video" => MediaKind::Video,
            _ => MediaKind::File,
        }
    }
}

/// Element type tag
///
/// Serialized as the bare tag string (`"p"`, `"details"`, ...). Unknown tags
/// survive a round trip as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Paragraph,
    Heading(u8),
    Blockquote,
    CodeBlock,
    BulletedList,
    NumberedList,
    ListItem,
    HorizontalRule,
    /// Collapsible section container
    Details,
    /// Label of a collapsible section
    Summary,
    /// Resolved media node
    Media(MediaKind),
    /// Media whose upload has not completed yet
    Placeholder,
    Link,
    Mention,
    Custom(String),
}

impl ElementType {
    pub fn tag(&self) -> String {
        match self {
            ElementType::Paragraph => "p".to_string(),
            ElementType::Heading(level) => format!("h{}", level),
            ElementType::Blockquote => "blockquote".to_string(),
            ElementType::CodeBlock => "code_block".to_string(),
            ElementType::BulletedList => "ul".to_string(),
            ElementType::NumberedList => "ol".to_string(),
            ElementType::ListItem => "li".to_string(),
            ElementType::HorizontalRule => "hr".to_string(),
            ElementType::Details => "details".to_string(),
            ElementType::Summary => "summary".to_string(),
            ElementType::Media(kind) => kind.tag().to_string(),
            ElementType::Placeholder => "placeholder".to_string(),
            ElementType::Link => "a".to_string(),
            ElementType::Mention => "mention".to_string(),
            ElementType::Custom(tag) => tag.clone(),
        }
    }

    /// Block-level elements may not live inside a section label
    pub fn is_block(&self) -> bool {
        match self {
            ElementType::Paragraph
            | ElementType::Heading(_)
            | ElementType::Blockquote
            | ElementType::CodeBlock
            | ElementType::BulletedList
            | ElementType::NumberedList
            | ElementType::ListItem
            | ElementType::HorizontalRule
            | ElementType::Details
            | ElementType::Summary
            | ElementType::Media(_)
            | ElementType::Placeholder => true,
            ElementType::Link | ElementType::Mention | ElementType::Custom(_) => false,
        }
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "p" => ElementType::Paragraph,
            "blockquote" => ElementType::Blockquote,
            "code_block" => ElementType::CodeBlock,
            "ul" => ElementType::BulletedList,
            "ol" => ElementType::NumberedList,
            "li" => ElementType::ListItem,
            "hr" => ElementType::HorizontalRule,
            "details" => ElementType::Details,
            "summary" => ElementType::Summary,
            "img" => ElementType::Media(MediaKind::Image),
            "audio" => ElementType::Media(MediaKind::Audio),
            "video" => ElementType::Media(MediaKind::Video),
            "file" => ElementType::Media(MediaKind::File),
            "placeholder" => ElementType::Placeholder,
            "a" => ElementType::Link,
            "mention" => ElementType::Mention,
            other => match other.strip_prefix('h').and_then(|n| n.parse::<u8>().ok()) {
                Some(level @ 1..=6) => ElementType::Heading(level),
                _ => ElementType::Custom(tag),
            },
        }
    }
}

impl From<ElementType> for String {
    fn from(kind: ElementType) -> Self {
        kind.tag()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Leaf node holding an immutable string payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,

    /// Formatting marks (`bold`, `italic`, ...), carried through untouched
    #[serde(flatten)]
    pub marks: BTreeMap<String, Value>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: BTreeMap::new(),
        }
    }
}

/// Element node: a type tag plus an ordered list of children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: ElementType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,

    #[serde(default)]
    pub children: Vec<Node>,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Element {
    pub fn new(kind: ElementType) -> Self {
        Self {
            kind,
            id: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Paragraph holding a single text run
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(ElementType::Paragraph).with_children(vec![Node::text(text)])
    }

    /// Section label holding a single text run
    pub fn summary(text: impl Into<String>) -> Self {
        Self::new(ElementType::Summary).with_children(vec![Node::text(text)])
    }

    pub fn details(children: Vec<Node>) -> Self {
        Self::new(ElementType::Details).with_children(children)
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }
}

/// Document tree node
///
/// Elements are tried first when deserializing: every element carries a
/// `type` key, text nodes never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn empty_text() -> Self {
        Node::Text(Text::new(""))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn kind(&self) -> Option<&ElementType> {
        self.as_element().map(|e| &e.kind)
    }

    pub fn id(&self) -> Option<&NodeId> {
        self.as_element().and_then(|e| e.id.as_ref())
    }

    pub fn children(&self) -> Option<&Vec<Node>> {
        self.as_element().map(|e| &e.children)
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.as_element_mut().map(|e| &mut e.children)
    }

    pub fn is_block(&self) -> bool {
        match self {
            Node::Element(element) => element.kind.is_block(),
            Node::Text(_) => false,
        }
    }

    pub fn is_inline(&self) -> bool {
        !self.is_block()
    }

    pub fn is_details(&self) -> bool {
        matches!(self.kind(), Some(ElementType::Details))
    }

    pub fn is_summary(&self) -> bool {
        matches!(self.kind(), Some(ElementType::Summary))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind(), Some(ElementType::Placeholder))
    }

    /// Concatenated text of this node and its descendants
    pub fn string(&self) -> String {
        match self {
            Node::Text(text) => text.text.clone(),
            Node::Element(element) => element.children.iter().map(Node::string).collect(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}
