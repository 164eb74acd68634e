use std::fmt;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::xpath::XPath;
use crate::error::IoError;

/// Index of an element in its document. Ids increase in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Element(NodeId),
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    content: Vec<Content>,
    /// Byte span of the outer XML in the source.
    start: usize,
    end: usize,
    /// One past the last descendant id; descendants are `id + 1..subtree_end`.
    subtree_end: usize,
}

/// A parsed XML document.
///
/// Elements live in an arena in document order. Comments, processing
/// instructions and declarations are dropped; text and CDATA are kept
/// unescaped. Each element remembers the span of its outer XML so matched
/// content can be decoded straight from the source text.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    source: String,
    elements: Vec<Element>,
}

impl XmlDocument {
    pub fn parse(source: impl Into<String>) -> Result<Self, IoError> {
        let source = source.into();
        let elements = build_tree(&source)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(elements = elements.len(), "parsed XML document");
        Ok(Self { source, elements })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
        Self::parse(source)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            doc: self,
            id: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.0 < self.elements.len()).then_some(Node { doc: self, id })
    }

    /// Number of elements in the document.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Evaluate `xpath` with the document node as context.
    pub fn select(&self, xpath: &XPath) -> Vec<Node<'_>> {
        xpath
            .evaluate(self, None)
            .into_iter()
            .map(|id| Node { doc: self, id })
            .collect()
    }

    /// Parse and evaluate an expression in one step.
    pub fn select_str(&self, expression: &str) -> Result<Vec<Node<'_>>, IoError> {
        Ok(self.select(&XPath::parse(expression)?))
    }

    fn element(&self, id: NodeId) -> &Element {
        &self.elements[id.0]
    }

    /// Child elements of `parent`; `None` stands for the document node.
    pub(crate) fn child_ids(&self, parent: Option<NodeId>) -> Vec<NodeId> {
        match parent {
            None if self.elements.is_empty() => Vec::new(),
            None => vec![NodeId(0)],
            Some(id) => self
                .element(id)
                .content
                .iter()
                .filter_map(|c| match c {
                    Content::Element(child) => Some(*child),
                    Content::Text(_) => None,
                })
                .collect(),
        }
    }

    pub(crate) fn descendant_ids(&self, context: Option<NodeId>) -> std::ops::Range<usize> {
        match context {
            None => 0..self.elements.len(),
            Some(id) => id.0 + 1..self.element(id).subtree_end,
        }
    }

    pub(crate) fn parent_id(&self, id: NodeId) -> Option<NodeId> {
        self.element(id).parent
    }

    pub(crate) fn name_of(&self, id: NodeId) -> &str {
        &self.element(id).name
    }

    pub(crate) fn node_id(&self, index: usize) -> NodeId {
        NodeId(index)
    }
}

/// A borrowed element of an [`XmlDocument`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a XmlDocument,
    id: NodeId,
}

impl<'a> Node<'a> {
    fn element(&self) -> &'a Element {
        &self.doc.elements[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a XmlDocument {
        self.doc
    }

    /// Qualified tag name, prefix included.
    pub fn name(&self) -> &'a str {
        &self.element().name
    }

    pub fn local_name(&self) -> &'a str {
        let name = self.name();
        name.rsplit_once(':').map_or(name, |(_, local)| local)
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.element()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attributes in source order, namespace declarations included.
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.element()
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.element().parent.map(|id| Node { doc: self.doc, id })
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        self.element().content.iter().filter_map(move |c| match c {
            Content::Element(id) => Some(Node { doc, id: *id }),
            Content::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<Node<'a>> {
        self.children().find(|c| c.name() == name)
    }

    /// Text directly inside this element, children excluded.
    pub fn text(&self) -> String {
        self.element()
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    /// All descendant text in document order.
    pub fn string_value(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for content in &self.element().content {
            match content {
                Content::Text(t) => out.push_str(t),
                Content::Element(id) => Node {
                    doc: self.doc,
                    id: *id,
                }
                .collect_text(out),
            }
        }
    }

    /// The element's source text, from its start tag through its end tag.
    pub fn outer_xml(&self) -> &'a str {
        let element = self.element();
        &self.doc.source[element.start..element.end]
    }

    /// Evaluate `xpath` with this element as context.
    pub fn select(&self, xpath: &XPath) -> Vec<Node<'a>> {
        let doc = self.doc;
        xpath
            .evaluate(doc, Some(self.id))
            .into_iter()
            .map(|id| Node { doc, id })
            .collect()
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.doc, other.doc)
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id.0)
            .field("name", &self.name())
            .finish()
    }
}

fn build_tree(source: &str) -> Result<Vec<Element>, IoError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    let mut elements: Vec<Element> = Vec::new();
    let mut open: Vec<NodeId> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                return Err(IoError::xml(
                    reader.error_position() as usize,
                    err.to_string(),
                ));
            }
        };
        match event {
            Event::Start(start) => {
                let id = open_element(&mut elements, &open, &start, before)?;
                open.push(id);
            }
            Event::Empty(start) => {
                let id = open_element(&mut elements, &open, &start, before)?;
                close_element(&mut elements, id, reader.buffer_position() as usize);
            }
            Event::End(_) => {
                let id = open
                    .pop()
                    .ok_or_else(|| IoError::xml(before, "unexpected closing tag"))?;
                close_element(&mut elements, id, reader.buffer_position() as usize);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| IoError::xml(before, e.to_string()))?;
                push_text(&mut elements, &open, &text, before)?;
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| IoError::xml(before, e.to_string()))?;
                push_text(&mut elements, &open, text, before)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(id) = open.last() {
        return Err(IoError::xml(
            source.len(),
            format!("element <{}> is never closed", elements[id.0].name),
        ));
    }
    if elements.is_empty() {
        return Err(IoError::xml(0, "document has no root element"));
    }
    Ok(elements)
}

fn open_element(
    elements: &mut Vec<Element>,
    open: &[NodeId],
    start: &BytesStart<'_>,
    position: usize,
) -> Result<NodeId, IoError> {
    if open.is_empty() && !elements.is_empty() {
        return Err(IoError::xml(position, "document has more than one root element"));
    }
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| IoError::xml(position, format!("invalid tag name: {e}")))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| IoError::xml(position, e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| IoError::xml(position, format!("invalid attribute name: {e}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| IoError::xml(position, e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    let id = NodeId(elements.len());
    let parent = open.last().copied();
    if let Some(parent) = parent {
        elements[parent.0].content.push(Content::Element(id));
    }
    elements.push(Element {
        name,
        attributes,
        parent,
        content: Vec::new(),
        start: position,
        end: position,
        subtree_end: id.0 + 1,
    });
    Ok(id)
}

fn close_element(elements: &mut [Element], id: NodeId, end: usize) {
    let subtree_end = elements.len();
    let element = &mut elements[id.0];
    element.end = end;
    element.subtree_end = subtree_end;
}

fn push_text(
    elements: &mut [Element],
    open: &[NodeId],
    text: &str,
    position: usize,
) -> Result<(), IoError> {
    match open.last() {
        Some(id) => {
            elements[id.0].content.push(Content::Text(text.to_string()));
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(IoError::xml(position, "text outside the root element")),
    }
}
