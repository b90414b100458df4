//! In-memory element tree.

use super::name::{parse_path, XmlName};

/// One node of a parsed XML tree.
///
/// Elements keep the prefix they were parsed with and their attribute list in
/// document order (including `xmlns` declarations), so a document serializes
/// back in the form the server sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: XmlName,
    prefix: Option<String>,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// Creates an element with no prefix, attributes, text or children.
    pub fn new(name: XmlName) -> Self {
        Element {
            name,
            prefix: None,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Creates an element that serializes with the given prefix.
    pub fn with_prefix(name: XmlName, prefix: impl Into<String>) -> Self {
        Element {
            prefix: Some(prefix.into()),
            ..Element::new(name)
        }
    }

    /// The resolved name of this element.
    pub fn name(&self) -> &XmlName {
        &self.name
    }

    /// The prefix this element was parsed (or created) with.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The name as it appears on the wire: `prefix:local` or `local`.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.name.local_name()),
            None => self.name.local_name().to_owned(),
        }
    }

    /// The value of an attribute, by its raw (wire) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing an existing one of the same name.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// The text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Sets the text content.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub(crate) fn push_text(&mut self, chunk: &str) {
        match &mut self.text {
            Some(t) => t.push_str(chunk),
            None => self.text = Some(chunk.to_owned()),
        }
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Appends a child element and returns a mutable reference to it.
    pub fn append_child(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        // Just pushed, so the list is non-empty.
        let idx = self.children.len() - 1;
        &mut self.children[idx]
    }

    /// The first child with the given resolved name.
    pub fn child(&self, name: &XmlName) -> Option<&Element> {
        self.children.iter().find(|c| c.name == *name)
    }

    /// All children with the given resolved name.
    pub fn children_named<'a>(&'a self, name: &'a XmlName) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == *name)
    }

    /// The first element matching a path expression, or `None` if absent.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_segments(&parse_path(path)).into_iter().next()
    }

    /// All elements matching a path expression; empty if none match.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        self.find_segments(&parse_path(path))
    }

    fn find_segments<'a>(&'a self, segments: &[XmlName]) -> Vec<&'a Element> {
        match segments.split_first() {
            None => vec![self],
            Some((head, rest)) => self
                .children
                .iter()
                .filter(|c| c.name == *head)
                .flat_map(|c| c.find_segments(rest))
                .collect(),
        }
    }

    /// Walks the segments, creating any missing element along the way, and
    /// returns the leaf.
    pub(crate) fn find_or_create(&mut self, segments: &[XmlName]) -> &mut Element {
        match segments.split_first() {
            None => self,
            Some((head, rest)) => {
                let idx = match self.children.iter().position(|c| c.name == *head) {
                    Some(idx) => idx,
                    None => {
                        self.children.push(Element::new(head.clone()));
                        self.children.len() - 1
                    }
                };
                self.children[idx].find_or_create(rest)
            }
        }
    }
}
