//! The wrapped document: one parsed tree, its source URI, and a dirty flag.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};

use super::element::Element;
use super::name::{parse_path, XmlName, XmlTag};

/// Errors raised while parsing or serializing a document.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// XML syntax or escaping error from the underlying parser.
    #[error("XML parsing error: {0}")]
    Parse(#[from] quick_xml::Error),

    /// An element used a namespace prefix with no in-scope binding.
    #[error("unbound namespace prefix `{0}`")]
    UnboundPrefix(String),

    /// Non-UTF-8 bytes in a name or CDATA section.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The input contained no root element.
    #[error("document has no root element")]
    NoRoot,

    /// I/O error while writing the serialized form.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed XML document plus its canonical URI and a dirty flag.
///
/// All in-memory mutation goes through helpers on this type; every mutating
/// helper marks the document dirty so a save pass can skip documents that
/// were never touched.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
    uri: Option<String>,
    dirty: bool,
}

impl Document {
    /// Wraps an existing element tree. The URI is taken from the root's
    /// `uri` attribute when present.
    ///
    /// Prefixes that were resolved against declarations on an enclosing
    /// document (e.g. a subtree extracted from a batch response) are
    /// re-declared on the root, so a detached tree stays self-contained.
    pub fn new(root: Element) -> Self {
        let mut root = root;
        let mut scope = Vec::new();
        let mut missing = Vec::new();
        collect_missing_prefixes(&root, &mut scope, &mut missing);
        for (prefix, ns) in missing {
            root.set_attr(format!("xmlns:{prefix}"), ns);
        }

        let uri = root.attr("uri").map(str::to_owned);
        Document {
            root,
            uri,
            dirty: false,
        }
    }

    /// Creates an empty document for a new record: a lone root element with
    /// the entity's tag and, when namespaced, the matching `xmlns`
    /// declaration.
    pub fn empty(tag: XmlTag, prefix: Option<&str>) -> Self {
        let mut root = match prefix {
            Some(p) => Element::with_prefix(tag.to_name(), p),
            None => Element::new(tag.to_name()),
        };
        if let Some(ns) = tag.namespace {
            match prefix {
                Some(p) => root.set_attr(format!("xmlns:{p}"), ns),
                None => root.set_attr("xmlns", ns),
            }
        }
        Document {
            root,
            uri: None,
            dirty: false,
        }
    }

    /// Parses a document from its serialized form.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_resolved_event()? {
                (resolve, Event::Start(e)) => {
                    let element = element_from_start(resolve, &e)?;
                    stack.push(element);
                }
                (resolve, Event::Empty(e)) => {
                    let element = element_from_start(resolve, &e)?;
                    attach(&mut stack, &mut root, element);
                }
                (_, Event::Text(t)) => {
                    if let Some(top) = stack.last_mut() {
                        let text = t.unescape()?;
                        if !text.is_empty() {
                            top.push_text(&text);
                        }
                    }
                }
                (_, Event::CData(t)) => {
                    if let Some(top) = stack.last_mut() {
                        top.push_text(std::str::from_utf8(&t)?);
                    }
                }
                (_, Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }

        root.map(Document::new).ok_or(XmlError::NoRoot)
    }

    /// Serializes the tree back to XML, preserving prefixes and attribute
    /// order.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        write_element(&mut writer, &self.root)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// The root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The canonical URI this document was fetched from, if any.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Overrides the canonical URI.
    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = Some(uri.into());
    }

    /// Whether any mutating helper has touched this document since it was
    /// parsed or last marked clean.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag, e.g. after a successful save.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// The first element matching `path`, or `None` if absent.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.root.find(path)
    }

    /// All elements matching `path`; empty if none match.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        self.root.find_all(path)
    }

    /// The text content of the subnode at `path`, or `None` if absent.
    pub fn get_text(&self, path: &str) -> Option<&str> {
        self.root.find(path).and_then(|e| e.text())
    }

    /// Sets the text of the subnode at `path`, creating missing parents
    /// along the way, and marks the document dirty.
    ///
    /// This is the central mutation primitive; every writable descriptor
    /// funnels through it.
    pub fn set_text(&mut self, path: &str, value: &str) {
        let segments = parse_path(path);
        self.root.find_or_create(&segments).set_text(value);
        self.dirty = true;
    }

    /// The value of `attr` on the subnode at `path` (`.` addresses the
    /// root), or `None` if the subnode or attribute is absent.
    pub fn get_attribute(&self, path: &str, attr: &str) -> Option<&str> {
        self.root.find(path).and_then(|e| e.attr(attr))
    }

    /// Sets `attr` on the subnode at `path`, creating missing elements along
    /// the way, and marks the document dirty.
    pub fn set_attribute(&mut self, path: &str, attr: &str, value: &str) {
        let segments = parse_path(path);
        self.root.find_or_create(&segments).set_attr(attr, value);
        self.dirty = true;
    }

    /// Explicit auto-vivification: returns the element at `path`, creating
    /// it and any missing parents, and marks the document dirty.
    ///
    /// Used by writers that need to set attributes rather than text.
    pub fn make_subelement_with_parents(&mut self, path: &str) -> &mut Element {
        let segments = parse_path(path);
        self.dirty = true;
        self.root.find_or_create(&segments)
    }
}

fn collect_missing_prefixes(
    el: &Element,
    scope: &mut Vec<String>,
    missing: &mut Vec<(String, String)>,
) {
    let declared: Vec<String> = el
        .attributes()
        .iter()
        .filter_map(|(k, _)| k.strip_prefix("xmlns:").map(str::to_owned))
        .collect();
    let added = declared.len();
    scope.extend(declared);

    if let (Some(prefix), Some(ns)) = (el.prefix(), el.name().namespace()) {
        if !scope.iter().any(|s| s == prefix) && !missing.iter().any(|(p, _)| p == prefix) {
            missing.push((prefix.to_owned(), ns.to_owned()));
        }
    }
    for child in el.children() {
        collect_missing_prefixes(child, scope, missing);
    }
    scope.truncate(scope.len() - added);
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => {
            parent.append_child(element);
        }
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn element_from_start(
    resolve: ResolveResult<'_>,
    e: &BytesStart<'_>,
) -> Result<Element, XmlError> {
    let local = std::str::from_utf8(e.local_name().into_inner())?.to_owned();
    let prefix = match e.name().prefix() {
        Some(p) => Some(std::str::from_utf8(p.into_inner())?.to_owned()),
        None => None,
    };
    let name = match resolve {
        ResolveResult::Bound(ns) => {
            XmlName::namespaced(String::from_utf8_lossy(ns.into_inner()), local)
        }
        ResolveResult::Unbound => XmlName::local(local),
        ResolveResult::Unknown(p) => {
            return Err(XmlError::UnboundPrefix(
                String::from_utf8_lossy(&p).into_owned(),
            ))
        }
    };

    let mut element = match prefix {
        Some(p) => Element::with_prefix(name, p),
        None => Element::new(name),
    };
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_owned();
        let value = attr
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        element.set_attr(key, value);
    }
    Ok(element)
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, el: &Element) -> Result<(), XmlError> {
    let name = el.qualified_name();
    let mut start = BytesStart::new(name.as_str());
    for (key, value) in el.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.text().is_none() && el.children().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = el.text() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in el.children() {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}
