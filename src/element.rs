//! # Lazy LIMS elements
//!
//! Every remote record is represented by an entity struct wrapping an
//! [`ElementHandle`]: the owning session, the record's URI, and a lazily
//! fetched, memoized [`Document`]. A factory hands out cheap shells carrying
//! only a URI; the document is fetched and parsed on first access, and all
//! descriptor reads and writes go through it from then on.
//!
//! Cross-document references are carried as [`Link`] values — a URI plus the
//! attributes the server put on the link node. Resolving a link to a full
//! entity is an explicit call through the session registry; a field read
//! never performs hidden I/O beyond its own document's first fetch.

use std::cell::RefCell;

use crate::factory::{BatchFlags, RegistryError};
use crate::fields::{FieldError, FieldSpec};
use crate::session::{Session, TransportError};
use crate::xml::{Document, Element, XmlError, XmlName, XmlTag};

/// Errors raised by entity access: transport failures surface unmodified,
/// everything else is a condition of this layer.
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    /// Network/transport failure during fetch or save; propagated as-is.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The fetched payload was not a well-formed document.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// Field-level violation (read-only write, unknown field).
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// Factory registry failure (invalid capability declaration).
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The entity has neither a URI to fetch nor an in-memory document.
    #[error("entity is not attached to a remote record")]
    Unattached,

    /// A fetched document's root tag did not match the entity type.
    #[error("document root `{found}` does not match expected `{expected}`")]
    RootTagMismatch {
        /// The entity type's declared root tag.
        expected: String,
        /// The root tag actually found on the wire.
        found: String,
    },

    /// The entity type does not declare the capability this operation needs.
    #[error("`{type_name}` does not support {operation}")]
    Unsupported {
        /// Entity type name.
        type_name: &'static str,
        /// The refused operation.
        operation: &'static str,
    },

    /// A single-valued accessor found more than one underlying value.
    #[error("{0}")]
    Multiplicity(String),
}

/// A cross-document reference: the target's URI plus whatever identifying
/// attributes the server put on the link node.
///
/// A link is navigation, never ownership — resolving it does not mutate the
/// source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Target URI.
    pub uri: String,
    /// Target LIMS id, when the server includes it on the link node.
    pub limsid: Option<String>,
    /// Target name, when the server includes it on the link node.
    pub name: Option<String>,
}

impl Link {
    /// Reads a link from a reference subnode. A node with no `uri`
    /// attribute is not a link.
    pub fn from_node(node: &Element) -> Option<Link> {
        Some(Link {
            uri: node.attr("uri")?.to_owned(),
            limsid: node.attr("limsid").map(str::to_owned),
            name: node.attr("name").map(str::to_owned),
        })
    }
}

/// Per-type constants and the field table every LIMS entity declares,
/// plus the accessors shared by all of them.
///
/// The constants fail closed: a type that declares nothing gets no batch
/// capability, no query capability, `"name"` as its name attribute, and a
/// collection path derived by naive pluralization.
pub trait Entity: Sized + 'static {
    /// Type name used for registry diagnostics and default pluralization.
    const TYPE_NAME: &'static str;

    /// Root tag of this entity's documents; must exactly match the wire
    /// format for a fetched document to be accepted.
    const ROOT_TAG: XmlTag;

    /// Prefix used when creating new documents for this type.
    const ROOT_PREFIX: Option<&'static str> = None;

    /// Declared REST capabilities. Absent declaration means none.
    const BATCH_FLAGS: BatchFlags = BatchFlags::NONE;

    /// Attribute key carrying the human-readable name.
    const NAME_ATTRIBUTE: &'static str = "name";

    /// Explicit collection path, overriding naive pluralization.
    const REQUEST_PATH: Option<&'static str> = None;

    /// The static, ordered field table for this type.
    fn fields() -> &'static [FieldSpec] {
        &[]
    }

    /// Wraps a handle produced by this type's factory.
    fn from_handle(handle: ElementHandle) -> Self;

    /// The wrapped handle.
    fn handle(&self) -> &ElementHandle;

    /// The record's URI, if attached.
    fn uri(&self) -> Option<String> {
        self.handle().uri()
    }

    /// The LIMS id, derived from the URI tail.
    fn limsid(&self) -> Option<String> {
        self.handle().limsid()
    }

    /// The human-readable name, read from the root's name attribute.
    fn name(&self) -> Result<Option<String>, ElementError> {
        self.handle().get_attribute(".", Self::NAME_ATTRIBUTE)
    }

    /// Sets the human-readable name on the root element.
    fn set_name(&self, name: &str) -> Result<(), ElementError> {
        self.handle().set_attribute(".", Self::NAME_ATTRIBUTE, name)
    }

    /// Whether the in-memory document has unsaved mutations.
    fn is_dirty(&self) -> bool {
        self.handle().is_dirty()
    }

    /// Drops the cached document and fetches it again.
    fn refresh(&self) -> Result<(), ElementError> {
        self.handle().refresh()
    }
}

/// The shared core of every entity: session handle, URI, and the lazily
/// fetched document.
///
/// A handle is exclusively owned by its entity wrapper; no two entities
/// share a mutable document.
#[derive(Debug)]
pub struct ElementHandle {
    session: Session,
    expected_tag: XmlTag,
    uri: RefCell<Option<String>>,
    doc: RefCell<Option<Document>>,
}

impl ElementHandle {
    /// An empty shell: URI only, document fetched on first access.
    pub(crate) fn shell(session: Session, expected_tag: XmlTag, uri: impl Into<String>) -> Self {
        ElementHandle {
            session,
            expected_tag,
            uri: RefCell::new(Some(uri.into())),
            doc: RefCell::new(None),
        }
    }

    /// A handle around an already-hydrated document (batch responses).
    pub(crate) fn hydrated(session: Session, expected_tag: XmlTag, doc: Document) -> Self {
        let uri = doc.uri().map(str::to_owned);
        ElementHandle {
            session,
            expected_tag,
            uri: RefCell::new(uri),
            doc: RefCell::new(Some(doc)),
        }
    }

    /// A detached handle with a fresh, empty document (new records).
    pub(crate) fn detached(session: Session, expected_tag: XmlTag, prefix: Option<&str>) -> Self {
        ElementHandle {
            session,
            expected_tag,
            uri: RefCell::new(None),
            doc: RefCell::new(Some(Document::empty(expected_tag, prefix))),
        }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// The record URI, if attached.
    pub fn uri(&self) -> Option<String> {
        self.uri.borrow().clone()
    }

    /// The LIMS id: the last path segment of the URI.
    pub fn limsid(&self) -> Option<String> {
        let uri = self.uri.borrow();
        let uri = uri.as_deref()?;
        let tail = uri.split('?').next().unwrap_or(uri);
        tail.trim_end_matches('/')
            .rsplit('/')
            .next()
            .map(str::to_owned)
    }

    /// Whether the cached document has unsaved mutations. A handle that was
    /// never loaded is clean by definition.
    pub fn is_dirty(&self) -> bool {
        self.doc
            .borrow()
            .as_ref()
            .map(Document::is_dirty)
            .unwrap_or(false)
    }

    pub(crate) fn mark_clean(&self) {
        if let Some(doc) = self.doc.borrow_mut().as_mut() {
            doc.mark_clean();
        }
    }

    /// Fetches the document if it is not cached yet.
    pub fn ensure_loaded(&self) -> Result<(), ElementError> {
        if self.doc.borrow().is_some() {
            return Ok(());
        }
        let uri = self.uri.borrow().clone().ok_or(ElementError::Unattached)?;
        let doc = self.session.fetch_document(&uri)?;
        self.accept_document(doc)
    }

    /// Drops the cached document and fetches the current server state.
    pub fn refresh(&self) -> Result<(), ElementError> {
        let uri = self.uri.borrow().clone().ok_or(ElementError::Unattached)?;
        let doc = self.session.fetch_document(&uri)?;
        self.accept_document(doc)
    }

    /// Installs a document after checking its root tag against the entity
    /// type's declared tag.
    pub(crate) fn accept_document(&self, doc: Document) -> Result<(), ElementError> {
        if !self.expected_tag.matches(doc.root().name()) {
            return Err(ElementError::RootTagMismatch {
                expected: self.expected_tag.to_string(),
                found: doc.root().name().to_string(),
            });
        }
        if let Some(uri) = doc.uri() {
            *self.uri.borrow_mut() = Some(uri.to_owned());
        }
        *self.doc.borrow_mut() = Some(doc);
        Ok(())
    }

    /// Runs a closure against the (lazily loaded) document.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> Result<R, ElementError> {
        self.ensure_loaded()?;
        match self.doc.borrow().as_ref() {
            Some(doc) => Ok(f(doc)),
            None => Err(ElementError::Unattached),
        }
    }

    /// Runs a closure against the mutable document.
    pub fn with_document_mut<R>(
        &self,
        f: impl FnOnce(&mut Document) -> R,
    ) -> Result<R, ElementError> {
        self.ensure_loaded()?;
        match self.doc.borrow_mut().as_mut() {
            Some(doc) => Ok(f(doc)),
            None => Err(ElementError::Unattached),
        }
    }

    /// Text of the subnode at `path`, or `None` if absent.
    pub fn get_text(&self, path: &str) -> Result<Option<String>, ElementError> {
        self.with_document(|doc| doc.get_text(path).map(str::to_owned))
    }

    /// Sets subnode text through the document's mutation primitive.
    pub fn set_text(&self, path: &str, value: &str) -> Result<(), ElementError> {
        self.with_document_mut(|doc| doc.set_text(path, value))
    }

    /// Attribute value on the subnode at `path`, or `None` if absent.
    pub fn get_attribute(&self, path: &str, attr: &str) -> Result<Option<String>, ElementError> {
        self.with_document(|doc| doc.get_attribute(path, attr).map(str::to_owned))
    }

    /// Sets an attribute, auto-vivifying the carrying subnode.
    pub fn set_attribute(&self, path: &str, attr: &str, value: &str) -> Result<(), ElementError> {
        self.with_document_mut(|doc| doc.set_attribute(path, attr, value))
    }

    /// Reads the link at `path`, or `None` when the subnode is absent or
    /// carries no URI.
    pub fn find_link(&self, path: &str) -> Result<Option<Link>, ElementError> {
        self.with_document(|doc| doc.find(path).and_then(Link::from_node))
    }

    /// Reads every link matching `path`.
    pub fn find_links(&self, path: &str) -> Result<Vec<Link>, ElementError> {
        self.with_document(|doc| {
            doc.find_all(path)
                .into_iter()
                .filter_map(Link::from_node)
                .collect()
        })
    }

    /// Snapshot views of the repeated children named `child` under the
    /// container at `path` — a freshly constructed sequence on every call,
    /// re-derived from the live tree.
    pub fn list_views(&self, path: &str, child: &str) -> Result<Vec<Element>, ElementError> {
        self.with_document(|doc| {
            let child_name = XmlName::parse(child);
            doc.find_all(path)
                .into_iter()
                .flat_map(|c| c.children_named(&child_name))
                .cloned()
                .collect()
        })
    }

    /// Serializes the current document.
    pub(crate) fn to_xml(&self) -> Result<String, ElementError> {
        let xml = self.with_document(Document::to_xml)?;
        Ok(xml?)
    }

    /// A clone of the document's root element (batch payload assembly).
    pub(crate) fn root_clone(&self) -> Result<Element, ElementError> {
        self.with_document(|doc| doc.root().clone())
    }
}
