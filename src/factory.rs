//! # Element factories
//!
//! One [`ElementFactory`] exists per entity type and session. It holds the
//! static-per-type facts the REST API cares about — which batch operations
//! the remote endpoint supports, the attribute key carrying the record name,
//! and the collection URI — and builds entity shells that fetch lazily.
//!
//! Capability flags are read once from the entity type's declared constant.
//! A type that declares nothing gets no batch capability and no query
//! capability: forgetting to declare fails closed instead of attempting an
//! unsupported batch call against the remote API. Unrecognized flag bits are
//! rejected when the factory is constructed, not on first use.

use std::marker::PhantomData;
use std::ops::BitOr;

use log::{debug, warn};

use crate::element::{ElementError, ElementHandle, Entity, Link};
use crate::xml::{Document, Element, XmlName};
use crate::Session;

/// Namespace of the generic request/list documents (`ri:links`,
/// `ri:details`, paginated collections).
pub const RI_NAMESPACE: &str = "http://genologics.com/ri";

/// Declared REST capabilities of an entity type, as a bit set.
///
/// Combine with `|`: `BatchFlags::BATCH_GET | BatchFlags::QUERY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchFlags(u8);

impl BatchFlags {
    /// No batch capability, no query capability.
    pub const NONE: BatchFlags = BatchFlags(0);
    /// The collection supports `batch/create`.
    pub const BATCH_CREATE: BatchFlags = BatchFlags(1);
    /// The collection supports `batch/retrieve`.
    pub const BATCH_GET: BatchFlags = BatchFlags(1 << 1);
    /// The collection supports `batch/update`.
    pub const BATCH_UPDATE: BatchFlags = BatchFlags(1 << 2);
    /// The collection supports ad-hoc querying.
    pub const QUERY: BatchFlags = BatchFlags(1 << 3);
    /// All four capabilities.
    pub const BATCH_ALL: BatchFlags = BatchFlags(0b1111);

    /// Reconstructs flags from raw bits. Unrecognized bits survive here and
    /// are rejected at factory construction.
    pub const fn from_bits(bits: u8) -> BatchFlags {
        BatchFlags(bits)
    }

    /// The raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    pub const fn contains(self, other: BatchFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// The combination of `self` and `other`; usable in const declarations,
    /// where `|` is not.
    pub const fn union(self, other: BatchFlags) -> BatchFlags {
        BatchFlags(self.0 | other.0)
    }
}

impl BitOr for BatchFlags {
    type Output = BatchFlags;

    fn bitor(self, rhs: BatchFlags) -> BatchFlags {
        BatchFlags(self.0 | rhs.0)
    }
}

/// The validated capability set of one entity type: four booleans, populated
/// once per registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Capabilities {
    /// `batch/create` supported.
    pub batch_create: bool,
    /// `batch/retrieve` supported.
    pub batch_get: bool,
    /// `batch/update` supported.
    pub batch_update: bool,
    /// Ad-hoc querying supported.
    pub query: bool,
}

impl Capabilities {
    /// Validates a declared flag set. Returns `None` when unrecognized bits
    /// are present.
    pub fn from_flags(flags: BatchFlags) -> Option<Capabilities> {
        if flags.bits() & !BatchFlags::BATCH_ALL.bits() != 0 {
            return None;
        }
        Some(Capabilities {
            batch_create: flags.contains(BatchFlags::BATCH_CREATE),
            batch_get: flags.contains(BatchFlags::BATCH_GET),
            batch_update: flags.contains(BatchFlags::BATCH_UPDATE),
            query: flags.contains(BatchFlags::QUERY),
        })
    }
}

/// Errors raised while building the per-type registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An entity type declared capability bits this layer does not know.
    #[error("unrecognized capability bits {bits:#06b} declared by `{type_name}`")]
    InvalidFlags {
        /// The offending entity type.
        type_name: &'static str,
        /// The raw declared bits.
        bits: u8,
    },
}

/// The static-per-type facts one factory carries: created at session
/// initialization and read-only for the session's lifetime.
#[derive(Debug, Clone)]
pub(crate) struct FactoryInfo {
    pub(crate) type_name: &'static str,
    pub(crate) caps: Capabilities,
    pub(crate) name_attribute: &'static str,
    pub(crate) uri: String,
    pub(crate) collection_name: String,
}

impl FactoryInfo {
    pub(crate) fn for_entity<T: Entity>(root_uri: &str) -> Result<FactoryInfo, RegistryError> {
        let caps =
            Capabilities::from_flags(T::BATCH_FLAGS).ok_or(RegistryError::InvalidFlags {
                type_name: T::TYPE_NAME,
                bits: T::BATCH_FLAGS.bits(),
            })?;
        // Naive pluralization, on purpose: deployed collection endpoints are
        // hard-coded to this convention. Irregular plurals declare an
        // explicit REQUEST_PATH instead.
        let path = match T::REQUEST_PATH {
            Some(path) => path.to_owned(),
            None => format!("{}s", T::TYPE_NAME.to_lowercase()),
        };
        let collection_name = path.rsplit('/').next().unwrap_or(&path).to_owned();
        Ok(FactoryInfo {
            type_name: T::TYPE_NAME,
            caps,
            name_attribute: T::NAME_ATTRIBUTE,
            uri: format!("{}/{}", root_uri.trim_end_matches('/'), path),
            collection_name,
        })
    }
}

/// The per-type entry point for building, fetching, querying and saving
/// entities of one type.
#[derive(Debug)]
pub struct ElementFactory<'s, T: Entity> {
    session: &'s Session,
    info: FactoryInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<'s, T: Entity> ElementFactory<'s, T> {
    pub(crate) fn new(session: &'s Session, info: FactoryInfo) -> Self {
        ElementFactory {
            session,
            info,
            _marker: PhantomData,
        }
    }

    /// Whether the remote collection supports `batch/create`.
    pub fn can_batch_create(&self) -> bool {
        self.info.caps.batch_create
    }

    /// Whether the remote collection supports `batch/retrieve`.
    pub fn can_batch_get(&self) -> bool {
        self.info.caps.batch_get
    }

    /// Whether the remote collection supports `batch/update`.
    pub fn can_batch_update(&self) -> bool {
        self.info.caps.batch_update
    }

    /// Whether the remote collection supports ad-hoc querying.
    pub fn can_query(&self) -> bool {
        self.info.caps.query
    }

    /// The validated capability set.
    pub fn capabilities(&self) -> Capabilities {
        self.info.caps
    }

    /// The attribute key carrying the human-readable name on this type.
    pub fn name_attribute(&self) -> &str {
        self.info.name_attribute
    }

    /// The collection endpoint for this entity type.
    pub fn uri(&self) -> &str {
        &self.info.uri
    }

    /// An empty shell pointing at `uri`; the document loads on first access.
    pub fn from_uri(&self, uri: impl Into<String>) -> T {
        T::from_handle(ElementHandle::shell(
            self.session.clone(),
            T::ROOT_TAG,
            uri,
        ))
    }

    /// A shell for the record with the given LIMS id.
    pub fn from_limsid(&self, limsid: &str) -> T {
        self.from_uri(format!("{}/{}", self.info.uri, limsid))
    }

    /// A shell following a [`Link`].
    pub fn from_link(&self, link: &Link) -> T {
        self.from_uri(link.uri.clone())
    }

    /// A shell following a reference subnode, or `None` when the node is
    /// absent or carries no URI.
    pub fn from_link_node(&self, node: Option<&Element>) -> Option<T> {
        node.and_then(Link::from_node)
            .map(|link| self.from_link(&link))
    }

    /// Shells for each of the given reference subnodes, skipping non-links.
    pub fn from_link_nodes<'a>(
        &self,
        nodes: impl IntoIterator<Item = &'a Element>,
    ) -> Vec<T> {
        nodes
            .into_iter()
            .filter_map(|n| self.from_link_node(Some(n)))
            .collect()
    }

    /// A detached entity with a fresh, empty document, for `create`.
    pub fn new_shell(&self) -> T {
        T::from_handle(ElementHandle::detached(
            self.session.clone(),
            T::ROOT_TAG,
            T::ROOT_PREFIX,
        ))
    }

    /// Fetches the record with the given LIMS id eagerly.
    pub fn get(&self, limsid: &str) -> Result<T, ElementError> {
        let entity = self.from_limsid(limsid);
        entity.handle().ensure_loaded()?;
        Ok(entity)
    }

    /// Fetches the record at `uri` eagerly.
    pub fn fetch(&self, uri: &str) -> Result<T, ElementError> {
        let entity = self.from_uri(uri);
        entity.handle().ensure_loaded()?;
        Ok(entity)
    }

    /// Runs an ad-hoc query against the collection, following pagination.
    /// Returns lazy shells for every entry link in the result pages.
    pub fn query(&self, params: &[(&str, &str)]) -> Result<Vec<T>, ElementError> {
        if !self.info.caps.query {
            return Err(ElementError::Unsupported {
                type_name: self.info.type_name,
                operation: "ad-hoc queries",
            });
        }

        let mut uri = self.info.uri.clone();
        if !params.is_empty() {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            uri = format!("{uri}?{}", query.join("&"));
        }

        let mut results = Vec::new();
        let mut next = Some(uri);
        while let Some(page_uri) = next.take() {
            debug!("querying {page_uri}");
            let page = self.session.fetch_document(&page_uri)?;
            for entry in page.root().children() {
                match entry.name().local_name() {
                    "next-page" => {
                        next = entry.attr("uri").map(str::to_owned);
                    }
                    "previous-page" => {}
                    _ => {
                        if let Some(entity) = self.from_link_node(Some(entry)) {
                            results.push(entity);
                        }
                    }
                }
            }
        }
        Ok(results)
    }

    /// Retrieves many records at once through `batch/retrieve`, falling back
    /// to individual fetches when the collection does not support it.
    pub fn batch_get(&self, limsids: &[&str]) -> Result<Vec<T>, ElementError> {
        if !self.info.caps.batch_get {
            warn!(
                "{} does not support batch retrieve; fetching {} records individually",
                self.info.type_name,
                limsids.len()
            );
            return limsids.iter().map(|id| self.get(id)).collect();
        }

        let uris: Vec<String> = limsids
            .iter()
            .map(|id| format!("{}/{}", self.info.uri, id))
            .collect();
        let body = self.links_payload(&uris)?;
        let endpoint = format!("{}/batch/retrieve", self.info.uri);
        debug!("batch retrieve of {} {}", limsids.len(), self.info.collection_name);
        let response = self.session.post_document(&endpoint, &body)?;

        let mut entities = Vec::new();
        for child in response.root().children() {
            if T::ROOT_TAG.matches(child.name()) {
                let doc = Document::new(child.clone());
                let handle = ElementHandle::hydrated(self.session.clone(), T::ROOT_TAG, doc);
                entities.push(T::from_handle(handle));
            }
        }
        Ok(entities)
    }

    /// Creates the record for a detached entity: POSTs its document to the
    /// collection and installs the server's response (URI, LIMS id) on the
    /// entity.
    pub fn create(&self, entity: &T) -> Result<(), ElementError> {
        let body = entity.handle().to_xml()?;
        debug!("creating {} at {}", self.info.type_name, self.info.uri);
        let response = self.session.post_document(&self.info.uri, &body)?;
        entity.handle().accept_document(response)?;
        entity.handle().mark_clean();
        Ok(())
    }

    /// Creates many records through `batch/create`, falling back to
    /// individual creates when unsupported.
    pub fn batch_create(&self, entities: &[&T]) -> Result<(), ElementError> {
        if !self.info.caps.batch_create {
            warn!(
                "{} does not support batch create; creating {} records individually",
                self.info.type_name,
                entities.len()
            );
            for entity in entities {
                self.create(entity)?;
            }
            return Ok(());
        }

        let body = self.details_payload(entities)?;
        let endpoint = format!("{}/batch/create", self.info.uri);
        let response = self.session.post_document(&endpoint, &body)?;

        // The response carries the created documents in request order.
        let created: Vec<&Element> = response
            .root()
            .children()
            .iter()
            .filter(|c| T::ROOT_TAG.matches(c.name()))
            .collect();
        for (entity, node) in entities.iter().zip(created) {
            entity
                .handle()
                .accept_document(Document::new(node.clone()))?;
            entity.handle().mark_clean();
        }
        Ok(())
    }

    /// PUTs a dirty entity back to its URI and installs the server's
    /// response. Clean entities are skipped.
    pub fn save(&self, entity: &T) -> Result<(), ElementError> {
        if !entity.handle().is_dirty() {
            debug!("{} document is clean; skipping save", self.info.type_name);
            return Ok(());
        }
        let uri = entity.handle().uri().ok_or(ElementError::Unattached)?;
        let body = entity.handle().to_xml()?;
        debug!("saving {} {uri}", self.info.type_name);
        let response = self.session.put_document(&uri, &body)?;
        entity.handle().accept_document(response)?;
        entity.handle().mark_clean();
        Ok(())
    }

    /// Saves every dirty entity through `batch/update`, falling back to
    /// individual saves when unsupported. Returns how many documents were
    /// actually sent; never-dirtied documents are skipped.
    pub fn batch_update(&self, entities: &[&T]) -> Result<usize, ElementError> {
        let dirty: Vec<&&T> = entities.iter().filter(|e| e.handle().is_dirty()).collect();
        if dirty.is_empty() {
            debug!("no dirty {} documents to update", self.info.collection_name);
            return Ok(0);
        }

        if !self.info.caps.batch_update {
            warn!(
                "{} does not support batch update; saving {} records individually",
                self.info.type_name,
                dirty.len()
            );
            for entity in &dirty {
                self.save(**entity)?;
            }
            return Ok(dirty.len());
        }

        let body = self.details_payload_refs(&dirty)?;
        let endpoint = format!("{}/batch/update", self.info.uri);
        debug!("batch update of {} {}", dirty.len(), self.info.collection_name);
        self.session.post_document(&endpoint, &body)?;
        for entity in &dirty {
            entity.handle().mark_clean();
        }
        Ok(dirty.len())
    }

    fn links_payload(&self, uris: &[String]) -> Result<String, ElementError> {
        let mut root = Element::with_prefix(XmlName::namespaced(RI_NAMESPACE, "links"), "ri");
        root.set_attr("xmlns:ri", RI_NAMESPACE);
        for uri in uris {
            let link = root.append_child(Element::new(XmlName::local("link")));
            link.set_attr("uri", uri.clone());
            link.set_attr("rel", self.info.collection_name.clone());
        }
        Ok(Document::new(root).to_xml()?)
    }

    fn details_payload(&self, entities: &[&T]) -> Result<String, ElementError> {
        let refs: Vec<&&T> = entities.iter().collect();
        self.details_payload_refs(&refs)
    }

    fn details_payload_refs(&self, entities: &[&&T]) -> Result<String, ElementError> {
        let mut root = Element::with_prefix(XmlName::namespaced(RI_NAMESPACE, "details"), "ri");
        root.set_attr("xmlns:ri", RI_NAMESPACE);
        for entity in entities {
            root.append_child(entity.handle().root_clone()?);
        }
        Ok(Document::new(root).to_xml()?)
    }
}
