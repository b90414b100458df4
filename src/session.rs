//! # Session and transport contract
//!
//! A [`Session`] owns the API root URI, the blocking [`Transport`], and the
//! per-type factory registry. The registry is built and validated when the
//! session is constructed and is read-only for the session's lifetime;
//! factories hand out lazy entity shells that fetch through the session on
//! first document access.
//!
//! The transport is deliberately minimal: `get`, `put`, `post`, blocking,
//! errors propagated unmodified. Retry policy, authentication and connection
//! management belong to the transport implementation, not to this layer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use limskit::{Session, Transport, TransportError};
//!
//! struct MyTransport;
//!
//! impl Transport for MyTransport {
//!     fn get(&self, uri: &str) -> Result<String, TransportError> {
//!         todo!("HTTP GET {uri}")
//!     }
//!     fn put(&self, uri: &str, body: &str) -> Result<String, TransportError> {
//!         todo!()
//!     }
//!     fn post(&self, uri: &str, body: &str) -> Result<String, TransportError> {
//!         todo!()
//!     }
//! }
//!
//! let session = Session::new("http://localhost/api/v2", Box::new(MyTransport))?;
//! let artifact = session.artifacts().from_limsid("ADM51A1");
//! # Ok::<(), limskit::RegistryError>(())
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::element::{ElementError, Entity, Link};
use crate::entities::{
    Artifact, Container, ControlType, File, Process, Sample, Stage, Step, Workflow,
};
use crate::factory::{ElementFactory, FactoryInfo, RegistryError};
use crate::xml::Document;

/// Errors surfaced by a [`Transport`] implementation. They propagate through
/// this layer unmodified; no retries, no backoff.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} for {uri}")]
    Status {
        /// Response status code.
        status: u16,
        /// Request URI.
        uri: String,
    },

    /// The requested resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Connection-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the transport wants to surface.
    #[error("{0}")]
    Other(String),
}

/// The blocking HTTP contract this layer consumes. Implementations own
/// authentication, retries and connection management.
pub trait Transport {
    /// GET the resource at `uri`, returning the response body.
    fn get(&self, uri: &str) -> Result<String, TransportError>;

    /// PUT `body` to `uri`, returning the response body.
    fn put(&self, uri: &str, body: &str) -> Result<String, TransportError>;

    /// POST `body` to `uri`, returning the response body.
    fn post(&self, uri: &str, body: &str) -> Result<String, TransportError>;
}

struct SessionInner {
    root_uri: String,
    transport: Box<dyn Transport>,
    registry: HashMap<TypeId, FactoryInfo>,
}

/// A handle on one API connection: root URI, transport, and the factory
/// registry. Cheap to clone; every entity holds one.
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("root_uri", &self.inner.root_uri)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens a session against `root_uri`, building and validating the
    /// factory registry for every built-in entity type.
    ///
    /// A malformed capability declaration on any registered type fails here,
    /// not on first use.
    pub fn new(
        root_uri: impl Into<String>,
        transport: Box<dyn Transport>,
    ) -> Result<Session, RegistryError> {
        let root_uri = root_uri.into();
        let mut registry = HashMap::new();
        register::<Artifact>(&mut registry, &root_uri)?;
        register::<Sample>(&mut registry, &root_uri)?;
        register::<Process>(&mut registry, &root_uri)?;
        register::<Step>(&mut registry, &root_uri)?;
        register::<File>(&mut registry, &root_uri)?;
        register::<Container>(&mut registry, &root_uri)?;
        register::<Stage>(&mut registry, &root_uri)?;
        register::<Workflow>(&mut registry, &root_uri)?;
        register::<ControlType>(&mut registry, &root_uri)?;
        debug!("session registry initialized with {} types", registry.len());

        Ok(Session {
            inner: Rc::new(SessionInner {
                root_uri,
                transport,
                registry,
            }),
        })
    }

    /// The API root URI this session was opened against.
    pub fn root_uri(&self) -> &str {
        &self.inner.root_uri
    }

    /// The factory for entity type `T`.
    ///
    /// Built-in types resolve from the registry; other entity types are
    /// validated here, at factory construction.
    pub fn factory<T: Entity>(&self) -> Result<ElementFactory<'_, T>, RegistryError> {
        let info = match self.inner.registry.get(&TypeId::of::<T>()) {
            Some(info) => info.clone(),
            None => FactoryInfo::for_entity::<T>(&self.inner.root_uri)?,
        };
        Ok(ElementFactory::new(self, info))
    }

    fn builtin<T: Entity>(&self) -> ElementFactory<'_, T> {
        match self.inner.registry.get(&TypeId::of::<T>()) {
            Some(info) => ElementFactory::new(self, info.clone()),
            None => unreachable!("built-in entity types are registered at session construction"),
        }
    }

    /// The artifact factory.
    pub fn artifacts(&self) -> ElementFactory<'_, Artifact> {
        self.builtin()
    }

    /// The sample factory.
    pub fn samples(&self) -> ElementFactory<'_, Sample> {
        self.builtin()
    }

    /// The process factory.
    pub fn processes(&self) -> ElementFactory<'_, Process> {
        self.builtin()
    }

    /// The step factory.
    pub fn steps(&self) -> ElementFactory<'_, Step> {
        self.builtin()
    }

    /// The file factory.
    pub fn files(&self) -> ElementFactory<'_, File> {
        self.builtin()
    }

    /// The container factory.
    pub fn containers(&self) -> ElementFactory<'_, Container> {
        self.builtin()
    }

    /// The workflow-stage factory.
    pub fn stages(&self) -> ElementFactory<'_, Stage> {
        self.builtin()
    }

    /// The workflow factory.
    pub fn workflows(&self) -> ElementFactory<'_, Workflow> {
        self.builtin()
    }

    /// The control-type factory.
    pub fn control_types(&self) -> ElementFactory<'_, ControlType> {
        self.builtin()
    }

    /// Resolves a [`Link`] to a lazy shell of the target type.
    pub fn resolve<T: Entity>(&self, link: &Link) -> Result<T, ElementError> {
        Ok(self.factory::<T>()?.from_link(link))
    }

    /// GETs and parses the document at `uri`.
    pub fn fetch_document(&self, uri: &str) -> Result<Document, ElementError> {
        debug!("GET {uri}");
        let body = self.inner.transport.get(uri)?;
        let mut doc = Document::parse(&body)?;
        if doc.uri().is_none() {
            doc.set_uri(uri);
        }
        Ok(doc)
    }

    /// PUTs a serialized document and parses the response.
    pub(crate) fn put_document(&self, uri: &str, body: &str) -> Result<Document, ElementError> {
        debug!("PUT {uri}");
        let response = self.inner.transport.put(uri, body)?;
        Ok(Document::parse(&response)?)
    }

    /// POSTs a serialized document and parses the response.
    pub(crate) fn post_document(&self, uri: &str, body: &str) -> Result<Document, ElementError> {
        debug!("POST {uri}");
        let response = self.inner.transport.post(uri, body)?;
        Ok(Document::parse(&response)?)
    }
}

fn register<T: Entity>(
    registry: &mut HashMap<TypeId, FactoryInfo>,
    root_uri: &str,
) -> Result<(), RegistryError> {
    registry.insert(TypeId::of::<T>(), FactoryInfo::for_entity::<T>(root_uri)?);
    Ok(())
}
