//! # limskit - A Typed Domain Layer over the Clarity LIMS REST API
//!
//! `limskit` lets laboratory automation scripts read and mutate Clarity LIMS
//! records — samples, artifacts, processes, workflow stages, files, QC flags —
//! without hand-writing XML.
//!
//! ## Key Features
//!
//! - **Declarative field binding**: entity types declare their XML-backed
//!   fields as a static table; reads and writes go through one shared,
//!   dirty-tracking document wrapper.
//!
//! - **Lazy fetching**: factories hand out cheap shells; the document is
//!   fetched and parsed on first field access, and link resolution returns
//!   further lazy shells instead of performing hidden I/O.
//!
//! - **Fail-closed batch capabilities**: each entity type declares which
//!   batch operations its collection endpoint supports; undeclared types get
//!   none, so this layer never attempts an unsupported batch call.
//!
//! - **Pluggable transport**: the HTTP layer is a three-method trait;
//!   authentication and retry policy live in the implementation, not here.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use limskit::{Entity, Session, Transport, TransportError};
//!
//! # struct Http;
//! # impl Transport for Http {
//! #     fn get(&self, _: &str) -> Result<String, TransportError> { todo!() }
//! #     fn put(&self, _: &str, _: &str) -> Result<String, TransportError> { todo!() }
//! #     fn post(&self, _: &str, _: &str) -> Result<String, TransportError> { todo!() }
//! # }
//! let session = Session::new("https://lims.example.com/api/v2", Box::new(Http))?;
//!
//! // Lazy shell; the document is fetched on first field access.
//! let artifact = session.artifacts().from_limsid("ADM51A1");
//!
//! if artifact.qc()? != Some(true) {
//!     artifact.set_qc(Some(true))?;
//!     session.artifacts().save(&artifact)?;
//! }
//!
//! for stage in artifact.queued_stages()? {
//!     println!("queued for {:?}", stage.name()?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`xml`]: the wrapped document core — element tree, path expressions,
//!   dirty tracking, quick-xml parse/serialize
//! - [`fields`]: declarative field descriptors and the field-map mixin
//! - [`factory`]: per-type element factories, batch capability flags, URI
//!   conventions
//! - [`element`]: the lazy LIMS element handle and the [`Entity`] trait
//! - [`session`]: the transport contract and the per-type factory registry
//! - [`entities`]: the entity types themselves ([`entities::Artifact`] and
//!   friends)
//!
//! ## Scope
//!
//! This is not a general object-relational mapper. Each entity type maps to
//! a single, fixed, shallow XML schema; there are no joins, no migrations,
//! and no schema evolution. Everything is blocking and single-threaded —
//! callers needing parallelism fan out externally.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod element;
pub mod entities;
pub mod factory;
pub mod fields;
pub mod session;
pub mod xml;

pub use element::{ElementError, ElementHandle, Entity, Link};
pub use factory::{BatchFlags, Capabilities, ElementFactory, RegistryError};
pub use fields::{FieldError, FieldMap, FieldSpec, FieldValue, Fields};
pub use session::{Session, Transport, TransportError};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::element::{ElementError, Entity, Link};
    pub use crate::entities::{
        Artifact, Container, ControlType, File, Process, QcFlag, Sample, Stage, StageStatus, Step,
        Workflow,
    };
    pub use crate::factory::{BatchFlags, Capabilities, ElementFactory};
    pub use crate::fields::{FieldMap, FieldSpec, FieldValue, Fields};
    pub use crate::session::{Session, Transport, TransportError};
    pub use crate::xml::{Document, Element, XmlTag};
}
