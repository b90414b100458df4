//! # Wrapped XML document core
//!
//! Clarity LIMS exchanges shallow, per-entity XML documents. This module owns
//! the in-memory representation of one such document: a namespace-resolved
//! element tree ([`Element`]), the owning [`Document`] with its source URI and
//! dirty flag, and the path expressions used by field descriptors to address
//! locations inside the tree.
//!
//! Paths are `/`-separated sequences of segments relative to the document
//! root. A segment is either a plain local name (`type`, `qc-flag`) or a
//! Clark-notation qualified name (`{http://genologics.com/ri/file}file`).
//! `.` denotes the current node.
//!
//! All mutation goes through [`Document`] helpers that also mark the document
//! dirty; the session's save pass skips documents that were never dirtied.
//!
//! ## Example
//!
//! ```rust
//! use limskit::xml::Document;
//!
//! let mut doc = Document::parse(
//!     r#"<art:artifact xmlns:art="http://genologics.com/ri/artifact">
//!            <type>Analyte</type>
//!        </art:artifact>"#,
//! )?;
//!
//! assert_eq!(doc.get_text("type"), Some("Analyte"));
//! doc.set_text("location/value", "A:1");
//! assert!(doc.is_dirty());
//! # Ok::<(), limskit::xml::XmlError>(())
//! ```

mod document;
mod element;
mod name;

pub use document::{Document, XmlError};
pub use element::Element;
pub use name::{XmlName, XmlTag};
