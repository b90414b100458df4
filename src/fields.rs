//! # Field descriptors
//!
//! Entity types declare their XML-backed fields as a static, ordered table
//! of [`FieldSpec`]s instead of hand-writing accessors against the raw tree.
//! Each spec binds one shaped location in the owning document:
//!
//! - [`FieldSpec::Subnode`] — the text of a subnode path
//! - [`FieldSpec::Attribute`] — an attribute on a subnode path (`.` = root)
//! - [`FieldSpec::Link`] — a reference subnode whose `uri` attribute encodes
//!   a cross-document link
//! - [`FieldSpec::ElementList`] — repeated children under a container path
//!
//! Specs never cache values: every read re-derives from the live tree, so a
//! re-fetched document is immediately reflected in all reads. Reads of absent
//! data return `None`; writes to read-only fields fail before touching the
//! document.
//!
//! The [`Fields`] mixin aggregates a type's whole table into a
//! [`FieldMap`] for batch serialization, and applies such a map back through
//! the write path.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::element::{ElementError, Entity};
use crate::xml::{Document, Element, XmlName};

/// Errors raised by field reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// Write attempted on a field declared read-only.
    #[error("field `{0}` is read-only")]
    ReadOnly(&'static str),

    /// A field map entry named a field the entity does not declare.
    #[error("unknown field `{0}`")]
    Unknown(String),

    /// A list value was assigned to a field; lists are read-only at the
    /// list level.
    #[error("field `{0}` is a list and cannot be assigned")]
    ListAssignment(&'static str),
}

/// One declarative field binding, attached to an entity type as part of its
/// static field table.
#[derive(Debug, Clone, Copy)]
pub enum FieldSpec {
    /// Text content of the subnode at `path`.
    Subnode {
        /// Field name, as used in field maps.
        name: &'static str,
        /// Schema-relative path of the subnode.
        path: &'static str,
        /// Whether writes are rejected.
        readonly: bool,
    },
    /// An XML attribute on the subnode at `path` (`.` = the root element).
    Attribute {
        /// Field name, as used in field maps.
        name: &'static str,
        /// Schema-relative path of the carrying subnode.
        path: &'static str,
        /// Attribute key.
        attr: &'static str,
        /// Whether writes are rejected.
        readonly: bool,
    },
    /// A reference subnode whose `uri` attribute points at another entity.
    /// Reads yield the URI; resolution goes through the session registry.
    Link {
        /// Field name, as used in field maps.
        name: &'static str,
        /// Schema-relative path of the link subnode.
        path: &'static str,
        /// Type name of the link target, for diagnostics.
        target: &'static str,
        /// Whether writes are rejected.
        readonly: bool,
    },
    /// Repeated child elements under a container path. Read-only at the
    /// list level.
    ElementList {
        /// Field name, as used in field maps.
        name: &'static str,
        /// Container path (`.` = directly under the root).
        path: &'static str,
        /// Name of the repeated child element.
        child: &'static str,
        /// Field table of the per-item view, used for map serialization.
        item_fields: &'static [FieldSpec],
    },
}

impl FieldSpec {
    /// The field name used in field maps.
    pub fn name(&self) -> &'static str {
        match self {
            FieldSpec::Subnode { name, .. }
            | FieldSpec::Attribute { name, .. }
            | FieldSpec::Link { name, .. }
            | FieldSpec::ElementList { name, .. } => name,
        }
    }

    /// Whether writes through this spec are rejected.
    pub fn is_readonly(&self) -> bool {
        match self {
            FieldSpec::Subnode { readonly, .. }
            | FieldSpec::Attribute { readonly, .. }
            | FieldSpec::Link { readonly, .. } => *readonly,
            FieldSpec::ElementList { .. } => true,
        }
    }

    /// Reads the current value from a document. Absent data yields `None`.
    pub fn get(&self, doc: &Document) -> Option<FieldValue> {
        self.get_on(doc.root())
    }

    /// Reads the current value relative to an arbitrary element (used for
    /// per-item views inside element lists).
    pub fn get_on(&self, node: &Element) -> Option<FieldValue> {
        match self {
            FieldSpec::Subnode { path, .. } => node
                .find(path)
                .and_then(|e| e.text())
                .map(|t| FieldValue::Text(t.to_owned())),
            FieldSpec::Attribute { path, attr, .. } => node
                .find(path)
                .and_then(|e| e.attr(attr))
                .map(|v| FieldValue::Text(v.to_owned())),
            FieldSpec::Link { path, .. } => node
                .find(path)
                .and_then(|e| e.attr("uri"))
                .map(|v| FieldValue::Text(v.to_owned())),
            FieldSpec::ElementList {
                path,
                child,
                item_fields,
                ..
            } => {
                let child_name = XmlName::parse(child);
                let containers = node.find_all(path);
                let items: Vec<BTreeMap<String, String>> = containers
                    .iter()
                    .flat_map(|c| c.children_named(&child_name))
                    .map(|item| item_map(item, item_fields))
                    .collect();
                Some(FieldValue::List(items))
            }
        }
    }

    /// Writes a value through this spec, auto-vivifying the carrying node.
    /// Fails on read-only fields before any document mutation.
    pub fn set(&self, doc: &mut Document, value: &str) -> Result<(), FieldError> {
        if self.is_readonly() {
            return Err(match self {
                FieldSpec::ElementList { name, .. } => FieldError::ListAssignment(name),
                _ => FieldError::ReadOnly(self.name()),
            });
        }
        match self {
            FieldSpec::Subnode { path, .. } => doc.set_text(path, value),
            FieldSpec::Attribute { path, attr, .. } => doc.set_attribute(path, attr, value),
            FieldSpec::Link { path, .. } => doc.set_attribute(path, "uri", value),
            FieldSpec::ElementList { .. } => unreachable!("lists are always read-only"),
        }
        Ok(())
    }
}

fn item_map(item: &Element, fields: &[FieldSpec]) -> BTreeMap<String, String> {
    fields
        .iter()
        .filter_map(|f| match f.get_on(item) {
            Some(FieldValue::Text(v)) => Some((f.name().to_owned(), v)),
            _ => None,
        })
        .collect()
}

/// The value of one field, as carried in a [`FieldMap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A scalar field: subnode text, attribute value, or link URI.
    Text(String),
    /// An element list: one map of item-field values per child element.
    List(Vec<BTreeMap<String, String>>),
}

impl FieldValue {
    /// The scalar form, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            FieldValue::List(_) => None,
        }
    }
}

/// A whole-object snapshot of descriptor-backed fields, keyed by field name.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Aggregates an entity's declared fields into whole-object maps for batch
/// serialization, and applies such maps back through the write path.
///
/// Blanket-implemented for every [`Entity`].
pub trait Fields: Entity {
    /// Reads every declared field into a map. Absent fields are omitted
    /// rather than reported as errors, so partial payload construction for
    /// batch writes is never derailed by one unset field.
    fn field_map(&self) -> Result<FieldMap, ElementError> {
        self.handle().with_document(|doc| {
            Self::fields()
                .iter()
                .filter_map(|spec| match spec.get(doc) {
                    Some(FieldValue::List(items)) if items.is_empty() => None,
                    Some(value) => Some((spec.name().to_owned(), value)),
                    None => None,
                })
                .collect()
        })
    }

    /// Applies each entry of `values` through its field's write path.
    ///
    /// Application is order-independent: no field's write depends on another
    /// field's current value. Entries naming read-only or undeclared fields
    /// fail the whole call.
    fn apply_field_map(&self, values: &FieldMap) -> Result<(), ElementError> {
        let applied: Result<(), FieldError> = self.handle().with_document_mut(|doc| {
            for (name, value) in values {
                let spec = Self::fields()
                    .iter()
                    .find(|spec| spec.name() == name.as_str())
                    .ok_or_else(|| FieldError::Unknown(name.clone()))?;
                match value {
                    FieldValue::Text(v) => spec.set(doc, v)?,
                    FieldValue::List(_) => {
                        return Err(FieldError::ListAssignment(spec.name()));
                    }
                }
            }
            Ok(())
        })?;
        applied.map_err(ElementError::from)
    }
}

impl<T: Entity> Fields for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Document;

    const DOC: &str = r#"<art:artifact xmlns:art="http://genologics.com/ri/artifact" limsid="ADM1">
  <type>Analyte</type>
  <parent-process uri="http://localhost/api/v2/processes/24-1" limsid="24-1"/>
  <reagent-label name="index-7"/>
  <reagent-label name="index-9"/>
</art:artifact>"#;

    const LABEL_FIELDS: &[FieldSpec] = &[FieldSpec::Attribute {
        name: "name",
        path: ".",
        attr: "name",
        readonly: true,
    }];

    #[test]
    fn subnode_read_and_write() {
        let mut doc = Document::parse(DOC).unwrap();
        let spec = FieldSpec::Subnode {
            name: "type",
            path: "type",
            readonly: false,
        };
        assert_eq!(spec.get(&doc), Some(FieldValue::Text("Analyte".into())));

        spec.set(&mut doc, "ResultFile").unwrap();
        assert_eq!(spec.get(&doc), Some(FieldValue::Text("ResultFile".into())));
    }

    #[test]
    fn absent_subnode_reads_none() {
        let doc = Document::parse(DOC).unwrap();
        let spec = FieldSpec::Subnode {
            name: "output-type",
            path: "output-type",
            readonly: false,
        };
        assert_eq!(spec.get(&doc), None);
    }

    #[test]
    fn readonly_write_fails_without_mutation() {
        let mut doc = Document::parse(DOC).unwrap();
        let spec = FieldSpec::Attribute {
            name: "limsid",
            path: ".",
            attr: "limsid",
            readonly: true,
        };
        let err = spec.set(&mut doc, "other").unwrap_err();
        assert!(matches!(err, FieldError::ReadOnly("limsid")));
        assert!(!doc.is_dirty());
        assert_eq!(doc.get_attribute(".", "limsid"), Some("ADM1"));
    }

    #[test]
    fn link_reads_uri() {
        let doc = Document::parse(DOC).unwrap();
        let spec = FieldSpec::Link {
            name: "parent-process",
            path: "parent-process",
            target: "Process",
            readonly: false,
        };
        assert_eq!(
            spec.get(&doc),
            Some(FieldValue::Text("http://localhost/api/v2/processes/24-1".into()))
        );
    }

    #[test]
    fn element_list_builds_item_maps() {
        let doc = Document::parse(DOC).unwrap();
        let spec = FieldSpec::ElementList {
            name: "reagent-labels",
            path: ".",
            child: "reagent-label",
            item_fields: LABEL_FIELDS,
        };
        match spec.get(&doc) {
            Some(FieldValue::List(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].get("name").map(String::as_str), Some("index-7"));
                assert_eq!(items[1].get("name").map(String::as_str), Some("index-9"));
            }
            other => panic!("expected a list, got {other:?}"),
        }
        assert!(spec.is_readonly());
    }

    #[test]
    fn field_value_serializes_flat() {
        let v = FieldValue::Text("Analyte".into());
        assert_eq!(serde_json::to_string(&v).unwrap(), r#""Analyte""#);
    }
}
