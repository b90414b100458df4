//! The control-type configuration entity.

use crate::element::{ElementError, ElementHandle, Entity};
use crate::factory::BatchFlags;
use crate::fields::FieldSpec;
use crate::xml::XmlTag;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Attribute {
        name: "name",
        path: ".",
        attr: "name",
        readonly: true,
    },
    FieldSpec::Subnode {
        name: "supplier",
        path: "supplier",
        readonly: false,
    },
    FieldSpec::Subnode {
        name: "catalogue-number",
        path: "catalogue-number",
        readonly: false,
    },
];

/// A configured control sample type.
#[derive(Debug)]
pub struct ControlType {
    handle: ElementHandle,
}

impl Entity for ControlType {
    const TYPE_NAME: &'static str = "ControlType";
    const ROOT_TAG: XmlTag =
        XmlTag::namespaced("http://genologics.com/ri/controltype", "control-type");
    const ROOT_PREFIX: Option<&'static str> = Some("ctrltp");
    const BATCH_FLAGS: BatchFlags = BatchFlags::QUERY;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        ControlType { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl ControlType {
    /// The control supplier.
    pub fn supplier(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("supplier")
    }

    /// The supplier's catalogue number.
    pub fn catalogue_number(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("catalogue-number")
    }
}
