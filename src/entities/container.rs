//! The container entity: plates, tubes, flow cells.

use crate::element::{ElementError, ElementHandle, Entity, Link};
use crate::factory::BatchFlags;
use crate::fields::FieldSpec;
use crate::xml::XmlTag;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Subnode {
        name: "name",
        path: "name",
        readonly: false,
    },
    FieldSpec::Link {
        name: "type",
        path: "type",
        target: "ContainerType",
        readonly: true,
    },
    FieldSpec::Subnode {
        name: "occupied-wells",
        path: "occupied-wells",
        readonly: true,
    },
];

/// A labware container holding artifacts at well positions.
#[derive(Debug)]
pub struct Container {
    handle: ElementHandle,
}

impl Entity for Container {
    const TYPE_NAME: &'static str = "Container";
    const ROOT_TAG: XmlTag =
        XmlTag::namespaced("http://genologics.com/ri/container", "container");
    const ROOT_PREFIX: Option<&'static str> = Some("con");
    const BATCH_FLAGS: BatchFlags = BatchFlags::BATCH_ALL;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        Container { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl Container {
    /// The container name. Unlike most entities, containers carry their
    /// name as a subnode rather than a root attribute.
    pub fn name(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("name")
    }

    /// Renames the container.
    pub fn set_name(&self, name: &str) -> Result<(), ElementError> {
        self.handle.set_text("name", name)
    }

    /// Link to the container type (96-well plate, tube, ...).
    pub fn container_type_link(&self) -> Result<Option<Link>, ElementError> {
        self.handle.find_link("type")
    }

    /// How many wells currently hold an artifact.
    pub fn occupied_wells(&self) -> Result<Option<u64>, ElementError> {
        Ok(self
            .handle
            .get_text("occupied-wells")?
            .and_then(|t| t.parse().ok()))
    }
}
