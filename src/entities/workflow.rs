//! The workflow configuration entity.

use crate::element::{ElementError, ElementHandle, Entity};
use crate::factory::BatchFlags;
use crate::fields::FieldSpec;
use crate::xml::XmlTag;

use super::Stage;

const STAGE_LINK_FIELDS: &[FieldSpec] = &[
    FieldSpec::Attribute {
        name: "name",
        path: ".",
        attr: "name",
        readonly: true,
    },
    FieldSpec::Attribute {
        name: "uri",
        path: ".",
        attr: "uri",
        readonly: true,
    },
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Attribute {
        name: "name",
        path: ".",
        attr: "name",
        readonly: true,
    },
    FieldSpec::Attribute {
        name: "status",
        path: ".",
        attr: "status",
        readonly: true,
    },
    FieldSpec::ElementList {
        name: "stages",
        path: "stages",
        child: "stage",
        item_fields: STAGE_LINK_FIELDS,
    },
];

/// A configured workflow: an ordered chain of stages.
#[derive(Debug)]
pub struct Workflow {
    handle: ElementHandle,
}

impl Entity for Workflow {
    const TYPE_NAME: &'static str = "Workflow";
    const ROOT_TAG: XmlTag =
        XmlTag::namespaced("http://genologics.com/ri/workflowconfiguration", "workflow");
    const ROOT_PREFIX: Option<&'static str> = Some("wkfcnf");
    const BATCH_FLAGS: BatchFlags = BatchFlags::QUERY;
    const REQUEST_PATH: Option<&'static str> = Some("configuration/workflows");

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        Workflow { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl Workflow {
    /// The workflow status, e.g. `ACTIVE` or `ARCHIVED`.
    pub fn status(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_attribute(".", "status")
    }

    /// Lazy shells for every stage of this workflow, in configured order.
    pub fn stages(&self) -> Result<Vec<Stage>, ElementError> {
        let nodes = self.handle.list_views("stages", "stage")?;
        let factory = self.handle.session().stages();
        Ok(factory.from_link_nodes(nodes.iter()))
    }
}
