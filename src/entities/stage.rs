//! The workflow-stage configuration entity.

use crate::element::{ElementError, ElementHandle, Entity, Link};
use crate::fields::FieldSpec;
use crate::xml::XmlTag;

use super::Workflow;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Attribute {
        name: "name",
        path: ".",
        attr: "name",
        readonly: true,
    },
    FieldSpec::Link {
        name: "workflow",
        path: "workflow",
        target: "Workflow",
        readonly: true,
    },
    FieldSpec::Link {
        name: "step",
        path: "step",
        target: "StepConfiguration",
        readonly: true,
    },
    FieldSpec::Link {
        name: "protocol",
        path: "protocol",
        target: "Protocol",
        readonly: true,
    },
];

/// One stage of a configured workflow. Stages have no collection endpoint
/// of their own; they are reached through links, so the fail-closed default
/// capabilities apply.
#[derive(Debug)]
pub struct Stage {
    handle: ElementHandle,
}

impl Entity for Stage {
    const TYPE_NAME: &'static str = "Stage";
    const ROOT_TAG: XmlTag = XmlTag::namespaced("http://genologics.com/ri/stage", "stage");
    const ROOT_PREFIX: Option<&'static str> = Some("stg");

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        Stage { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl Stage {
    /// The workflow this stage belongs to.
    pub fn workflow(&self) -> Result<Option<Workflow>, ElementError> {
        match self.handle.find_link("workflow")? {
            Some(link) => Ok(Some(self.handle.session().resolve(&link)?)),
            None => Ok(None),
        }
    }

    /// Link to the protocol step this stage runs.
    pub fn step_link(&self) -> Result<Option<Link>, ElementError> {
        self.handle.find_link("step")
    }

    /// Link to the owning protocol.
    pub fn protocol_link(&self) -> Result<Option<Link>, ElementError> {
        self.handle.find_link("protocol")
    }
}
