//! The step entity: the interactive view of a running process.

use crate::element::{ElementError, ElementHandle, Entity, Link};
use crate::factory::BatchFlags;
use crate::fields::FieldSpec;
use crate::xml::XmlTag;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Attribute {
        name: "current-state",
        path: ".",
        attr: "current-state",
        readonly: true,
    },
    FieldSpec::Link {
        name: "configuration",
        path: "configuration",
        target: "StepConfiguration",
        readonly: true,
    },
];

/// A step in progress; shares its LIMS id with the underlying process.
#[derive(Debug)]
pub struct Step {
    handle: ElementHandle,
}

impl Entity for Step {
    const TYPE_NAME: &'static str = "Step";
    const ROOT_TAG: XmlTag = XmlTag::namespaced("http://genologics.com/ri/step", "step");
    const ROOT_PREFIX: Option<&'static str> = Some("stp");
    const BATCH_FLAGS: BatchFlags = BatchFlags::QUERY;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        Step { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl Step {
    /// The workflow state the step is currently in.
    pub fn current_state(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_attribute(".", "current-state")
    }

    /// Link to the step's configuration.
    pub fn configuration_link(&self) -> Result<Option<Link>, ElementError> {
        self.handle.find_link("configuration")
    }
}
