//! The process entity: one executed protocol step and its lineage.

use chrono::NaiveDate;

use crate::element::{ElementError, ElementHandle, Entity, Link};
use crate::factory::BatchFlags;
use crate::fields::FieldSpec;
use crate::xml::XmlTag;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Subnode {
        name: "type",
        path: "type",
        readonly: true,
    },
    FieldSpec::Subnode {
        name: "date-run",
        path: "date-run",
        readonly: false,
    },
    FieldSpec::Link {
        name: "technician",
        path: "technician",
        target: "Researcher",
        readonly: false,
    },
];

/// A recorded run of a protocol step.
#[derive(Debug)]
pub struct Process {
    handle: ElementHandle,
}

impl Entity for Process {
    const TYPE_NAME: &'static str = "Process";
    const ROOT_TAG: XmlTag = XmlTag::namespaced("http://genologics.com/ri/process", "process");
    const ROOT_PREFIX: Option<&'static str> = Some("prc");
    const BATCH_FLAGS: BatchFlags = BatchFlags::QUERY;
    // "processes", not the naive "processs".
    const REQUEST_PATH: Option<&'static str> = Some("processes");

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        Process { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl Process {
    /// The display name of the process type that was run.
    pub fn process_type(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("type")
    }

    /// The date the process was run.
    pub fn date_run(&self) -> Result<Option<NaiveDate>, ElementError> {
        Ok(self
            .handle
            .get_text("date-run")?
            .and_then(|t| NaiveDate::parse_from_str(&t, "%Y-%m-%d").ok()))
    }

    /// Link to the researcher who ran the process.
    pub fn technician_link(&self) -> Result<Option<Link>, ElementError> {
        self.handle.find_link("technician")
    }
}
