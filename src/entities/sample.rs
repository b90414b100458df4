//! The submitted sample entity.

use chrono::NaiveDate;

use crate::element::{ElementError, ElementHandle, Entity};
use crate::factory::BatchFlags;
use crate::fields::FieldSpec;
use crate::xml::XmlTag;

use super::Artifact;

const DATE_FORMAT: &str = "%Y-%m-%d";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Subnode {
        name: "date-received",
        path: "date-received",
        readonly: false,
    },
    FieldSpec::Subnode {
        name: "date-completed",
        path: "date-completed",
        readonly: false,
    },
    FieldSpec::Link {
        name: "artifact",
        path: "artifact",
        target: "Artifact",
        readonly: true,
    },
    FieldSpec::Link {
        name: "project",
        path: "project",
        target: "Project",
        readonly: false,
    },
];

/// A sample as submitted to the lab. Its measurable descendants are
/// [`Artifact`]s.
#[derive(Debug)]
pub struct Sample {
    handle: ElementHandle,
}

impl Entity for Sample {
    const TYPE_NAME: &'static str = "Sample";
    const ROOT_TAG: XmlTag = XmlTag::namespaced("http://genologics.com/ri/sample", "sample");
    const ROOT_PREFIX: Option<&'static str> = Some("smp");
    const BATCH_FLAGS: BatchFlags = BatchFlags::BATCH_ALL;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        Sample { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl Sample {
    /// The date the sample was received, when set and well-formed.
    pub fn date_received(&self) -> Result<Option<NaiveDate>, ElementError> {
        self.date_field("date-received")
    }

    /// Records the received date.
    pub fn set_date_received(&self, date: NaiveDate) -> Result<(), ElementError> {
        self.handle
            .set_text("date-received", &date.format(DATE_FORMAT).to_string())
    }

    /// The date processing of the sample completed.
    pub fn date_completed(&self) -> Result<Option<NaiveDate>, ElementError> {
        self.date_field("date-completed")
    }

    /// The root analyte artifact derived from this sample.
    pub fn artifact(&self) -> Result<Option<Artifact>, ElementError> {
        match self.handle.find_link("artifact")? {
            Some(link) => Ok(Some(self.handle.session().resolve(&link)?)),
            None => Ok(None),
        }
    }

    fn date_field(&self, path: &str) -> Result<Option<NaiveDate>, ElementError> {
        Ok(self
            .handle
            .get_text(path)?
            .and_then(|t| NaiveDate::parse_from_str(&t, DATE_FORMAT).ok()))
    }
}
