//! The file entity: content attached to artifacts and projects.

use crate::element::{ElementError, ElementHandle, Entity, Link};
use crate::factory::BatchFlags;
use crate::fields::FieldSpec;
use crate::xml::XmlTag;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Link {
        name: "attached-to",
        path: "attached-to",
        target: "Artifact",
        readonly: false,
    },
    FieldSpec::Subnode {
        name: "content-location",
        path: "content-location",
        readonly: false,
    },
    FieldSpec::Subnode {
        name: "original-location",
        path: "original-location",
        readonly: false,
    },
    FieldSpec::Subnode {
        name: "is-published",
        path: "is-published",
        readonly: false,
    },
];

/// A file record. The bytes themselves live behind `content-location`;
/// this entity only carries the attachment metadata.
#[derive(Debug)]
pub struct File {
    handle: ElementHandle,
}

impl Entity for File {
    const TYPE_NAME: &'static str = "File";
    const ROOT_TAG: XmlTag = XmlTag::namespaced("http://genologics.com/ri/file", "file");
    const ROOT_PREFIX: Option<&'static str> = Some("file");
    const BATCH_FLAGS: BatchFlags = BatchFlags::BATCH_GET.union(BatchFlags::QUERY);

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        File { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl File {
    /// A detached file record attached to `entity`, named after it, ready
    /// to be created through the file factory.
    pub fn new_empty<E: Entity>(entity: &E) -> Result<File, ElementError> {
        let session = entity.handle().session().clone();
        let file = session.files().new_shell();
        if let Some(uri) = entity.uri() {
            file.handle.set_attribute("attached-to", "uri", &uri)?;
        }
        if let Some(name) = entity.name()? {
            file.set_name(&name)?;
        }
        Ok(file)
    }

    /// Link to the record this file is attached to.
    pub fn attached_to(&self) -> Result<Option<Link>, ElementError> {
        self.handle.find_link("attached-to")
    }

    /// Where the file content is stored.
    pub fn content_location(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("content-location")
    }

    /// The path the file had when it was uploaded.
    pub fn original_location(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("original-location")
    }

    /// Records the upload path.
    pub fn set_original_location(&self, location: &str) -> Result<(), ElementError> {
        self.handle.set_text("original-location", location)
    }

    /// Whether the file is visible in lab-facing views.
    pub fn is_published(&self) -> Result<Option<bool>, ElementError> {
        Ok(self
            .handle
            .get_text("is-published")?
            .map(|t| t.eq_ignore_ascii_case("true")))
    }

    /// Publishes or hides the file.
    pub fn set_published(&self, published: bool) -> Result<(), ElementError> {
        self.handle
            .set_text("is-published", if published { "true" } else { "false" })
    }
}
