//! The artifact entity: derived samples, result files, QC state, and
//! workflow routing.
//!
//! Reference: <https://www.genologics.com/files/permanent/API/latest/data_art.html#artifact>

use serde::{Deserialize, Serialize};

use crate::element::{ElementError, ElementHandle, Entity, Link};
use crate::factory::BatchFlags;
use crate::fields::FieldSpec;
use crate::xml::{Element, XmlTag};

use super::{Container, ControlType, File, Process, Sample, Stage, Step};

/// Wire marker for a passed QC flag.
pub const QC_PASSED: &str = "PASSED";
/// Wire marker for a failed QC flag.
pub const QC_FAILED: &str = "FAILED";
/// Wire marker for an unset QC flag.
pub const QC_UNKNOWN: &str = "UNKNOWN";

const STAGE_STATUS_QUEUED: &str = "QUEUED";
const STAGE_STATUS_REMOVED: &str = "REMOVED";
const STAGE_STATUS_IN_PROGRESS: &str = "IN_PROGRESS";

/// The tri-state QC flag as it exists on the wire.
///
/// | Wire value | [`QcFlag::as_bool`] |
/// |------------|---------------------|
/// | `PASSED`   | `Some(true)`        |
/// | `FAILED`   | `Some(false)`       |
/// | `UNKNOWN`  | `None`              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcFlag {
    /// QC marked passed.
    Passed,
    /// QC marked failed.
    Failed,
    /// QC not set (or set to the explicit unknown marker).
    Unknown,
}

impl QcFlag {
    /// Maps the raw `qc-flag` text. Anything unrecognized, including an
    /// absent node, is [`QcFlag::Unknown`].
    pub fn from_text(text: Option<&str>) -> QcFlag {
        match text {
            Some(QC_PASSED) => QcFlag::Passed,
            Some(QC_FAILED) => QcFlag::Failed,
            _ => QcFlag::Unknown,
        }
    }

    /// The wire marker for this flag.
    pub fn as_str(self) -> &'static str {
        match self {
            QcFlag::Passed => QC_PASSED,
            QcFlag::Failed => QC_FAILED,
            QcFlag::Unknown => QC_UNKNOWN,
        }
    }

    /// The optional-boolean convenience form.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            QcFlag::Passed => Some(true),
            QcFlag::Failed => Some(false),
            QcFlag::Unknown => None,
        }
    }

    /// The flag for an optional boolean; `None` means unset.
    pub fn from_bool(value: Option<bool>) -> QcFlag {
        match value {
            Some(true) => QcFlag::Passed,
            Some(false) => QcFlag::Failed,
            None => QcFlag::Unknown,
        }
    }
}

/// Status of one workflow-stage history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    /// The artifact is queued for the stage.
    Queued,
    /// The artifact entered the stage.
    InProgress,
    /// The artifact was removed from the stage's queue.
    Removed,
}

impl StageStatus {
    /// Parses the wire marker; unrecognized markers yield `None`.
    pub fn parse(text: &str) -> Option<StageStatus> {
        match text {
            STAGE_STATUS_QUEUED => Some(StageStatus::Queued),
            STAGE_STATUS_REMOVED => Some(StageStatus::Removed),
            STAGE_STATUS_IN_PROGRESS => Some(StageStatus::InProgress),
            _ => None,
        }
    }

    /// The wire marker.
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Queued => STAGE_STATUS_QUEUED,
            StageStatus::Removed => STAGE_STATUS_REMOVED,
            StageStatus::InProgress => STAGE_STATUS_IN_PROGRESS,
        }
    }
}

/// One entry of an artifact's workflow-stage history: a snapshot view over
/// the `workflow-stage` child node.
#[derive(Debug, Clone)]
pub struct WorkflowStageHistory {
    node: Element,
}

impl WorkflowStageHistory {
    pub(crate) const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::Attribute {
            name: "uri",
            path: ".",
            attr: "uri",
            readonly: false,
        },
        FieldSpec::Attribute {
            name: "status",
            path: ".",
            attr: "status",
            readonly: false,
        },
        FieldSpec::Attribute {
            name: "name",
            path: ".",
            attr: "name",
            readonly: false,
        },
    ];

    fn new(node: Element) -> Self {
        WorkflowStageHistory { node }
    }

    /// URI of the stage this entry refers to.
    pub fn uri(&self) -> Option<&str> {
        self.node.attr("uri")
    }

    /// Status of this entry, when the marker is recognized.
    pub fn status(&self) -> Option<StageStatus> {
        self.node.attr("status").and_then(StageStatus::parse)
    }

    /// Stage name as recorded on the entry.
    pub fn name(&self) -> Option<&str> {
        self.node.attr("name")
    }

    /// The stage reference carried by this entry (the node itself is the
    /// link).
    pub fn stage_link(&self) -> Option<Link> {
        Link::from_node(&self.node)
    }
}

/// A reagent label on an artifact: a snapshot view over the `reagent-label`
/// child node.
#[derive(Debug, Clone)]
pub struct ReagentLabel {
    node: Element,
}

impl ReagentLabel {
    pub(crate) const FIELDS: &'static [FieldSpec] = &[FieldSpec::Attribute {
        name: "name",
        path: ".",
        attr: "name",
        readonly: true,
    }];

    fn new(node: Element) -> Self {
        ReagentLabel { node }
    }

    /// The label name.
    pub fn name(&self) -> Option<&str> {
        self.node.attr("name")
    }
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::Subnode {
        name: "type",
        path: "type",
        readonly: false,
    },
    FieldSpec::Subnode {
        name: "output-type",
        path: "output-type",
        readonly: false,
    },
    FieldSpec::Subnode {
        name: "location-value",
        path: "location/value",
        readonly: false,
    },
    FieldSpec::ElementList {
        name: "workflow-stages",
        path: "workflow-stages",
        child: "workflow-stage",
        item_fields: WorkflowStageHistory::FIELDS,
    },
    FieldSpec::ElementList {
        name: "reagent-labels",
        path: ".",
        child: "reagent-label",
        item_fields: ReagentLabel::FIELDS,
    },
    FieldSpec::Link {
        name: "parent-process",
        path: "parent-process",
        target: "Process",
        readonly: false,
    },
];

/// A derived sample or result file moving through the lab.
#[derive(Debug)]
pub struct Artifact {
    handle: ElementHandle,
}

impl Entity for Artifact {
    const TYPE_NAME: &'static str = "Artifact";
    const ROOT_TAG: XmlTag = XmlTag::namespaced("http://genologics.com/ri/artifact", "artifact");
    const ROOT_PREFIX: Option<&'static str> = Some("art");
    const BATCH_FLAGS: BatchFlags = BatchFlags::BATCH_GET
        .union(BatchFlags::BATCH_UPDATE)
        .union(BatchFlags::QUERY);

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn from_handle(handle: ElementHandle) -> Self {
        Artifact { handle }
    }

    fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

impl Artifact {
    /// The artifact type, e.g. `Analyte` or `ResultFile`.
    pub fn artifact_type(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("type")
    }

    /// Sets the artifact type.
    pub fn set_artifact_type(&self, value: &str) -> Result<(), ElementError> {
        self.handle.set_text("type", value)
    }

    /// The output type recorded for process outputs.
    pub fn output_type(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("output-type")
    }

    /// The well position inside the container, e.g. `A:1`.
    pub fn location_value(&self) -> Result<Option<String>, ElementError> {
        self.handle.get_text("location/value")
    }

    /// Sets the well position.
    pub fn set_location_value(&self, value: &str) -> Result<(), ElementError> {
        self.handle.set_text("location/value", value)
    }

    /// The full workflow-stage history, a fresh snapshot on every call.
    pub fn workflow_stages(&self) -> Result<Vec<WorkflowStageHistory>, ElementError> {
        Ok(self
            .handle
            .list_views("workflow-stages", "workflow-stage")?
            .into_iter()
            .map(WorkflowStageHistory::new)
            .collect())
    }

    /// The reagent labels attached to this artifact.
    pub fn reagent_labels(&self) -> Result<Vec<ReagentLabel>, ElementError> {
        Ok(self
            .handle
            .list_views(".", "reagent-label")?
            .into_iter()
            .map(ReagentLabel::new)
            .collect())
    }

    /// The process that produced this artifact, if any.
    pub fn parent_process(&self) -> Result<Option<Process>, ElementError> {
        self.resolve_link::<Process>("parent-process")
    }

    /// The step view of the parent process.
    pub fn parent_step(&self) -> Result<Option<Step>, ElementError> {
        self.resolve_link::<Step>("parent-process")
    }

    /// The first originating sample.
    pub fn sample(&self) -> Result<Option<Sample>, ElementError> {
        self.resolve_link::<Sample>("sample")
    }

    /// Every originating sample (pooled artifacts have several).
    pub fn samples(&self) -> Result<Vec<Sample>, ElementError> {
        let links = self.handle.find_links("sample")?;
        let factory = self.handle.session().samples();
        Ok(links.iter().map(|l| factory.from_link(l)).collect())
    }

    /// The file attached to this artifact. When none is attached yet, a new
    /// empty file named after the artifact is returned, ready to be created.
    pub fn file(&self) -> Result<File, ElementError> {
        let link = self
            .handle
            .find_link("{http://genologics.com/ri/file}file")?;
        match link {
            Some(link) => self.handle.session().resolve(&link),
            None => File::new_empty(self),
        }
    }

    /// Whether this artifact is a control sample.
    pub fn is_control(&self) -> Result<bool, ElementError> {
        self.handle
            .with_document(|doc| doc.find("control-type").is_some())
    }

    /// The control type of a control sample.
    pub fn control_type(&self) -> Result<Option<ControlType>, ElementError> {
        self.resolve_link::<ControlType>("control-type")
    }

    /// The container holding this artifact, from `location/container`.
    /// For the well position itself, use [`Artifact::location_value`].
    pub fn container(&self) -> Result<Option<Container>, ElementError> {
        self.resolve_link::<Container>("location/container")
    }

    /// The stages this artifact is currently queued for.
    ///
    /// Reduces the workflow-stage history in order: a `QUEUED` entry adds
    /// its stage, a later `REMOVED` or `IN_PROGRESS` entry for the same
    /// stage retracts it. A `QUEUED` entry can be left behind in the history
    /// when the artifact has since moved on.
    pub fn queued_stages(&self) -> Result<Vec<Stage>, ElementError> {
        let mut queued: Vec<Link> = Vec::new();
        for entry in self.workflow_stages()? {
            let Some(link) = entry.stage_link() else {
                continue;
            };
            match entry.status() {
                Some(StageStatus::Queued) => {
                    if !queued.iter().any(|l| l.uri == link.uri) {
                        queued.push(link);
                    }
                }
                Some(StageStatus::Removed) | Some(StageStatus::InProgress) => {
                    queued.retain(|l| l.uri != link.uri);
                }
                None => {}
            }
        }
        let factory = self.handle.session().stages();
        Ok(queued.iter().map(|l| factory.from_link(l)).collect())
    }

    /// The raw tri-state QC flag.
    pub fn qc_flag(&self) -> Result<QcFlag, ElementError> {
        Ok(QcFlag::from_text(self.handle.get_text("qc-flag")?.as_deref()))
    }

    /// Writes the QC flag's wire marker.
    pub fn set_qc_flag(&self, flag: QcFlag) -> Result<(), ElementError> {
        self.handle.set_text("qc-flag", flag.as_str())
    }

    /// The QC flag as an optional boolean: `Some(true)` for `PASSED`,
    /// `Some(false)` for `FAILED`, `None` for unknown or unset.
    pub fn qc(&self) -> Result<Option<bool>, ElementError> {
        Ok(self.qc_flag()?.as_bool())
    }

    /// Sets the QC flag from an optional boolean; `None` writes the
    /// explicit `UNKNOWN` marker.
    pub fn set_qc(&self, value: Option<bool>) -> Result<(), ElementError> {
        self.set_qc_flag(QcFlag::from_bool(value))
    }

    /// Whether QC is marked `PASSED`.
    pub fn qc_passed(&self) -> Result<bool, ElementError> {
        Ok(self.qc_flag()? == QcFlag::Passed)
    }

    /// Whether QC is marked `FAILED`.
    pub fn qc_failed(&self) -> Result<bool, ElementError> {
        Ok(self.qc_flag()? == QcFlag::Failed)
    }

    /// Every reagent label name on this artifact.
    pub fn reagent_label_names(&self) -> Result<Vec<String>, ElementError> {
        Ok(self
            .reagent_labels()?
            .iter()
            .filter_map(|l| l.name().map(str::to_owned))
            .collect())
    }

    /// The single reagent label name, `None` when unlabeled.
    ///
    /// Fails when the artifact carries more than one label; use
    /// [`Artifact::reagent_label_names`] for multiplexed artifacts.
    pub fn reagent_label_name(&self) -> Result<Option<String>, ElementError> {
        let mut names = self.reagent_label_names()?;
        if names.len() > 1 {
            return Err(ElementError::Multiplicity(
                "artifact has multiple reagent labels".to_owned(),
            ));
        }
        Ok(names.pop())
    }

    /// Sets the single reagent label, reusing the existing `reagent-label`
    /// node when present.
    pub fn set_reagent_label_name(&self, name: &str) -> Result<(), ElementError> {
        self.handle.with_document_mut(|doc| {
            doc.make_subelement_with_parents("reagent-label")
                .set_attr("name", name);
        })
    }

    fn resolve_link<T: Entity>(&self, path: &str) -> Result<Option<T>, ElementError> {
        match self.handle.find_link(path)? {
            Some(link) => Ok(Some(self.handle.session().resolve(&link)?)),
            None => Ok(None),
        }
    }
}
