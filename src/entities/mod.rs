//! # Entity types
//!
//! Thin consumers of the descriptor machinery: each entity is a struct
//! wrapping an [`ElementHandle`](crate::element::ElementHandle), a static
//! field table, and the type's declared REST constants (root tag, batch
//! capabilities, request path). [`Artifact`] is the richest of them; the
//! rest mostly exist so links on artifacts resolve to something typed.

mod artifact;
mod container;
mod control_type;
mod file;
mod process;
mod sample;
mod stage;
mod step;
mod workflow;

pub use artifact::{
    Artifact, QcFlag, ReagentLabel, StageStatus, WorkflowStageHistory, QC_FAILED, QC_PASSED,
    QC_UNKNOWN,
};
pub use container::Container;
pub use control_type::ControlType;
pub use file::File;
pub use process::Process;
pub use sample::Sample;
pub use stage::Stage;
pub use step::Step;
pub use workflow::Workflow;
