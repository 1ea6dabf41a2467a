//! Measurement stages, run on the calibrated object.
//!
//! Feature detection comes first; every later stage reads its extent from
//! the blackboard and degrades to unset outputs when it is missing.

mod band;
mod extremes;
mod feature;
mod posture;
mod report;
pub mod section;
mod volume;

pub use band::BandSearchTask;
pub use extremes::ExtremePointsTask;
pub use feature::{classify_slice, BreastDetectionTask};
pub use posture::{
    classify, HorizontalDirection, PostureTask, Side, SideAngles, VerticalDirection,
};
pub use report::{build_record, ReportTask};
pub use volume::VolumeTask;
