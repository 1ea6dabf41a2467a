//! The six calibration stages, in pipeline order.
//!
//! Together they move the object so that its vertical axis is the Z axis
//! and its mirror plane is the XZ plane.

mod center;
mod reduction_diagnostic;
mod slicing;
mod symmetric_zone;
mod symmetry_plane;
mod zone_reduction;

pub use center::CenterSearchTask;
pub use reduction_diagnostic::ReductionDiagnosticTask;
pub use slicing::VerticalSlicingTask;
pub use symmetric_zone::SymmetricZoneTask;
pub use symmetry_plane::{mirror_score, MirrorScore, SymmetryPlaneTask};
pub use zone_reduction::ZoneReductionTask;
