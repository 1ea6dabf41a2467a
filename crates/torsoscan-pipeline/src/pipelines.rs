//! Standard task sequences.

use crate::calibration::{
    CenterSearchTask, ReductionDiagnosticTask, SymmetricZoneTask, SymmetryPlaneTask,
    VerticalSlicingTask, ZoneReductionTask,
};
use crate::measurement::{
    BandSearchTask, BreastDetectionTask, ExtremePointsTask, PostureTask, ReportTask, VolumeTask,
};
use crate::record::MeasurementSink;
use crate::scheduler::Scheduler;

/// Queue the calibration stages: after they run the object is centred on
/// the Z axis and yawed so its symmetry plane is XZ.
pub fn enqueue_calibration(scheduler: &mut Scheduler) {
    scheduler.enqueue(VerticalSlicingTask::new);
    scheduler.enqueue(CenterSearchTask::new);
    scheduler.enqueue(SymmetricZoneTask::new);
    scheduler.enqueue(ZoneReductionTask::new);
    scheduler.enqueue(SymmetryPlaneTask::new);
    scheduler.enqueue(ReductionDiagnosticTask::new);
}

/// Queue the measurement stages, ending with one record handed to `sink`.
pub fn enqueue_measurement(scheduler: &mut Scheduler, sink: Box<dyn MeasurementSink>) {
    scheduler.enqueue(BreastDetectionTask::new);
    scheduler.enqueue(BandSearchTask::new);
    scheduler.enqueue(ExtremePointsTask::new);
    scheduler.enqueue(PostureTask::new);
    scheduler.enqueue(VolumeTask::new);
    scheduler.enqueue(move |ctx| ReportTask::new(ctx, sink));
}
