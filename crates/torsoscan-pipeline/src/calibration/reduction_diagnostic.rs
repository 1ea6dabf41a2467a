//! Stage 6: log slice volumes of the calibrated object.

use torsoscan_math::Axis;
use tracing::{debug, info};

use crate::context::PipelineContext;
use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Re-slices the calibrated object and reports the volume of each slab and
/// its change from the slab below. Writes nothing to the blackboard.
#[derive(Debug)]
pub struct ReductionDiagnosticTask {
    position: f64,
    max_position: f64,
    section_height: f64,
    volumes: Vec<f64>,
}

impl ReductionDiagnosticTask {
    /// Read the object's vertical extent.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let h = ctx.params().section_height;
        let (position, max_position) = match ctx.kernel().bounding_box(ctx.object()) {
            Some(bbox) => (bbox.min.z + h / 2.0, bbox.max.z),
            None => (0.0, 0.0),
        };
        Ok(Self {
            position,
            max_position,
            section_height: h,
            volumes: Vec::new(),
        })
    }

    /// Volumes measured so far, bottom to top.
    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }
}

impl Task for ReductionDiagnosticTask {
    fn name(&self) -> &'static str {
        "reduction_diagnostic"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        if self.position >= self.max_position {
            info!(
                slices = self.volumes.len(),
                total = self.volumes.iter().sum::<f64>(),
                "slice volumes checked"
            );
            return Ok(StepOutcome::Done);
        }
        let kernel = ctx.kernel();
        let volume = kernel
            .slice(ctx.object(), Axis::Z, self.position, self.section_height)
            .map_or(0.0, |slab| kernel.volume(&slab));
        match self.volumes.last() {
            Some(prev) => debug!(z = self.position, volume, delta = volume - prev, "slice volume"),
            None => debug!(z = self.position, volume, "slice volume"),
        }
        self.volumes.push(volume);
        self.position += self.section_height;
        Ok(StepOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use torsoscan_math::{Point3, Vec3};
    use torsoscan_mesh::{cuboid, Mesh};

    use super::*;
    use crate::config::AnalysisParams;

    #[test]
    fn test_volumes_sum_to_object() {
        let object = cuboid(Point3::new(0.0, 0.0, 0.1), Vec3::new(0.1, 0.1, 0.2));
        let params = AnalysisParams {
            section_height: 0.05,
            ..AnalysisParams::default()
        };
        let mut ctx = PipelineContext::new(object, params).unwrap();
        let mut task = ReductionDiagnosticTask::new(&mut ctx).unwrap();
        while task.step_once(&mut ctx).unwrap() == StepOutcome::Continue {}

        assert_eq!(task.volumes().len(), 4);
        for v in task.volumes() {
            approx::assert_relative_eq!(*v, 0.1 * 0.1 * 0.05, epsilon = 1e-12);
        }
        assert!(ctx.blackboard().is_empty());
    }

    #[test]
    fn test_empty_object_finishes_at_once() {
        let mut ctx = PipelineContext::new(Mesh::new("o"), AnalysisParams::default()).unwrap();
        let mut task = ReductionDiagnosticTask::new(&mut ctx).unwrap();
        assert_eq!(task.step_once(&mut ctx).unwrap(), StepOutcome::Done);
    }
}
