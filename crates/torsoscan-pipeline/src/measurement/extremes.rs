//! Most forward point on each side of the feature.

use torsoscan_math::{Axis, Point3};
use tracing::{info, warn};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Slack on the upper scan bound against accumulated steps.
const Z_EPS: f64 = 1e-9;

/// Scans every slice in the feature's extent and keeps the vertex with the
/// smallest x separately for `y < 0` (left) and `y > 0` (right).
#[derive(Debug)]
pub struct ExtremePointsTask {
    position: f64,
    top: f64,
    height: f64,
    enabled: bool,
    left: Option<Point3>,
    right: Option<Point3>,
}

impl ExtremePointsTask {
    /// Read the feature's extent.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let board = ctx.blackboard();
        let bottom = board.number(keys::BREAST_BOTTOM_Z)?;
        let top = board.number(keys::BREAST_TOP_Z)?;
        let (position, top, enabled) = match (bottom, top) {
            (Some(b), Some(t)) => (b, t, true),
            _ => (0.0, 0.0, false),
        };
        Ok(Self {
            position,
            top,
            height: ctx.params().chest_isolation_slice_height,
            enabled,
            left: None,
            right: None,
        })
    }

    fn store(&self, ctx: &mut PipelineContext) {
        let board = ctx.blackboard_mut();
        for (key, point, side) in [
            (keys::BEST_LEFT_POINT, self.left, "left"),
            (keys::BEST_RIGHT_POINT, self.right, "right"),
        ] {
            match point {
                Some(p) => {
                    info!(side, x = p.x, y = p.y, z = p.z, "extreme point");
                    board.set(key, Value::Point(p));
                }
                None => {
                    warn!(side, "no extreme point");
                    board.set_unset(key);
                }
            }
        }
    }
}

impl Task for ExtremePointsTask {
    fn name(&self) -> &'static str {
        "extreme_points"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        if !self.enabled || self.position > self.top + Z_EPS {
            self.store(ctx);
            return Ok(StepOutcome::Done);
        }
        let z = self.position;
        self.position += self.height;
        let Some(slice) = ctx.kernel().slice(ctx.object(), Axis::Z, z, self.height) else {
            return Ok(StepOutcome::Continue);
        };
        for v in slice.world_vertices() {
            if v.y < 0.0 && self.left.map_or(true, |l| v.x < l.x) {
                self.left = Some(v);
            } else if v.y > 0.0 && self.right.map_or(true, |r| v.x < r.x) {
                self.right = Some(v);
            }
        }
        Ok(StepOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use torsoscan_math::Vec3;
    use torsoscan_mesh::{cuboid, Mesh};

    use super::*;
    use crate::config::AnalysisParams;
    use crate::scheduler::Scheduler;

    fn run(object: Mesh, extent: Option<(f64, f64)>) -> PipelineContext {
        let params = AnalysisParams {
            chest_isolation_slice_height: 0.01,
            ..AnalysisParams::default()
        };
        let mut ctx = PipelineContext::new(object, params).unwrap();
        let board = ctx.blackboard_mut();
        match extent {
            Some((b, t)) => {
                board.set(keys::BREAST_BOTTOM_Z, Value::Number(b));
                board.set(keys::BREAST_TOP_Z, Value::Number(t));
            }
            None => {
                board.set_unset(keys::BREAST_BOTTOM_Z);
                board.set_unset(keys::BREAST_TOP_Z);
            }
        }
        let mut s = Scheduler::new(ctx);
        s.enqueue(ExtremePointsTask::new);
        s.run_until_idle().unwrap();
        s.into_context()
    }

    #[test]
    fn test_finds_forward_points_per_side() {
        // Body with a longer lobe on the left.
        let mut object = cuboid(Point3::new(0.0, 0.0, 0.1), Vec3::new(0.2, 0.3, 0.2));
        object.merge(&cuboid(Point3::new(-0.155, -0.08, 0.1), Vec3::new(0.09, 0.06, 0.04)));
        object.merge(&cuboid(Point3::new(-0.135, 0.08, 0.1), Vec3::new(0.05, 0.06, 0.04)));

        let ctx = run(object, Some((0.05, 0.15)));
        let left = ctx.blackboard().point(keys::BEST_LEFT_POINT).unwrap().unwrap();
        let right = ctx.blackboard().point(keys::BEST_RIGHT_POINT).unwrap().unwrap();
        approx::assert_relative_eq!(left.x, -0.2, epsilon = 1e-9);
        assert!(left.y < 0.0);
        approx::assert_relative_eq!(right.x, -0.16, epsilon = 1e-9);
        assert!(right.y > 0.0);
    }

    #[test]
    fn test_without_extent_points_are_unset() {
        let object = cuboid(Point3::new(0.0, 0.0, 0.1), Vec3::new(0.2, 0.3, 0.2));
        let ctx = run(object, None);
        assert_eq!(ctx.blackboard().point(keys::BEST_LEFT_POINT).unwrap(), None);
        assert_eq!(ctx.blackboard().point(keys::BEST_RIGHT_POINT).unwrap(), None);
    }
}
