//! Detection of the bilateral frontal feature and its forward slice.

use torsoscan_math::{Axis, Point3};
use tracing::{debug, info, warn};

use crate::blackboard::{keys, Value};
use crate::config::AnalysisParams;
use crate::context::PipelineContext;
use crate::error::Result;
use crate::measurement::section;
use crate::task::{StepOutcome, Task};

/// Forward-most x of a slice holding the feature, or `None`.
///
/// Vertices are split into left (`y < -w`), right (`y > w`) and centre
/// groups by the centre band half-width `w`. The slice qualifies when all
/// three groups are populated, both sides lead the centre by at least the
/// minimum depth, and the two leading points are far enough apart.
pub fn classify_slice(vertices: &[Point3], params: &AnalysisParams) -> Option<f64> {
    if vertices.len() < 3 {
        return None;
    }
    let band = params.center_band_half_width;
    let forward = |keep: &dyn Fn(&Point3) -> bool| {
        vertices
            .iter()
            .filter(|v| keep(*v))
            .min_by(|a, b| a.x.total_cmp(&b.x))
    };
    let left = forward(&|v| v.y < -band)?;
    let right = forward(&|v| v.y > band)?;
    let center = forward(&|v| v.y.abs() <= band)?;

    if center.x - left.x < params.min_feature_depth || center.x - right.x < params.min_feature_depth {
        return None;
    }
    if (left.xy() - right.xy()).norm() < params.min_feature_separation {
        return None;
    }
    Some(left.x.min(right.x))
}

/// Scans thin slices bottom to top for the feature. The first run of
/// qualifying slices gives its vertical extent; the most forward one gives
/// the half-widths and the bust circumference.
pub struct BreastDetectionTask {
    position: f64,
    max_position: f64,
    height: f64,
    detecting: bool,
    run_ended: bool,
    hits: Vec<(f64, f64)>,
}

impl BreastDetectionTask {
    /// Read the object's vertical extent.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let h = ctx.params().chest_isolation_slice_height;
        let (position, max_position) = match ctx.kernel().bounding_box(ctx.object()) {
            Some(bbox) => (bbox.min.z + h / 2.0, bbox.max.z),
            None => (0.0, 0.0),
        };
        Ok(Self {
            position,
            max_position,
            height: h,
            detecting: false,
            run_ended: false,
            hits: Vec::new(),
        })
    }

    fn store(&self, ctx: &mut PipelineContext) {
        const OUTPUTS: [&str; 7] = [
            keys::BREAST_HEIGHT,
            keys::BREAST_BOTTOM_Z,
            keys::BREAST_TOP_Z,
            keys::BREAST_FORWARD_Z,
            keys::WIDTH_LEFT,
            keys::WIDTH_RIGHT,
            keys::BUST,
        ];
        let (Some(&(first, _)), Some(&(last, _))) = (self.hits.first(), self.hits.last()) else {
            warn!("feature not detected");
            let board = ctx.blackboard_mut();
            for key in OUTPUTS {
                board.set_unset(key);
            }
            return;
        };

        let h = self.height;
        let (bottom, top) = (first - h, last + h);
        let forward_z = self
            .hits
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(first, |&(z, _)| z);
        info!(bottom, top, height = top - bottom, forward_z, "feature detected");

        let margin = ctx.params().width_margin;
        let kernel = ctx.kernel();
        let forward = kernel.slice(ctx.object(), Axis::Z, forward_z, h);
        let widths = forward.as_ref().and_then(|slice| {
            let verts = slice.world_vertices();
            let min_y = verts.iter().map(|v| v.y).reduce(f64::min)?;
            let max_y = verts.iter().map(|v| v.y).reduce(f64::max)?;
            Some((min_y.abs() - margin, max_y.abs() - margin))
        });
        let bust = forward
            .as_ref()
            .and_then(|slice| section::circumference(kernel, slice));
        if bust.is_none() {
            warn!(z = forward_z, "invalid hull for bust circumference");
        }

        let board = ctx.blackboard_mut();
        board.set(keys::BREAST_HEIGHT, Value::Number(top - bottom));
        board.set(keys::BREAST_BOTTOM_Z, Value::Number(bottom));
        board.set(keys::BREAST_TOP_Z, Value::Number(top));
        board.set(keys::BREAST_FORWARD_Z, Value::Number(forward_z));
        match widths {
            Some((left, right)) => {
                debug!(left, right, "forward slice widths");
                board.set(keys::WIDTH_LEFT, Value::Number(left));
                board.set(keys::WIDTH_RIGHT, Value::Number(right));
            }
            None => {
                board.set_unset(keys::WIDTH_LEFT);
                board.set_unset(keys::WIDTH_RIGHT);
            }
        }
        match bust {
            Some(bust) => board.set(keys::BUST, Value::Number(bust)),
            None => board.set_unset(keys::BUST),
        }
    }
}

impl Task for BreastDetectionTask {
    fn name(&self) -> &'static str {
        "breast_detection"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        if self.position >= self.max_position || self.run_ended {
            self.store(ctx);
            return Ok(StepOutcome::Done);
        }

        let z = self.position;
        self.position += self.height;
        let Some(slice) = ctx.kernel().slice(ctx.object(), Axis::Z, z, self.height) else {
            return Ok(StepOutcome::Continue);
        };
        match classify_slice(&slice.world_vertices(), ctx.params()) {
            Some(x_min) => {
                if !self.detecting {
                    debug!(z, "feature starts");
                    self.detecting = true;
                }
                self.hits.push((z, x_min));
            }
            None if self.detecting => {
                debug!(z, "feature ends");
                self.detecting = false;
                self.run_ended = true;
            }
            None => {}
        }
        Ok(StepOutcome::Continue)
    }

    fn release(&mut self) {
        self.hits.clear();
    }
}

#[cfg(test)]
mod tests {
    use torsoscan_math::Vec3;
    use torsoscan_mesh::{cylinder, Mesh, TorsoPhantom};

    use super::*;
    use crate::scheduler::Scheduler;

    fn points(coords: &[(f64, f64)]) -> Vec<Point3> {
        coords.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect()
    }

    #[test]
    fn test_classify_two_lobes() {
        let params = AnalysisParams::default();
        let lobes = points(&[(-0.12, -0.07), (-0.12, 0.07), (-0.09, 0.0), (0.1, 0.0)]);
        approx::assert_relative_eq!(classify_slice(&lobes, &params).unwrap(), -0.12);

        // Centre leads: no feature.
        let flat = points(&[(-0.10, -0.07), (-0.10, 0.07), (-0.12, 0.0)]);
        assert!(classify_slice(&flat, &params).is_none());

        // Lobes too close together.
        let narrow = points(&[(-0.12, -0.015), (-0.12, 0.015), (-0.09, 0.0)]);
        assert!(classify_slice(&narrow, &params).is_none());

        // No centre vertex.
        let gap = points(&[(-0.12, -0.07), (-0.12, 0.07), (0.1, 0.05)]);
        assert!(classify_slice(&gap, &params).is_none());
    }

    #[test]
    fn test_detects_phantom_bumps() {
        let params = AnalysisParams {
            chest_isolation_slice_height: 0.004,
            ..AnalysisParams::default()
        };
        let ctx = PipelineContext::new(TorsoPhantom::default().build(), params).unwrap();
        let mut s = Scheduler::new(ctx);
        s.enqueue(BreastDetectionTask::new);
        s.run_until_idle().unwrap();
        let ctx = s.into_context();
        let board = ctx.blackboard();

        let bottom = board.number(keys::BREAST_BOTTOM_Z).unwrap().unwrap();
        let top = board.number(keys::BREAST_TOP_Z).unwrap().unwrap();
        let forward = board.number(keys::BREAST_FORWARD_Z).unwrap().unwrap();
        assert!(bottom > 0.2 && bottom < 0.28, "bottom {bottom}");
        assert!(top > 0.28 && top < 0.36, "top {top}");
        assert!(forward > bottom && forward < top);
        approx::assert_relative_eq!(
            board.number(keys::BREAST_HEIGHT).unwrap().unwrap(),
            top - bottom
        );

        let left = board.number(keys::WIDTH_LEFT).unwrap().unwrap();
        let right = board.number(keys::WIDTH_RIGHT).unwrap().unwrap();
        assert!((left - right).abs() < 1e-9);
        assert!(left > 0.1 && left < 0.14);
        assert!(board.number(keys::BUST).unwrap().unwrap() > 0.6);
    }

    #[test]
    fn test_column_has_no_feature() {
        let mut column: Mesh = cylinder(0.1, 0.1, 32).unwrap();
        column.translate(Vec3::new(0.0, 0.0, 0.05));
        let params = AnalysisParams {
            chest_isolation_slice_height: 0.01,
            ..AnalysisParams::default()
        };
        let mut s = Scheduler::new(PipelineContext::new(column, params).unwrap());
        s.enqueue(BreastDetectionTask::new);
        s.run_until_idle().unwrap();
        let board = s.context().blackboard();
        assert_eq!(board.number(keys::BREAST_HEIGHT).unwrap(), None);
        assert_eq!(board.number(keys::BUST).unwrap(), None);
    }
}
