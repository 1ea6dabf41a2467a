//! Band search: the underbust slice where the lobes merge.

use torsoscan_math::Axis;
use torsoscan_mesh::Mesh;
use tracing::{debug, info, warn};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::measurement::section;
use crate::task::{StepOutcome, Task};

/// Scans slices below the forward feature slice and picks the last slice
/// with more than two islands before the count drops to exactly two. Falls
/// back to two slab heights below the start of the feature.
pub struct BandSearchTask {
    position: f64,
    forward_z: Option<f64>,
    feature_start: Option<f64>,
    height: f64,
    previous: Option<(f64, Vec<Mesh>)>,
    band: Option<(f64, Vec<Mesh>)>,
}

impl BandSearchTask {
    /// Read the feature's forward slice and extent.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let board = ctx.blackboard();
        let forward_z = board.number(keys::BREAST_FORWARD_Z)?;
        let bottom = board.number(keys::BREAST_BOTTOM_Z)?;
        let h = ctx.params().chest_isolation_slice_height;
        let position = ctx
            .kernel()
            .bounding_box(ctx.object())
            .map_or(0.0, |bbox| bbox.min.z + h / 2.0);
        Ok(Self {
            position,
            forward_z,
            feature_start: bottom.map(|b| b + h),
            height: h,
            previous: None,
            band: None,
        })
    }

    fn fallback(&self, ctx: &PipelineContext) -> Option<(f64, Vec<Mesh>)> {
        let z = self.feature_start? - 2.0 * self.height;
        warn!(z, "no island transition below the feature, using fallback band height");
        let kernel = ctx.kernel();
        let slice = kernel.slice(ctx.object(), Axis::Z, z, self.height)?;
        Some((z, kernel.islands(&slice)))
    }

    fn store(&mut self, ctx: &mut PipelineContext) {
        let band = self.band.take().or_else(|| self.fallback(ctx));
        let Some((z, islands)) = band else {
            warn!("no band detected");
            let board = ctx.blackboard_mut();
            board.set_unset(keys::Z_BAND);
            board.set_unset(keys::BAND);
            return;
        };
        let kernel = ctx.kernel();
        if islands.len() > 1 {
            debug!(islands = islands.len(), "keeping the largest band island");
        }
        let band = section::largest_island(kernel, islands)
            .and_then(|island| section::circumference(kernel, &island));

        let board = ctx.blackboard_mut();
        board.set(keys::Z_BAND, Value::Number(z));
        match band {
            Some(perimeter) => {
                info!(z, band = perimeter, "band found");
                board.set(keys::BAND, Value::Number(perimeter));
            }
            None => {
                warn!(z, "invalid hull for band circumference");
                board.set_unset(keys::BAND);
            }
        }
    }
}

impl Task for BandSearchTask {
    fn name(&self) -> &'static str {
        "band_search"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        let Some(forward_z) = self.forward_z else {
            warn!("no feature, band search skipped");
            let board = ctx.blackboard_mut();
            board.set_unset(keys::Z_BAND);
            board.set_unset(keys::BAND);
            return Ok(StepOutcome::Done);
        };
        if self.band.is_some() || self.position >= forward_z {
            self.store(ctx);
            self.release();
            return Ok(StepOutcome::Done);
        }

        let z = self.position;
        self.position += self.height;
        let kernel = ctx.kernel();
        let Some(slice) = kernel.slice(ctx.object(), Axis::Z, z, self.height) else {
            return Ok(StepOutcome::Continue);
        };
        let islands = kernel.islands(&slice);
        debug!(z, islands = islands.len(), "band scan");
        let merged = islands.len() == 2
            && self
                .previous
                .as_ref()
                .is_some_and(|(_, prev)| prev.len() > 2);
        if merged {
            self.band = self.previous.take();
        } else {
            self.previous = Some((z, islands));
        }
        Ok(StepOutcome::Continue)
    }

    fn release(&mut self) {
        self.previous = None;
        self.band = None;
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use torsoscan_math::Vec3;
    use torsoscan_mesh::cylinder;

    use super::*;
    use crate::config::AnalysisParams;
    use crate::scheduler::Scheduler;

    fn column(x: f64, y: f64, height: f64) -> Mesh {
        let mut c = cylinder(0.04, height, 32).unwrap();
        c.translate(Vec3::new(x, y, height / 2.0));
        c.to_world()
    }

    fn run(object: Mesh, forward_z: Option<f64>, bottom: Option<f64>) -> PipelineContext {
        let params = AnalysisParams {
            chest_isolation_slice_height: 0.01,
            ..AnalysisParams::default()
        };
        let mut ctx = PipelineContext::new(object, params).unwrap();
        let board = ctx.blackboard_mut();
        for (key, value) in [(keys::BREAST_FORWARD_Z, forward_z), (keys::BREAST_BOTTOM_Z, bottom)] {
            match value {
                Some(v) => board.set(key, Value::Number(v)),
                None => board.set_unset(key),
            }
        }
        let mut s = Scheduler::new(ctx);
        s.enqueue(BandSearchTask::new);
        s.run_until_idle().unwrap();
        s.into_context()
    }

    fn polygon_perimeter(r: f64, n: f64) -> f64 {
        2.0 * n * r * (PI / n).sin()
    }

    #[test]
    fn test_three_to_two_transition() {
        let mut object = column(0.0, -0.1, 0.3);
        object.merge(&column(0.0, 0.1, 0.3));
        object.merge(&column(0.15, 0.0, 0.117));

        let ctx = run(object, Some(0.25), Some(0.2));
        let board = ctx.blackboard();
        approx::assert_relative_eq!(
            board.number(keys::Z_BAND).unwrap().unwrap(),
            0.115,
            epsilon = 1e-9
        );
        approx::assert_relative_eq!(
            board.number(keys::BAND).unwrap().unwrap(),
            polygon_perimeter(0.04, 32.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_fallback_below_feature_start() {
        let object = column(0.0, 0.0, 0.3);
        let ctx = run(object, Some(0.25), Some(0.2));
        let board = ctx.blackboard();
        // Start = bottom + h; fallback = start - 2h.
        approx::assert_relative_eq!(
            board.number(keys::Z_BAND).unwrap().unwrap(),
            0.19,
            epsilon = 1e-9
        );
        assert!(board.number(keys::BAND).unwrap().is_some());
    }

    #[test]
    fn test_without_feature_band_is_unset() {
        let ctx = run(column(0.0, 0.0, 0.3), None, None);
        assert_eq!(ctx.blackboard().number(keys::Z_BAND).unwrap(), None);
        assert_eq!(ctx.blackboard().number(keys::BAND).unwrap(), None);
    }
}
