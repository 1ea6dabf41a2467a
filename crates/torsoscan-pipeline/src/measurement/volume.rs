//! Symmetric-difference volume of the feature.
//!
//! Each slice between the band and the top of the feature contributes the
//! area of its front hull in excess of a reference cross-section: the band
//! slice below the band/top midpoint, the top slice above it.

use torsoscan_math::Axis;
use tracing::{debug, info, warn};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::measurement::section;
use crate::task::{StepOutcome, Task};

/// Slack on the upper scan bound against accumulated steps.
const Z_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Cutoff,
    BandReference { x_cutoff: f64 },
    TopReference { x_cutoff: f64, band_area: f64 },
    Integrate {
        x_cutoff: f64,
        band_area: f64,
        top_area: f64,
    },
}

/// Integrates the front-hull area in excess of the band and top references.
#[derive(Debug)]
pub struct VolumeTask {
    phase: Phase,
    range: Option<(f64, f64)>,
    position: f64,
    height: f64,
    total: f64,
}

impl VolumeTask {
    /// Read the band and the top of the feature.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let board = ctx.blackboard();
        board.require(&[keys::BREAST_BOTTOM_Z])?;
        let top = board.number(keys::BREAST_TOP_Z)?;
        let z_band = board.number(keys::Z_BAND)?;
        let range = z_band.zip(top);
        Ok(Self {
            phase: Phase::Cutoff,
            range,
            position: range.map_or(0.0, |(band, _)| band),
            height: ctx.params().chest_isolation_slice_height,
            total: 0.0,
        })
    }

    fn give_up(&self, ctx: &mut PipelineContext, reason: &str) -> Result<StepOutcome> {
        warn!(reason, "volume not measured");
        ctx.blackboard_mut().set_unset(keys::BREAST_VOLUME);
        Ok(StepOutcome::Done)
    }
}

impl Task for VolumeTask {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        let Some((z_band, top)) = self.range else {
            return self.give_up(ctx, "band or top missing");
        };
        let h = self.height;
        let kernel = ctx.kernel();
        let object = ctx.object();

        match self.phase {
            Phase::Cutoff => {
                let band = ctx.params().center_band_half_width;
                let front = kernel.slice(object, Axis::Z, top, h).and_then(|slice| {
                    slice
                        .world_vertices()
                        .iter()
                        .filter(|v| v.y.abs() < band)
                        .map(|v| v.x)
                        .reduce(f64::min)
                });
                let Some(front) = front else {
                    return self.give_up(ctx, "no centre vertices on the top slice");
                };
                let x_cutoff = front + ctx.params().volume_cutoff_offset;
                debug!(x_cutoff, "front cutoff");
                self.phase = Phase::BandReference { x_cutoff };
            }
            Phase::BandReference { x_cutoff } => {
                let Some(slice) = kernel.slice(object, Axis::Z, z_band, h) else {
                    return self.give_up(ctx, "empty band slice");
                };
                let band_area = section::largest_island(kernel, kernel.islands(&slice))
                    .map_or(0.0, |island| section::front_area(kernel, &island, x_cutoff));
                self.phase = Phase::TopReference {
                    x_cutoff,
                    band_area,
                };
            }
            Phase::TopReference {
                x_cutoff,
                band_area,
            } => {
                let top_area = kernel
                    .slice(object, Axis::Z, top, h)
                    .map_or(0.0, |slice| section::front_area(kernel, &slice, x_cutoff));
                debug!(band_area, top_area, "reference areas");
                self.phase = Phase::Integrate {
                    x_cutoff,
                    band_area,
                    top_area,
                };
            }
            Phase::Integrate {
                x_cutoff,
                band_area,
                top_area,
            } => {
                if self.position > top + Z_EPS {
                    info!(volume = self.total, "feature volume");
                    ctx.blackboard_mut()
                        .set(keys::BREAST_VOLUME, Value::Number(self.total));
                    return Ok(StepOutcome::Done);
                }
                let z = self.position;
                self.position += h;
                let Some(slice) = kernel.slice(object, Axis::Z, z, h) else {
                    return Ok(StepOutcome::Continue);
                };
                let area = section::front_area(kernel, &slice, x_cutoff);
                let reference = if z >= (z_band + top) / 2.0 {
                    top_area
                } else {
                    band_area
                };
                self.total += (area - reference).max(0.0) * h;
            }
        }
        Ok(StepOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use torsoscan_math::{Point3, Vec3};
    use torsoscan_mesh::{cuboid, cylinder, Mesh};

    use super::*;
    use crate::config::AnalysisParams;
    use crate::scheduler::Scheduler;

    /// Upright column of radius 0.1 over z in [0, 0.3].
    fn column() -> Mesh {
        let mut c = cylinder(0.1, 0.3, 32).unwrap();
        c.translate(Vec3::new(0.0, 0.0, 0.15));
        c.to_world()
    }

    fn run(object: Mesh, band: Value, top: f64) -> PipelineContext {
        let params = AnalysisParams {
            chest_isolation_slice_height: 0.01,
            ..AnalysisParams::default()
        };
        let mut ctx = PipelineContext::new(object, params).unwrap();
        let board = ctx.blackboard_mut();
        board.set(keys::BREAST_BOTTOM_Z, Value::Number(0.0));
        board.set(keys::BREAST_TOP_Z, Value::Number(top));
        board.set(keys::Z_BAND, band);
        let mut s = Scheduler::new(ctx);
        s.enqueue(VolumeTask::new);
        s.run_until_idle().unwrap();
        s.into_context()
    }

    #[test]
    fn test_plain_column_has_no_excess() {
        let ctx = run(column(), Value::Number(0.05), 0.25);
        approx::assert_relative_eq!(
            ctx.blackboard().number(keys::BREAST_VOLUME).unwrap().unwrap(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_protrusion_adds_its_front_hull() {
        // A 0.04 x 0.2 lip in front of the column over z in [0.1, 0.2].
        // The cutoff is 0.05 behind the column front, at x = -0.05.
        let mut object = column();
        object.merge(&cuboid(Point3::new(-0.125, 0.0, 0.15), Vec3::new(0.04, 0.2, 0.1)));
        let ctx = run(object, Value::Number(0.05), 0.25);
        let volume = ctx.blackboard().number(keys::BREAST_VOLUME).unwrap().unwrap();

        // Eleven slabs touch the lip. Each gains at least the lip footprint
        // and at most the front bounding box minus the column's own front.
        let lip = 0.04 * 0.2;
        let segment = 0.01 * (0.5f64).acos() - 0.05 * 0.0075f64.sqrt();
        let bound = 0.095 * 0.2 - segment;
        assert!(volume >= 11.0 * lip * 0.01 - 1e-9, "volume {volume}");
        assert!(volume <= 11.0 * bound * 0.01, "volume {volume}");
    }

    #[test]
    fn test_unset_band_leaves_volume_unset() {
        let ctx = run(column(), Value::Unset, 0.25);
        assert_eq!(ctx.blackboard().number(keys::BREAST_VOLUME).unwrap(), None);
    }
}
