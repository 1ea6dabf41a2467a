//! Stage 5: yaw the object so its mirror plane is the XZ plane.

use rayon::prelude::*;
use torsoscan_math::{mean, median, rotate_2d, Point2};
use torsoscan_mesh::Mesh;
use tracing::{debug, info, warn};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// How well a rotation makes a point set mirror onto itself across the X axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorScore {
    /// Points whose nearest mirrored point is within tolerance.
    pub matched: usize,
    /// Sum of nearest mirrored distances, used to break ties.
    pub residual: f64,
}

/// Score `points` rotated by `theta` radians against their own mirror image.
pub fn mirror_score(points: &[Point2], theta: f64, tolerance: f64) -> MirrorScore {
    let rotated: Vec<Point2> = points.iter().map(|p| rotate_2d(p, theta)).collect();
    let mirrored: Vec<Point2> = rotated.iter().map(|p| Point2::new(p.x, -p.y)).collect();
    let nearest: Vec<f64> = rotated
        .par_iter()
        .map(|v| {
            mirrored
                .iter()
                .map(|m| (v - m).norm())
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    MirrorScore {
        matched: nearest.iter().filter(|&&d| d < tolerance).count(),
        residual: nearest.iter().sum(),
    }
}

/// Sweeps candidate yaw angles over every retained zone slice, keeps each
/// slice's best angle, and applies the mean of the angles close to their
/// median to the object.
///
/// One step scores one angle of one slice.
pub struct SymmetryPlaneTask {
    slices: Vec<Mesh>,
    points: Option<Vec<Point2>>,
    index: usize,
    theta: i32,
    half_range: i32,
    tolerance: f64,
    window: f64,
    best_theta: i32,
    best: MirrorScore,
    angles: Vec<f64>,
}

impl SymmetryPlaneTask {
    /// Take the zone slices from the blackboard.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let slices = ctx
            .blackboard_mut()
            .take_meshes(keys::LARGEST_SYMMETRICAL_ZONE_SLICES)?
            .unwrap_or_default();
        ctx.object_mut().bake_transform();
        let params = ctx.params();
        Ok(Self {
            slices,
            points: None,
            index: 0,
            theta: -params.orientation_half_range,
            half_range: params.orientation_half_range,
            tolerance: params.distance_tolerance,
            window: params.angle_outlier_window,
            best_theta: 0,
            best: MirrorScore {
                matched: 0,
                residual: f64::INFINITY,
            },
            angles: Vec::new(),
        })
    }

    fn next_slice(&mut self) {
        debug!(
            slice = self.index,
            angle = self.best_theta,
            matched = self.best.matched,
            "slice orientation"
        );
        self.angles.push(f64::from(self.best_theta));
        self.index += 1;
        self.points = None;
        self.theta = -self.half_range;
        self.best_theta = 0;
        self.best = MirrorScore {
            matched: 0,
            residual: f64::INFINITY,
        };
    }

    fn finish(&mut self, ctx: &mut PipelineContext) {
        let Some(center) = median(&self.angles) else {
            warn!("no zone slices to orient, object yaw left unchanged");
            ctx.blackboard_mut().set_unset(keys::OBJECT_YAW);
            return;
        };
        let filtered: Vec<f64> = self
            .angles
            .iter()
            .copied()
            .filter(|a| (a - center).abs() <= self.window)
            .collect();
        let yaw = mean(&filtered).unwrap_or(center);
        let object = ctx.object_mut();
        object.rotate_z(yaw.to_radians());
        object.bake_transform();
        info!(
            yaw,
            slices = self.angles.len(),
            outliers = self.angles.len() - filtered.len(),
            "symmetry plane aligned"
        );
        ctx.blackboard_mut().set(keys::OBJECT_YAW, Value::Number(yaw));
    }
}

impl Task for SymmetryPlaneTask {
    fn name(&self) -> &'static str {
        "symmetry_plane_search"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        if self.index >= self.slices.len() {
            self.finish(ctx);
            self.release();
            return Ok(StepOutcome::Done);
        }
        if self.theta > self.half_range {
            self.next_slice();
            return Ok(StepOutcome::Continue);
        }

        let slice = &self.slices[self.index];
        let points = self.points.get_or_insert_with(|| {
            slice
                .world_vertices()
                .iter()
                .map(|p| Point2::new(p.x, p.y))
                .collect()
        });
        let score = mirror_score(points, f64::from(self.theta).to_radians(), self.tolerance);
        let better = score.matched > self.best.matched
            || (score.matched == self.best.matched
                && score.matched > 0
                && score.residual < self.best.residual);
        if better {
            self.best = score;
            self.best_theta = self.theta;
        }
        self.theta += 1;
        Ok(StepOutcome::Continue)
    }

    fn release(&mut self) {
        self.slices.clear();
        self.points = None;
    }
}
