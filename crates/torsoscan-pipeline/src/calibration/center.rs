//! Stage 2: find the object's vertical axis by cross-matching slices.
//!
//! Every island is used in turn as a reference. The other islands whose
//! bounding cylinders overlap it are clipped by a cylinder of the
//! reference's radius placed on the reference's centre; the closer the
//! clipped part's centre stays to the reference centre, the higher the
//! score. The reference with the best score per axis gives that axis's
//! centre coordinate.

use torsoscan_math::{similarity_coefficient, Point2, Point3, Transform, Vec3};
use torsoscan_mesh::{cylinder, BoundingCylinder, Mesh};
use tracing::{debug, info};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Extra height of the cutting cylinder over a slab.
const CUTTER_MARGIN: f64 = 0.01;

/// Searches the 2D centre of the object and moves the object onto it.
pub struct CenterSearchTask {
    slices: Vec<Mesh>,
    bcyls: Vec<Option<Option<BoundingCylinder>>>,
    cutter: Mesh,
    weight: f64,
    ref_index: usize,
    cur_index: usize,
    intersections: usize,
    scores: (f64, f64),
    best_intersections: usize,
    best_scores: (f64, f64),
    best_center: Point2,
}

impl CenterSearchTask {
    /// Take the slices from the blackboard and build the cutting cylinder.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let slices = ctx
            .blackboard_mut()
            .take_meshes(keys::OBJECT_SLICES)?
            .unwrap_or_default();
        let params = ctx.params();
        let cutter = cylinder(
            1.0,
            params.section_height + CUTTER_MARGIN,
            params.cutting_cylinder_vertices,
        )?;
        let weight = params.similarity_coefficient_weight;
        ctx.object_mut().bake_transform();
        debug!(slices = slices.len(), "center search started");
        Ok(Self {
            bcyls: vec![None; slices.len()],
            slices,
            cutter,
            weight,
            ref_index: 0,
            cur_index: 0,
            intersections: 0,
            scores: (0.0, 0.0),
            best_intersections: 0,
            best_scores: (0.0, 0.0),
            best_center: Point2::origin(),
        })
    }

    fn bcyl(&mut self, index: usize) -> Option<BoundingCylinder> {
        *self.bcyls[index].get_or_insert_with(|| BoundingCylinder::of(&self.slices[index]))
    }

    fn next_reference(&mut self) {
        self.intersections = 0;
        self.scores = (0.0, 0.0);
        self.ref_index += 1;
        self.cur_index = 0;
    }

    fn close_reference(&mut self) {
        if let Some(reference) = self.bcyl(self.ref_index) {
            if self.best_scores.0 < self.scores.0 {
                self.best_scores.0 = self.scores.0;
                self.best_center.x = reference.center.x;
            }
            if self.best_scores.1 < self.scores.1 {
                self.best_scores.1 = self.scores.1;
                self.best_center.y = reference.center.y;
            }
        }
        self.best_intersections = self.best_intersections.max(self.intersections);
        debug!(
            reference = self.ref_index,
            score_x = self.scores.0,
            score_y = self.scores.1,
            "reference slice scored"
        );
        self.next_reference();
    }

    /// No remaining candidate can lift this reference above the best.
    fn cannot_improve(&self) -> bool {
        let remaining = (self.slices.len() - self.cur_index) as f64;
        let deficit = self.best_intersections as f64 - self.intersections as f64;
        (remaining <= self.best_scores.0 - self.scores.0
            && remaining <= self.best_scores.1 - self.scores.1)
            || remaining < deficit
    }

    fn finish(&mut self, ctx: &mut PipelineContext) {
        let center = self.best_center;
        let object = ctx.object_mut();
        object.translate(Vec3::new(-center.x, -center.y, 0.0));
        object.bake_transform();
        info!(x = center.x, y = center.y, "object centered");
        ctx.blackboard_mut().set(
            keys::BEST_CENTER,
            Value::Point(Point3::new(center.x, center.y, 0.0)),
        );
        self.release();
    }
}

impl Task for CenterSearchTask {
    fn name(&self) -> &'static str {
        "center_search"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        let n = self.slices.len();
        if self.ref_index >= n {
            self.finish(ctx);
            return Ok(StepOutcome::Done);
        }
        if self.cur_index >= n {
            self.close_reference();
            return Ok(StepOutcome::Continue);
        }
        if self.cannot_improve() {
            debug!(reference = self.ref_index, "reference pruned");
            self.next_reference();
            return Ok(StepOutcome::Continue);
        }

        let cur = self.cur_index;
        self.cur_index += 1;
        if cur == self.ref_index {
            return Ok(StepOutcome::Continue);
        }
        let (Some(reference), Some(candidate)) = (self.bcyl(self.ref_index), self.bcyl(cur))
        else {
            return Ok(StepOutcome::Continue);
        };
        if !reference.overlaps_xy(&candidate) {
            return Ok(StepOutcome::Continue);
        }

        let r = reference.radius;
        self.cutter.transform = Transform::scale(r, r, 1.0).then(&Transform::translation(
            reference.center.x,
            reference.center.y,
            candidate.center.z,
        ));
        let kernel = ctx.kernel();
        let Some(clipped) = kernel.intersect(&self.slices[cur], &self.cutter) else {
            return Ok(StepOutcome::Continue);
        };
        if let Some(found) = kernel.bounding_cylinder(&clipped) {
            self.intersections += 1;
            self.scores.0 += similarity_coefficient(found.center.x, reference.center.x, r, self.weight);
            self.scores.1 += similarity_coefficient(found.center.y, reference.center.y, r, self.weight);
        }
        Ok(StepOutcome::Continue)
    }

    fn release(&mut self) {
        self.slices.clear();
        self.bcyls.clear();
    }
}
