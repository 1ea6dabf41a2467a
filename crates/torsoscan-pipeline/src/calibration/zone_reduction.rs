//! Stage 4: keep the zone slices that are not just a plain cylinder.

use torsoscan_math::{Axis, Vec3};
use torsoscan_mesh::{cylinder, Mesh};
use tracing::{debug, info, warn};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Footprint and volume of the reference cylinder slab.
#[derive(Debug, Clone, Copy)]
struct Reference {
    dims: Vec3,
    volume: f64,
}

/// Slices the symmetrical zone and discards slices whose width, depth and
/// volume are all close to a reference cylinder of the zone radius. The
/// kept slices are decimated and stored under
/// `LARGEST_SYMMETRICAL_ZONE_SLICES`.
pub struct ZoneReductionTask {
    zone: Option<Mesh>,
    reference: Option<Reference>,
    position: f64,
    max_position: f64,
    section_height: f64,
    threshold: f64,
    max_vertices: usize,
    kept: Vec<Mesh>,
    discarded: usize,
}

impl ZoneReductionTask {
    /// Take the zone from the blackboard and measure the reference cylinder.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let radius = ctx
            .blackboard()
            .number(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS)?;
        let zone = ctx
            .blackboard_mut()
            .take_mesh(keys::LARGEST_SYMMETRICAL_ZONE)?;
        let params = ctx.params();
        let h = params.section_height;

        let reference = match radius {
            Some(r) if r > 0.0 => {
                let cyl = cylinder(r, h, params.cutting_cylinder_vertices)?;
                ctx.kernel().bounding_box(&cyl).map(|bbox| Reference {
                    dims: bbox.dimensions(),
                    volume: ctx.kernel().volume(&cyl),
                })
            }
            _ => None,
        };
        let (position, max_position) = match ctx.kernel().bounding_box(ctx.object()) {
            Some(bbox) => (bbox.min.z + h / 2.0, bbox.max.z),
            None => (0.0, 0.0),
        };
        Ok(Self {
            zone,
            reference,
            position,
            max_position,
            section_height: h,
            threshold: params.cylinder_similarity_threshold,
            max_vertices: params.max_vertices_for_fast_processing,
            kept: Vec::new(),
            discarded: 0,
        })
    }

    fn is_cylindrical(&self, ctx: &PipelineContext, slice: &Mesh, reference: &Reference) -> bool {
        let Some(bbox) = ctx.kernel().bounding_box(slice) else {
            return false;
        };
        let dims = bbox.dimensions();
        let volume = ctx.kernel().volume(slice);
        dims.x / reference.dims.x > self.threshold
            && dims.y / reference.dims.y > self.threshold
            && volume / reference.volume > self.threshold
    }
}

impl Task for ZoneReductionTask {
    fn name(&self) -> &'static str {
        "zone_reduction"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        let (Some(zone), Some(reference)) = (self.zone.as_ref(), self.reference) else {
            warn!("no symmetrical zone to reduce");
            ctx.blackboard_mut()
                .set(keys::LARGEST_SYMMETRICAL_ZONE_SLICES, Value::Meshes(Vec::new()));
            return Ok(StepOutcome::Done);
        };
        if self.position >= self.max_position {
            info!(
                kept = self.kept.len(),
                discarded = self.discarded,
                "symmetrical zone reduced"
            );
            let kept = std::mem::take(&mut self.kept);
            ctx.blackboard_mut()
                .set(keys::LARGEST_SYMMETRICAL_ZONE_SLICES, Value::Meshes(kept));
            self.release();
            return Ok(StepOutcome::Done);
        }

        let z = self.position;
        self.position += self.section_height;
        let Some(mut slice) = ctx.kernel().slice(zone, Axis::Z, z, self.section_height) else {
            return Ok(StepOutcome::Continue);
        };
        if self.is_cylindrical(ctx, &slice, &reference) {
            debug!(z, "zone slice too cylindrical");
            self.discarded += 1;
        } else {
            ctx.kernel().decimate(&mut slice, self.max_vertices);
            debug!(z, vertices = slice.vertex_count(), "zone slice kept");
            self.kept.push(slice);
        }
        Ok(StepOutcome::Continue)
    }

    fn release(&mut self) {
        self.zone = None;
        self.kept.clear();
    }
}

#[cfg(test)]
mod tests {
    use torsoscan_math::Point3;
    use torsoscan_mesh::{clip_convex, cuboid, BoundingBox, Plane};

    use super::*;
    use crate::config::AnalysisParams;
    use crate::scheduler::Scheduler;

    fn run(object: Mesh, zone: Option<(Mesh, f64)>) -> PipelineContext {
        let params = AnalysisParams {
            section_height: 0.05,
            cutting_cylinder_vertices: 32,
            ..AnalysisParams::default()
        };
        let mut ctx = PipelineContext::new(object, params).unwrap();
        let board = ctx.blackboard_mut();
        match zone {
            Some((mesh, radius)) => {
                board.set(keys::LARGEST_SYMMETRICAL_ZONE, Value::Mesh(mesh));
                board.set(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS, Value::Number(radius));
            }
            None => {
                board.set_unset(keys::LARGEST_SYMMETRICAL_ZONE);
                board.set_unset(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS);
            }
        }
        let mut s = Scheduler::new(ctx);
        s.enqueue(ZoneReductionTask::new);
        s.run_until_idle().unwrap();
        s.into_context()
    }

    #[test]
    fn test_keeps_only_non_cylindrical_slices() {
        // Full cylinder below z = 0.2, a half-cylinder above.
        let lower = {
            let mut m = cylinder(0.1, 0.2, 32).unwrap();
            m.translate(Vec3::new(0.0, 0.0, 0.1));
            m
        };
        let upper = {
            let mut m = cylinder(0.1, 0.18, 32).unwrap();
            m.translate(Vec3::new(0.0, 0.0, 0.3));
            clip_convex(&m, &[Plane::axis_aligned(Axis::X, 0.0, false)])
        };
        let mut zone = lower.clone();
        zone.merge(&upper);
        let object = cuboid(Point3::new(0.0, 0.0, 0.2), Vec3::new(0.3, 0.3, 0.4));

        let mut ctx = run(object, Some((zone, 0.1)));
        let kept = ctx
            .blackboard_mut()
            .take_meshes(keys::LARGEST_SYMMETRICAL_ZONE_SLICES)
            .unwrap()
            .unwrap();
        assert_eq!(kept.len(), 4);
        for slice in &kept {
            let bbox = BoundingBox::of(slice).unwrap();
            assert!(bbox.min.z >= 0.2 - 1e-9);
            assert!(bbox.max.x <= 1e-9);
            assert!(slice.vertex_count() <= 200);
        }
        assert!(ctx
            .blackboard()
            .mesh(keys::LARGEST_SYMMETRICAL_ZONE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_without_zone_stores_empty_list() {
        let object = cuboid(Point3::new(0.0, 0.0, 0.2), Vec3::new(0.3, 0.3, 0.4));
        let mut ctx = run(object, None);
        assert!(ctx
            .blackboard_mut()
            .take_meshes(keys::LARGEST_SYMMETRICAL_ZONE_SLICES)
            .unwrap()
            .unwrap()
            .is_empty());
    }
}
