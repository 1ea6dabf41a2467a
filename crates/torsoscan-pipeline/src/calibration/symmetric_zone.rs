//! Stage 3: the widest central cylinder whose cut stays centred when spun.

use torsoscan_math::Transform;
use torsoscan_mesh::{cylinder, Mesh};
use tracing::{debug, info, warn};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Extra height of the cutter over the object.
const CUTTER_MARGIN: f64 = 0.0001;

/// Shrinks a vertical cutting cylinder around the Z axis until the part of
/// the object inside it keeps its bounding-box centre on the axis through
/// a full rotation sweep.
///
/// Each cut is decimated to `max_zone_vertices` so a rotation check stays
/// bounded on dense scans. One step performs either one cut or one rotation
/// check.
pub struct SymmetricZoneTask {
    cutter: Mesh,
    tolerance: f64,
    radius_step: f64,
    sweep: u32,
    max_vertices: usize,
    center_z: f64,
    radius: f64,
    rotation: u32,
    zone: Option<Mesh>,
}

impl SymmetricZoneTask {
    /// Start at the object's bounding-cylinder radius.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let kernel = ctx.kernel();
        let (depth, center_z) = match kernel.bounding_box(ctx.object()) {
            Some(bbox) => (bbox.dimensions().z + CUTTER_MARGIN, bbox.center().z),
            None => (CUTTER_MARGIN, 0.0),
        };
        let radius = kernel
            .bounding_cylinder(ctx.object())
            .map_or(0.0, |bcyl| bcyl.radius);
        let params = ctx.params();
        let cutter = cylinder(1.0, depth, params.cutting_cylinder_vertices)?;
        debug!(radius, "symmetric zone search started");
        Ok(Self {
            cutter,
            tolerance: params.coordinate_tolerance,
            radius_step: params.zone_radius_step,
            sweep: params.zone_rotation_sweep,
            max_vertices: params.max_zone_vertices,
            center_z,
            radius,
            rotation: 0,
            zone: None,
        })
    }

    fn shrink(&mut self) {
        self.zone = None;
        self.rotation = 0;
        self.radius -= self.radius_step;
    }
}

impl Task for SymmetricZoneTask {
    fn name(&self) -> &'static str {
        "symmetric_zone_search"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        if self.radius <= 0.0 {
            warn!("no symmetrical zone found");
            let board = ctx.blackboard_mut();
            board.set_unset(keys::LARGEST_SYMMETRICAL_ZONE);
            board.set_unset(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS);
            self.release();
            return Ok(StepOutcome::Done);
        }

        if self.zone.is_none() {
            let r = self.radius;
            self.cutter.transform = Transform::scale(r, r, 1.0)
                .then(&Transform::translation(0.0, 0.0, self.center_z));
            let kernel = ctx.kernel();
            match kernel.intersect(ctx.object(), &self.cutter) {
                Some(mut zone) => {
                    zone.name = "largest_symmetrical_zone".into();
                    kernel.decimate(&mut zone, self.max_vertices);
                    self.zone = Some(zone);
                }
                None => self.shrink(),
            }
            return Ok(StepOutcome::Continue);
        }
        let Some(zone) = self.zone.as_mut() else {
            return Ok(StepOutcome::Continue);
        };

        if self.rotation == self.sweep {
            zone.transform = Transform::identity();
            info!(radius = self.radius, "largest symmetrical zone found");
            if let Some(zone) = self.zone.take() {
                let board = ctx.blackboard_mut();
                board.set(keys::LARGEST_SYMMETRICAL_ZONE, Value::Mesh(zone));
                board.set(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS, Value::Number(self.radius));
            }
            return Ok(StepOutcome::Done);
        }

        zone.transform = Transform::rotation_z(f64::from(self.rotation).to_radians());
        let tolerance = self.tolerance;
        let centered = ctx.kernel().bounding_box(zone).is_some_and(|bbox| {
            let c = bbox.center();
            c.x.abs() <= tolerance && c.y.abs() <= tolerance
        });
        if centered {
            self.rotation += 1;
        } else {
            debug!(radius = self.radius, angle = self.rotation, "zone off-centre");
            self.shrink();
        }
        Ok(StepOutcome::Continue)
    }

    fn release(&mut self) {
        self.zone = None;
    }
}

#[cfg(test)]
mod tests {
    use torsoscan_math::{Point3, Vec3};
    use torsoscan_mesh::cuboid;

    use super::*;
    use crate::config::AnalysisParams;
    use crate::scheduler::Scheduler;

    fn params() -> AnalysisParams {
        AnalysisParams {
            cutting_cylinder_vertices: 32,
            zone_rotation_sweep: 30,
            ..AnalysisParams::default()
        }
    }

    fn run(object: Mesh) -> PipelineContext {
        let mut s = Scheduler::new(PipelineContext::new(object, params()).unwrap());
        s.enqueue(SymmetricZoneTask::new);
        s.run_until_idle().unwrap();
        s.into_context()
    }

    #[test]
    fn test_centred_column_accepts_full_radius() {
        let column = cylinder(0.1, 0.3, 32).unwrap();
        let ctx = run(column);
        let radius = ctx
            .blackboard()
            .number(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS)
            .unwrap()
            .unwrap();
        // The bounding-cylinder radius reaches the rim corners.
        assert!(radius > 0.1);
        let zone = ctx
            .blackboard()
            .mesh(keys::LARGEST_SYMMETRICAL_ZONE)
            .unwrap()
            .unwrap();
        assert!(zone.transform.is_identity());
        assert!((zone.signed_volume() - column_volume(0.1, 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_lopsided_object_shrinks_to_core() {
        // A square core with an arm sticking out along +X.
        let mut object = cuboid(Point3::new(0.0, 0.0, 0.1), Vec3::new(0.2, 0.2, 0.2));
        object.merge(&cuboid(Point3::new(0.275, 0.0, 0.1), Vec3::new(0.25, 0.05, 0.05)));
        let ctx = run(object);
        let radius = ctx
            .blackboard()
            .number(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS)
            .unwrap()
            .unwrap();
        // The arm starts at x = 0.15; the core's corners sit at 0.141.
        assert!(radius < 0.15, "radius {radius}");
        assert!(radius > 0.1);
    }

    #[test]
    fn test_offset_object_has_no_zone() {
        let object = cuboid(Point3::new(0.5, 0.0, 0.1), Vec3::new(0.2, 0.2, 0.2));
        let ctx = run(object);
        assert_eq!(
            ctx.blackboard()
                .number(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS)
                .unwrap(),
            None
        );
        assert!(ctx
            .blackboard()
            .mesh(keys::LARGEST_SYMMETRICAL_ZONE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_dense_zone_is_decimated_before_the_sweep() {
        let column = cylinder(0.1, 0.3, 512).unwrap();
        assert!(column.vertex_count() > 1000);
        let params = AnalysisParams {
            max_zone_vertices: 100,
            ..params()
        };
        let mut s = Scheduler::new(PipelineContext::new(column, params).unwrap());
        s.enqueue(SymmetricZoneTask::new);
        s.run_until_idle().unwrap();
        let board = s.context().blackboard();

        // Decimation keeps the column centred, so the first cut is accepted.
        let radius = board
            .number(keys::LARGEST_SYMMETRICAL_ZONE_RADIUS)
            .unwrap()
            .unwrap();
        assert!(radius > 0.1);
        let zone = board.mesh(keys::LARGEST_SYMMETRICAL_ZONE).unwrap().unwrap();
        assert!(zone.vertex_count() <= 100);
        assert!(zone.signed_volume() > 0.5 * column_volume(0.1, 0.3));
    }

    fn column_volume(r: f64, h: f64) -> f64 {
        cylinder(r, h, 32).unwrap().signed_volume()
    }
}
