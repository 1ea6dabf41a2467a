//! Stage 1: cut the object into horizontal slabs and collect their islands.

use torsoscan_math::Axis;
use torsoscan_mesh::Mesh;
use tracing::{debug, info};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Sweeps a slab of `section_height` from the bottom of the object to its
/// top and stores every island of every slab under `OBJECT_SLICES`.
#[derive(Debug)]
pub struct VerticalSlicingTask {
    position: f64,
    max_position: f64,
    section_height: f64,
    slices: Vec<Mesh>,
}

impl VerticalSlicingTask {
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
            slices: Vec::new(),
        })
    }
}

impl Task for VerticalSlicingTask {
    fn name(&self) -> &'static str {
        "vertical_slicing"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        if self.position >= self.max_position {
            info!(slices = self.slices.len(), "object sliced");
            let slices = std::mem::take(&mut self.slices);
            ctx.blackboard_mut()
                .set(keys::OBJECT_SLICES, Value::Meshes(slices));
            return Ok(StepOutcome::Done);
        }

        let kernel = ctx.kernel();
        if let Some(slab) = kernel.slice(ctx.object(), Axis::Z, self.position, self.section_height) {
            let islands = kernel.islands(&slab);
            debug!(z = self.position, islands = islands.len(), "slab");
            self.slices.extend(islands);
        }
        self.position += self.section_height;
        Ok(StepOutcome::Continue)
    }

    fn release(&mut self) {
        self.slices.clear();
    }
}
