//! State shared by every task of a pipeline run.

use torsoscan_mesh::{ClipKernel, GeometryKernel, Mesh};

use crate::blackboard::Blackboard;
use crate::config::AnalysisParams;
use crate::error::Result;

/// The analysed object, its blackboard, the frozen parameters and the
/// geometry kernel.
///
/// Owned by the scheduler and lent to each task at construction and on
/// every step.
pub struct PipelineContext {
    object: Mesh,
    blackboard: Blackboard,
    params: AnalysisParams,
    kernel: Box<dyn GeometryKernel>,
}

impl PipelineContext {
    /// Context over `object` using the default clipping kernel.
    pub fn new(object: Mesh, params: AnalysisParams) -> Result<Self> {
        Self::with_kernel(object, params, Box::new(ClipKernel))
    }

    /// Context with a host-supplied geometry kernel.
    pub fn with_kernel(
        object: Mesh,
        params: AnalysisParams,
        kernel: Box<dyn GeometryKernel>,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            object,
            blackboard: Blackboard::new(),
            params,
            kernel,
        })
    }

    /// The analysed object.
    pub fn object(&self) -> &Mesh {
        &self.object
    }

    /// The analysed object, for calibration moves.
    pub fn object_mut(&mut self) -> &mut Mesh {
        &mut self.object
    }

    /// Analysis parameters.
    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Geometry kernel.
    pub fn kernel(&self) -> &dyn GeometryKernel {
        self.kernel.as_ref()
    }

    /// Shared results.
    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    /// Shared results, for writing.
    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    /// Give the object back.
    pub fn into_object(self) -> Mesh {
        self.object
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("object", &self.object.name)
            .field("entries", &self.blackboard.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_context_rejects_invalid_params() {
        let params = AnalysisParams {
            distance_tolerance: 0.0,
            ..AnalysisParams::default()
        };
        assert!(matches!(
            PipelineContext::new(Mesh::new("o"), params),
            Err(PipelineError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_context_owns_object() {
        let ctx = PipelineContext::new(Mesh::new("torso"), AnalysisParams::default()).unwrap();
        assert!(ctx.blackboard().is_empty());
        assert_eq!(ctx.into_object().name, "torso");
    }
}
