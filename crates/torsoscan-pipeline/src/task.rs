//! The resumable unit of work driven by the scheduler.

use crate::context::PipelineContext;
use crate::error::Result;

/// Result of one bounded increment of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// More steps are needed.
    Continue,
    /// The task has concluded and must not be stepped again.
    Done,
}

/// A stateful search that advances one bounded step at a time.
///
/// Construction happens in a factory that reads the blackboard entries the
/// task depends on and fails with `MissingEntry` when one was never
/// written. Each `step_once` performs at most one slice, one angle or one
/// candidate comparison.
pub trait Task {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Perform one increment of work.
    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome>;

    /// Drop scratch state. Called before an in-flight task is discarded;
    /// must be safe to call more than once.
    fn release(&mut self) {}
}
