#![warn(missing_docs)]

//! Incremental geometric analysis of torso scans.
//!
//! Work is split into small tasks run one step at a time by a cooperative
//! [`Scheduler`], so a host loop can interleave analysis with other work.
//! Tasks share the scanned object, a read-only [`AnalysisParams`] and a
//! [`Blackboard`] of named intermediate results through the
//! [`PipelineContext`].
//!
//! Calibration centres the object on the Z axis and turns its symmetry
//! plane onto XZ. Measurement then locates the breast region, measures
//! band and bust circumferences, classifies posture, integrates the
//! protruding volume and emits a [`MeasurementRecord`].
//!
//! # Example
//!
//! ```ignore
//! use torsoscan_mesh::TorsoPhantom;
//! use torsoscan_pipeline::{pipelines, AnalysisParams, MemorySink, PipelineContext, Scheduler};
//!
//! let ctx = PipelineContext::new(TorsoPhantom::default().build(), AnalysisParams::default())?;
//! let mut scheduler = Scheduler::new(ctx);
//! let sink = MemorySink::new();
//! pipelines::enqueue_calibration(&mut scheduler);
//! pipelines::enqueue_measurement(&mut scheduler, Box::new(sink.clone()));
//! scheduler.run_until_idle()?;
//! println!("{:?}", sink.last());
//! ```

pub mod blackboard;
pub mod calibration;
pub mod config;
pub mod context;
pub mod error;
pub mod measurement;
pub mod pipelines;
pub mod record;
pub mod scheduler;
pub mod task;

pub use blackboard::{keys, Blackboard, Value};
pub use config::{AnalysisParams, IncompletePolicy};
pub use context::PipelineContext;
pub use error::{PipelineError, Result};
pub use record::{
    FanOutSink, HorizontalType, JsonLinesSink, MeasurementRecord, MeasurementSink, MemorySink,
    VerticalType,
};
pub use scheduler::{Scheduler, TaskFactory, Tick};
pub use task::{StepOutcome, Task};
