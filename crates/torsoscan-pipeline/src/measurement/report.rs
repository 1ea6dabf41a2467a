//! Final stage: assemble the record and hand it to the sink.

use chrono::Utc;
use tracing::{info, warn};

use crate::blackboard::{keys, Blackboard};
use crate::config::IncompletePolicy;
use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};
use crate::record::{MeasurementRecord, MeasurementSink};
use crate::task::{StepOutcome, Task};

const CM_PER_M: f64 = 100.0;
const CM3_PER_M3: f64 = 1_000_000.0;

const INPUTS: [&str; 8] = [
    keys::BREAST_HEIGHT,
    keys::WIDTH_LEFT,
    keys::WIDTH_RIGHT,
    keys::BAND,
    keys::BUST,
    keys::BREAST_VOLUME,
    keys::BREAST_TYPE_HORIZONTAL,
    keys::BREAST_TYPE_VERTICAL,
];

/// Build a record from the blackboard, converting to centimetres.
pub fn build_record(board: &Blackboard) -> Result<MeasurementRecord> {
    let cm = |key: &str| board.number(key).map(|v| v.map(|m| m * CM_PER_M));
    Ok(MeasurementRecord {
        height_cm: cm(keys::BREAST_HEIGHT)?,
        width_left_cm: cm(keys::WIDTH_LEFT)?,
        width_right_cm: cm(keys::WIDTH_RIGHT)?,
        band_cm: cm(keys::BAND)?,
        bust_cm: cm(keys::BUST)?,
        volume_cm3: board
            .number(keys::BREAST_VOLUME)?
            .map(|m3| m3 * CM3_PER_M3),
        horizontal_type: board
            .text(keys::BREAST_TYPE_HORIZONTAL)?
            .map(str::parse)
            .transpose()?,
        vertical_type: board
            .text(keys::BREAST_TYPE_VERTICAL)?
            .map(str::parse)
            .transpose()?,
        timestamp: Utc::now(),
    })
}

/// Emits one measurement record, applying the incomplete-record policy.
pub struct ReportTask {
    sink: Box<dyn MeasurementSink>,
}

impl ReportTask {
    /// Check that every measurement stage ran.
    pub fn new(ctx: &mut PipelineContext, sink: Box<dyn MeasurementSink>) -> Result<Self> {
        ctx.blackboard().require(&INPUTS)?;
        Ok(Self { sink })
    }
}

impl Task for ReportTask {
    fn name(&self) -> &'static str {
        "report"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        let record = build_record(ctx.blackboard())?;
        let missing = record.missing_fields();
        if !missing.is_empty() {
            match ctx.params().incomplete_record {
                IncompletePolicy::Fail => return Err(PipelineError::IncompleteRecord(missing)),
                IncompletePolicy::EmitPartial => {
                    warn!(missing = ?missing, "emitting partial measurement record");
                }
            }
        }
        self.sink.insert_measurement(&record)?;
        info!(
            height_cm = record.height_cm,
            band_cm = record.band_cm,
            bust_cm = record.bust_cm,
            volume_cm3 = record.volume_cm3,
            "measurement recorded"
        );
        Ok(StepOutcome::Done)
    }
}
