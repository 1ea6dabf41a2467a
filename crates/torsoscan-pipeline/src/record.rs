//! The terminal measurement record and where it goes.

use std::cell::RefCell;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Horizontal posture class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalType {
    /// Both sides point forward.
    Natural,
    /// At least one side points sideways beyond the threshold.
    Exo,
}

/// Vertical posture class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalType {
    /// Both sides point forward.
    Natural,
    /// At least one side points up or down beyond the threshold.
    Relax,
}

impl HorizontalType {
    /// Label stored on the blackboard.
    pub fn as_str(self) -> &'static str {
        match self {
            HorizontalType::Natural => "natural",
            HorizontalType::Exo => "exo",
        }
    }
}

impl VerticalType {
    /// Label stored on the blackboard.
    pub fn as_str(self) -> &'static str {
        match self {
            VerticalType::Natural => "natural",
            VerticalType::Relax => "relax",
        }
    }
}

impl fmt::Display for HorizontalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VerticalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HorizontalType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(HorizontalType::Natural),
            "exo" => Ok(HorizontalType::Exo),
            other => Err(PipelineError::InvalidLabel {
                kind: "horizontal posture",
                label: other.to_string(),
            }),
        }
    }
}

impl FromStr for VerticalType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(VerticalType::Natural),
            "relax" => Ok(VerticalType::Relax),
            other => Err(PipelineError::InvalidLabel {
                kind: "vertical posture",
                label: other.to_string(),
            }),
        }
    }
}

/// One measurement, in centimetres and cubic centimetres.
///
/// Fields are `None` when the stage producing them found nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Feature height.
    pub height_cm: Option<f64>,
    /// Left half-width of the forward slice.
    pub width_left_cm: Option<f64>,
    /// Right half-width of the forward slice.
    pub width_right_cm: Option<f64>,
    /// Band circumference.
    pub band_cm: Option<f64>,
    /// Bust circumference.
    pub bust_cm: Option<f64>,
    /// Symmetric-difference volume.
    pub volume_cm3: Option<f64>,
    /// Horizontal posture.
    pub horizontal_type: Option<HorizontalType>,
    /// Vertical posture.
    pub vertical_type: Option<VerticalType>,
    /// When the record was produced.
    pub timestamp: DateTime<Utc>,
}

impl MeasurementRecord {
    /// Names of the fields left empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("height", self.height_cm.is_none()),
            ("width_left", self.width_left_cm.is_none()),
            ("width_right", self.width_right_cm.is_none()),
            ("band", self.band_cm.is_none()),
            ("bust", self.bust_cm.is_none()),
            ("volume", self.volume_cm3.is_none()),
            ("horizontal_type", self.horizontal_type.is_none()),
            ("vertical_type", self.vertical_type.is_none()),
        ];
        checks
            .into_iter()
            .filter_map(|(name, missing)| missing.then_some(name))
            .collect()
    }

    /// Whether every field is present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Persistence collaborator: appends records, never updates them.
pub trait MeasurementSink {
    /// Append one record.
    fn insert_measurement(&mut self, record: &MeasurementRecord) -> Result<()>;
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MeasurementSink for JsonLinesSink {
    fn insert_measurement(&mut self, record: &MeasurementRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Rc<RefCell<Vec<MeasurementRecord>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the records inserted so far.
    pub fn records(&self) -> Vec<MeasurementRecord> {
        self.records.borrow().clone()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<MeasurementRecord> {
        self.records.borrow().last().cloned()
    }
}

impl MeasurementSink for MemorySink {
    fn insert_measurement(&mut self, record: &MeasurementRecord) -> Result<()> {
        self.records.borrow_mut().push(record.clone());
        Ok(())
    }
}

/// Sends each record to several sinks in order.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn MeasurementSink>>,
}

impl FanOutSink {
    /// Create a sink with no targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target.
    pub fn with(mut self, sink: impl MeasurementSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl MeasurementSink for FanOutSink {
    fn insert_measurement(&mut self, record: &MeasurementRecord) -> Result<()> {
        for sink in &mut self.sinks {
            sink.insert_measurement(record)?;
        }
        Ok(())
    }
}
