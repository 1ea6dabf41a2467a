//! Error types for the analysis pipeline.

use thiserror::Error;
use torsoscan_mesh::MeshError;

/// Errors that stop the pipeline.
///
/// Degenerate geometry is not an error: tasks absorb empty slices and
/// invalid hulls locally. What surfaces here is a broken precondition
/// (a stage was skipped), bad configuration, or a failing record sink.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A task needs a blackboard entry no earlier task wrote.
    #[error("missing blackboard entry `{0}`: a previous stage did not run")]
    MissingEntry(String),

    /// A blackboard entry holds a different kind of value.
    #[error("blackboard entry `{key}` holds {found}, expected {expected}")]
    TypeMismatch {
        /// Entry key.
        key: String,
        /// Kind the reader asked for.
        expected: &'static str,
        /// Kind actually stored.
        found: &'static str,
    },

    /// A stored classification label is not one of the known values.
    #[error("unknown {kind} label `{label}`")]
    InvalidLabel {
        /// What the label classifies.
        kind: &'static str,
        /// The offending label.
        label: String,
    },

    /// Analysis parameters failed validation.
    #[error("invalid analysis parameters: {0}")]
    InvalidParams(String),

    /// The record is missing fields and the policy forbids partial records.
    #[error("measurement record is incomplete, missing: {}", .0.join(", "))]
    IncompleteRecord(Vec<&'static str>),

    /// The measurement sink rejected the record.
    #[error("measurement sink failed: {0}")]
    Sink(String),

    /// Building a primitive mesh failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be parsed.
    #[error("failed to parse parameters: {0}")]
    ParamsParse(#[from] toml::de::Error),

    /// Configuration could not be written.
    #[error("failed to serialize parameters: {0}")]
    ParamsSerialize(#[from] toml::ser::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
