//! Frozen analysis parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// What the report stage does when measurements are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompletePolicy {
    /// Emit the record with the missing fields left empty.
    #[default]
    EmitPartial,
    /// Fail the pipeline instead of emitting a partial record.
    Fail,
}

/// Tuning constants of the calibration and measurement searches.
///
/// Lengths are in metres and angles in degrees. The struct is built once
/// and handed to the pipeline context, which only exposes it read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Largest bounding-box centre offset still counted as centred.
    pub coordinate_tolerance: f64,
    /// Vertices per ring of the cutting and reference cylinders.
    pub cutting_cylinder_vertices: usize,
    /// Ratio above which a zone slice counts as a plain cylinder.
    pub cylinder_similarity_threshold: f64,
    /// Mirror match distance of the symmetry-plane search.
    pub distance_tolerance: f64,
    /// Slab height of the measurement scans.
    pub chest_isolation_slice_height: f64,
    /// Vertex cap applied to zone slices before the symmetry search.
    pub max_vertices_for_fast_processing: usize,
    /// Vertex cap applied to each symmetric-zone candidate before its
    /// rotation sweep.
    pub max_zone_vertices: usize,
    /// Slab height of the calibration scans.
    pub section_height: f64,
    /// Exponent of the centre similarity score.
    pub similarity_coefficient_weight: f64,
    /// Radius decrement between symmetric-zone attempts.
    pub zone_radius_step: f64,
    /// Number of 1° rotations a symmetric zone must stay centred through.
    pub zone_rotation_sweep: u32,
    /// Symmetry-plane candidates span `-range..=range` degrees.
    pub orientation_half_range: i32,
    /// Best angles further than this from the median are discarded.
    pub angle_outlier_window: f64,
    /// Half-width of the centre band separating left from right.
    pub center_band_half_width: f64,
    /// How far both sides must lead the centre band.
    pub min_feature_depth: f64,
    /// Minimum distance between the left and right forward points.
    pub min_feature_separation: f64,
    /// Subtracted from each half-width of the forward slice.
    pub width_margin: f64,
    /// Lateral offset added to the half-width when placing side centres.
    pub feature_center_offset: f64,
    /// Posture angles above this are classified as non-natural.
    pub posture_threshold_deg: f64,
    /// Distance behind the front-most centre point of the volume cut plane.
    pub volume_cutoff_offset: f64,
    /// Behaviour on incomplete measurement records.
    pub incomplete_record: IncompletePolicy,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            coordinate_tolerance: 1e-4,
            cutting_cylinder_vertices: 64,
            cylinder_similarity_threshold: 0.9,
            distance_tolerance: 5e-3,
            chest_isolation_slice_height: 0.002,
            max_vertices_for_fast_processing: 200,
            max_zone_vertices: 20_000,
            section_height: 0.01,
            similarity_coefficient_weight: 20.0,
            zone_radius_step: 0.01,
            zone_rotation_sweep: 180,
            orientation_half_range: 90,
            angle_outlier_window: 5.0,
            center_band_half_width: 0.01,
            min_feature_depth: 0.003,
            min_feature_separation: 0.04,
            width_margin: 0.01,
            feature_center_offset: 0.01,
            posture_threshold_deg: 15.0,
            volume_cutoff_offset: 0.05,
            incomplete_record: IncompletePolicy::EmitPartial,
        }
    }
}

impl AnalysisParams {
    /// Validate parameters.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("coordinate_tolerance", self.coordinate_tolerance),
            ("distance_tolerance", self.distance_tolerance),
            ("chest_isolation_slice_height", self.chest_isolation_slice_height),
            ("section_height", self.section_height),
            ("similarity_coefficient_weight", self.similarity_coefficient_weight),
            ("zone_radius_step", self.zone_radius_step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PipelineError::InvalidParams(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("angle_outlier_window", self.angle_outlier_window),
            ("center_band_half_width", self.center_band_half_width),
            ("min_feature_depth", self.min_feature_depth),
            ("min_feature_separation", self.min_feature_separation),
            ("width_margin", self.width_margin),
            ("feature_center_offset", self.feature_center_offset),
            ("posture_threshold_deg", self.posture_threshold_deg),
            ("volume_cutoff_offset", self.volume_cutoff_offset),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PipelineError::InvalidParams(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if self.cylinder_similarity_threshold <= 0.0 || self.cylinder_similarity_threshold > 1.0 {
            return Err(PipelineError::InvalidParams(
                "cylinder_similarity_threshold must be in (0, 1]".into(),
            ));
        }
        if self.cutting_cylinder_vertices < 3 {
            return Err(PipelineError::InvalidParams(
                "cutting_cylinder_vertices must be at least 3".into(),
            ));
        }
        if self.max_vertices_for_fast_processing < 3 {
            return Err(PipelineError::InvalidParams(
                "max_vertices_for_fast_processing must be at least 3".into(),
            ));
        }
        if self.max_zone_vertices < 3 {
            return Err(PipelineError::InvalidParams(
                "max_zone_vertices must be at least 3".into(),
            ));
        }
        if self.zone_rotation_sweep == 0 {
            return Err(PipelineError::InvalidParams(
                "zone_rotation_sweep must be at least 1".into(),
            ));
        }
        if !(0..=180).contains(&self.orientation_half_range) {
            return Err(PipelineError::InvalidParams(
                "orientation_half_range must be between 0 and 180 degrees".into(),
            ));
        }
        Ok(())
    }

    /// Parse TOML, filling unspecified fields with defaults, and validate.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let params: Self = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Load and validate a TOML parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
