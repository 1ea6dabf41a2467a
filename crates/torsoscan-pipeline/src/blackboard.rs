//! Key/value store passing intermediate results between stages.

use std::collections::HashMap;

use torsoscan_math::Point3;
use torsoscan_mesh::Mesh;

use crate::error::{PipelineError, Result};

/// Keys written by the calibration and measurement stages.
///
/// Lengths, points and volumes are stored in metres.
pub mod keys {
    /// Islands of every calibration slice, bottom to top.
    pub const OBJECT_SLICES: &str = "OBJECT_SLICES";
    /// 2D centre the object was moved away from.
    pub const BEST_CENTER: &str = "BEST_CENTER";
    /// Mesh of the largest symmetrical zone.
    pub const LARGEST_SYMMETRICAL_ZONE: &str = "LARGEST_SYMMETRICAL_ZONE";
    /// Cutting radius of the largest symmetrical zone.
    pub const LARGEST_SYMMETRICAL_ZONE_RADIUS: &str = "LARGEST_SYMMETRICAL_ZONE_RADIUS";
    /// Informative (non-cylindrical) slices of the symmetrical zone.
    pub const LARGEST_SYMMETRICAL_ZONE_SLICES: &str = "LARGEST_SYMMETRICAL_ZONE_SLICES";
    /// Yaw applied to align the symmetry plane, in degrees.
    pub const OBJECT_YAW: &str = "OBJECT_YAW";

    /// Vertical extent of the detected feature.
    pub const BREAST_HEIGHT: &str = "BREAST_HEIGHT";
    /// Lower bound of the feature.
    pub const BREAST_BOTTOM_Z: &str = "BREAST_BOTTOM_Z";
    /// Upper bound of the feature.
    pub const BREAST_TOP_Z: &str = "BREAST_TOP_Z";
    /// Height of the most forward feature slice.
    pub const BREAST_FORWARD_Z: &str = "BREAST_FORWARD_Z";
    /// Left half-width of the forward slice.
    pub const WIDTH_LEFT: &str = "WIDTH_LEFT";
    /// Right half-width of the forward slice.
    pub const WIDTH_RIGHT: &str = "WIDTH_RIGHT";
    /// Bust circumference.
    pub const BUST: &str = "BUST";
    /// Height of the band slice.
    pub const Z_BAND: &str = "Z_BAND";
    /// Band circumference.
    pub const BAND: &str = "BAND";
    /// Most forward point with `y < 0`.
    pub const BEST_LEFT_POINT: &str = "BEST_LEFT_POINT";
    /// Most forward point with `y > 0`.
    pub const BEST_RIGHT_POINT: &str = "BEST_RIGHT_POINT";
    /// Horizontal posture class.
    pub const BREAST_TYPE_HORIZONTAL: &str = "BREAST_TYPE_HORIZONTAL";
    /// Vertical posture class.
    pub const BREAST_TYPE_VERTICAL: &str = "BREAST_TYPE_VERTICAL";
    /// Signed horizontal angle of the left side, degrees.
    pub const ANGLE_H_LEFT: &str = "ANGLE_H_LEFT";
    /// Signed horizontal angle of the right side, degrees.
    pub const ANGLE_H_RIGHT: &str = "ANGLE_H_RIGHT";
    /// Signed vertical angle of the left side, degrees.
    pub const ANGLE_V_LEFT: &str = "ANGLE_V_LEFT";
    /// Signed vertical angle of the right side, degrees.
    pub const ANGLE_V_RIGHT: &str = "ANGLE_V_RIGHT";
    /// Symmetric-difference volume.
    pub const BREAST_VOLUME: &str = "BREAST_VOLUME";
}

/// A blackboard value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Scalar.
    Number(f64),
    /// World-space point.
    Point(Point3),
    /// Classification label.
    Text(String),
    /// Owned mesh.
    Mesh(Mesh),
    /// Ordered list of meshes.
    Meshes(Vec<Mesh>),
    /// The producing stage ran but found nothing.
    Unset,
}

impl Value {
    /// Name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Point(_) => "point",
            Value::Text(_) => "text",
            Value::Mesh(_) => "mesh",
            Value::Meshes(_) => "mesh list",
            Value::Unset => "unset",
        }
    }
}

/// Results shared between pipeline stages.
///
/// A key that was never written means an earlier stage did not run, and
/// reading it fails with [`PipelineError::MissingEntry`]. A key holding
/// [`Value::Unset`] reads as `None`.
#[derive(Debug, Default)]
pub struct Blackboard {
    entries: HashMap<String, Value>,
}

impl Blackboard {
    /// Create an empty blackboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    /// Record that the stage owning `key` found nothing.
    pub fn set_unset(&mut self, key: &str) {
        self.set(key, Value::Unset);
    }

    /// Whether `key` was written, including as unset.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail with `MissingEntry` on the first key that was never written.
    pub fn require(&self, keys: &[&str]) -> Result<()> {
        match keys.iter().find(|k| !self.contains(k)) {
            Some(key) => Err(PipelineError::MissingEntry((*key).to_string())),
            None => Ok(()),
        }
    }

    /// Raw entry.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| PipelineError::MissingEntry(key.to_string()))
    }

    /// Scalar entry.
    pub fn number(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key)? {
            Value::Number(v) => Ok(Some(*v)),
            Value::Unset => Ok(None),
            other => Err(mismatch(key, "number", other)),
        }
    }

    /// Point entry.
    pub fn point(&self, key: &str) -> Result<Option<Point3>> {
        match self.get(key)? {
            Value::Point(p) => Ok(Some(*p)),
            Value::Unset => Ok(None),
            other => Err(mismatch(key, "point", other)),
        }
    }

    /// Text entry.
    pub fn text(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key)? {
            Value::Text(s) => Ok(Some(s.as_str())),
            Value::Unset => Ok(None),
            other => Err(mismatch(key, "text", other)),
        }
    }

    /// Borrowed mesh entry.
    pub fn mesh(&self, key: &str) -> Result<Option<&Mesh>> {
        match self.get(key)? {
            Value::Mesh(m) => Ok(Some(m)),
            Value::Unset => Ok(None),
            other => Err(mismatch(key, "mesh", other)),
        }
    }

    /// Move a mesh out, leaving the key unset.
    pub fn take_mesh(&mut self, key: &str) -> Result<Option<Mesh>> {
        match self.take(key)? {
            Value::Mesh(m) => Ok(Some(m)),
            Value::Unset => Ok(None),
            other => Err(self.restore(key, "mesh", other)),
        }
    }

    /// Move a mesh list out, leaving the key unset.
    pub fn take_meshes(&mut self, key: &str) -> Result<Option<Vec<Mesh>>> {
        match self.take(key)? {
            Value::Meshes(m) => Ok(Some(m)),
            Value::Unset => Ok(None),
            other => Err(self.restore(key, "mesh list", other)),
        }
    }

    fn take(&mut self, key: &str) -> Result<Value> {
        let slot = self
            .entries
            .get_mut(key)
            .ok_or_else(|| PipelineError::MissingEntry(key.to_string()))?;
        Ok(std::mem::replace(slot, Value::Unset))
    }

    fn restore(&mut self, key: &str, expected: &'static str, value: Value) -> PipelineError {
        let err = mismatch(key, expected, &value);
        self.set(key, value);
        err
    }
}

fn mismatch(key: &str, expected: &'static str, found: &Value) -> PipelineError {
    PipelineError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_vs_unset() {
        let mut board = Blackboard::new();
        assert!(matches!(
            board.number(keys::BAND),
            Err(PipelineError::MissingEntry(k)) if k == keys::BAND
        ));
        board.set_unset(keys::BAND);
        assert_eq!(board.number(keys::BAND).unwrap(), None);
        board.set(keys::BAND, Value::Number(0.8));
        assert_eq!(board.number(keys::BAND).unwrap(), Some(0.8));
    }

    #[test]
    fn test_type_mismatch() {
        let mut board = Blackboard::new();
        board.set(keys::Z_BAND, Value::Text("high".into()));
        match board.number(keys::Z_BAND) {
            Err(PipelineError::TypeMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, "number");
                assert_eq!(found, "text");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_take_leaves_unset() {
        let mut board = Blackboard::new();
        board.set(keys::OBJECT_SLICES, Value::Meshes(vec![Mesh::new("a")]));
        let slices = board.take_meshes(keys::OBJECT_SLICES).unwrap().unwrap();
        assert_eq!(slices.len(), 1);
        assert!(board.contains(keys::OBJECT_SLICES));
        assert!(board.take_meshes(keys::OBJECT_SLICES).unwrap().is_none());
    }

    #[test]
    fn test_failed_take_keeps_value() {
        let mut board = Blackboard::new();
        board.set(keys::BAND, Value::Number(1.0));
        assert!(board.take_mesh(keys::BAND).is_err());
        assert_eq!(board.number(keys::BAND).unwrap(), Some(1.0));
    }

    #[test]
    fn test_require() {
        let mut board = Blackboard::new();
        board.set(keys::Z_BAND, Value::Unset);
        assert!(board.require(&[keys::Z_BAND]).is_ok());
        assert!(matches!(
            board.require(&[keys::Z_BAND, keys::BUST]),
            Err(PipelineError::MissingEntry(k)) if k == keys::BUST
        ));
        board.clear();
        assert!(board.is_empty());
    }
}
