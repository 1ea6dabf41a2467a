//! Posture classification from the side centres to the extreme points.

use std::fmt;

use torsoscan_math::{Point3, Vec3};
use tracing::{info, warn};

use crate::blackboard::{keys, Value};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::record::{HorizontalType, VerticalType};
use crate::task::{StepOutcome, Task};

/// Body side, seen from the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `y < 0`.
    Left,
    /// `y > 0`.
    Right,
}

/// Where a side points in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalDirection {
    /// Towards the midline.
    Inward,
    /// Away from the midline.
    Outward,
    /// Straight ahead.
    Frontal,
}

/// Where a side points vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalDirection {
    /// Above the horizontal.
    Upward,
    /// Below the horizontal.
    Downward,
    /// Level.
    Horizontal,
}

impl fmt::Display for HorizontalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HorizontalDirection::Inward => "inward",
            HorizontalDirection::Outward => "outward",
            HorizontalDirection::Frontal => "frontal",
        })
    }
}

impl fmt::Display for VerticalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerticalDirection::Upward => "upward",
            VerticalDirection::Downward => "downward",
            VerticalDirection::Horizontal => "horizontal",
        })
    }
}

/// Signed angles of one side's pointing vector, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideAngles {
    /// Angle from the forward axis (`-X`) in the XY plane, positive towards `+Y`.
    pub horizontal: f64,
    /// Elevation above the XY plane.
    pub vertical: f64,
}

impl SideAngles {
    /// Angles of `vector`, `None` when it has no horizontal component.
    pub fn of(vector: &Vec3) -> Option<Self> {
        let v = vector.try_normalize(f64::EPSILON)?;
        let xy = v.xy().try_normalize(f64::EPSILON)?;
        Some(Self {
            horizontal: xy.y.atan2(-xy.x).to_degrees(),
            vertical: v.z.clamp(-1.0, 1.0).asin().to_degrees(),
        })
    }

    /// Inward or outward depends on the side: outward is `-Y` on the left
    /// and `+Y` on the right.
    pub fn horizontal_direction(&self, side: Side) -> HorizontalDirection {
        let outward = match side {
            Side::Left => -self.horizontal,
            Side::Right => self.horizontal,
        };
        if outward > 0.0 {
            HorizontalDirection::Outward
        } else if outward < 0.0 {
            HorizontalDirection::Inward
        } else {
            HorizontalDirection::Frontal
        }
    }

    /// Up or down.
    pub fn vertical_direction(&self) -> VerticalDirection {
        if self.vertical > 0.0 {
            VerticalDirection::Upward
        } else if self.vertical < 0.0 {
            VerticalDirection::Downward
        } else {
            VerticalDirection::Horizontal
        }
    }
}

/// Classify posture from both sides: a class is non-natural when either
/// side exceeds `threshold_deg` in absolute value.
pub fn classify(
    left: &SideAngles,
    right: &SideAngles,
    threshold_deg: f64,
) -> (HorizontalType, VerticalType) {
    let max_h = left.horizontal.abs().max(right.horizontal.abs());
    let max_v = left.vertical.abs().max(right.vertical.abs());
    let horizontal = if max_h > threshold_deg {
        HorizontalType::Exo
    } else {
        HorizontalType::Natural
    };
    let vertical = if max_v > threshold_deg {
        VerticalType::Relax
    } else {
        VerticalType::Natural
    };
    (horizontal, vertical)
}

struct Inputs {
    top: f64,
    z_band: f64,
    width_left: f64,
    width_right: f64,
    left: Point3,
    right: Point3,
}

/// Places a centre point on each side between the band and the top of the
/// feature and classifies the vectors from those centres to the extreme
/// points.
pub struct PostureTask {
    inputs: Option<Inputs>,
}

impl PostureTask {
    /// Read the feature extent, band, widths and extreme points.
    pub fn new(ctx: &mut PipelineContext) -> Result<Self> {
        let board = ctx.blackboard();
        let top = board.number(keys::BREAST_TOP_Z)?;
        let z_band = board.number(keys::Z_BAND)?;
        let width_left = board.number(keys::WIDTH_LEFT)?;
        let width_right = board.number(keys::WIDTH_RIGHT)?;
        let left = board.point(keys::BEST_LEFT_POINT)?;
        let right = board.point(keys::BEST_RIGHT_POINT)?;
        let inputs = match (top, z_band, width_left, width_right, left, right) {
            (Some(top), Some(z_band), Some(width_left), Some(width_right), Some(left), Some(right)) => {
                Some(Inputs {
                    top,
                    z_band,
                    width_left,
                    width_right,
                    left,
                    right,
                })
            }
            _ => None,
        };
        Ok(Self { inputs })
    }
}

const OUTPUTS: [&str; 6] = [
    keys::BREAST_TYPE_HORIZONTAL,
    keys::BREAST_TYPE_VERTICAL,
    keys::ANGLE_H_LEFT,
    keys::ANGLE_H_RIGHT,
    keys::ANGLE_V_LEFT,
    keys::ANGLE_V_RIGHT,
];

impl Task for PostureTask {
    fn name(&self) -> &'static str {
        "posture"
    }

    fn step_once(&mut self, ctx: &mut PipelineContext) -> Result<StepOutcome> {
        let offset = ctx.params().feature_center_offset;
        let threshold = ctx.params().posture_threshold_deg;
        let angles = self.inputs.as_ref().and_then(|i| {
            let z_center = (i.top + i.z_band) / 2.0;
            let right_center = Point3::new(0.0, i.width_right / 2.0 + offset, z_center);
            let left_center = Point3::new(0.0, -(i.width_left / 2.0 + offset), z_center);
            let left = SideAngles::of(&(i.left - left_center))?;
            let right = SideAngles::of(&(i.right - right_center))?;
            Some((left, right))
        });

        let board = ctx.blackboard_mut();
        let Some((left, right)) = angles else {
            warn!("posture inputs missing, posture left unclassified");
            for key in OUTPUTS {
                board.set_unset(key);
            }
            return Ok(StepOutcome::Done);
        };
        for (side, a) in [(Side::Left, &left), (Side::Right, &right)] {
            info!(
                ?side,
                horizontal = a.horizontal.abs(),
                h_dir = %a.horizontal_direction(side),
                vertical = a.vertical.abs(),
                v_dir = %a.vertical_direction(),
                "side orientation"
            );
        }
        let (horizontal, vertical) = classify(&left, &right, threshold);
        info!(%horizontal, %vertical, "posture classified");

        board.set(keys::BREAST_TYPE_HORIZONTAL, Value::Text(horizontal.to_string()));
        board.set(keys::BREAST_TYPE_VERTICAL, Value::Text(vertical.to_string()));
        board.set(keys::ANGLE_H_LEFT, Value::Number(left.horizontal));
        board.set(keys::ANGLE_H_RIGHT, Value::Number(right.horizontal));
        board.set(keys::ANGLE_V_LEFT, Value::Number(left.vertical));
        board.set(keys::ANGLE_V_RIGHT, Value::Number(right.vertical));
        Ok(StepOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisParams;
    use crate::scheduler::Scheduler;
    use torsoscan_mesh::Mesh;

    #[test]
    fn test_angles_and_directions() {
        let straight = SideAngles::of(&Vec3::new(-1.0, 0.0, 0.0)).unwrap();
        assert_eq!(straight.horizontal, 0.0);
        assert_eq!(straight.horizontal_direction(Side::Left), HorizontalDirection::Frontal);
        assert_eq!(straight.vertical_direction(), VerticalDirection::Horizontal);

        // Left side pointing towards -Y is outward.
        let splayed = SideAngles::of(&Vec3::new(-1.0, -1.0, 0.0)).unwrap();
        approx::assert_relative_eq!(splayed.horizontal, -45.0, epsilon = 1e-9);
        assert_eq!(splayed.horizontal_direction(Side::Left), HorizontalDirection::Outward);
        assert_eq!(splayed.horizontal_direction(Side::Right), HorizontalDirection::Inward);

        let drooping = SideAngles::of(&Vec3::new(-1.0, 0.0, -1.0)).unwrap();
        approx::assert_relative_eq!(drooping.vertical, -45.0, epsilon = 1e-9);
        assert_eq!(drooping.vertical_direction(), VerticalDirection::Downward);

        assert!(SideAngles::of(&Vec3::zeros()).is_none());
        assert!(SideAngles::of(&Vec3::new(0.0, 0.0, 1.0)).is_none());
    }

    #[test]
    fn test_classify_thresholds() {
        let a = |h: f64, v: f64| SideAngles {
            horizontal: h,
            vertical: v,
        };
        assert_eq!(
            classify(&a(5.0, -3.0), &a(-8.0, 2.0), 15.0),
            (HorizontalType::Natural, VerticalType::Natural)
        );
        assert_eq!(
            classify(&a(-20.0, 0.0), &a(3.0, 16.0), 15.0),
            (HorizontalType::Exo, VerticalType::Relax)
        );
    }

    fn run(entries: Vec<(&'static str, Value)>) -> PipelineContext {
        let mut ctx = PipelineContext::new(Mesh::new("o"), AnalysisParams::default()).unwrap();
        for (key, value) in entries {
            ctx.blackboard_mut().set(key, value);
        }
        let mut s = Scheduler::new(ctx);
        s.enqueue(PostureTask::new);
        s.run_until_idle().unwrap();
        s.into_context()
    }

    #[test]
    fn test_symmetric_forward_points_are_natural() {
        let ctx = run(vec![
            (keys::BREAST_TOP_Z, Value::Number(0.34)),
            (keys::Z_BAND, Value::Number(0.22)),
            (keys::WIDTH_LEFT, Value::Number(0.13)),
            (keys::WIDTH_RIGHT, Value::Number(0.13)),
            (keys::BEST_LEFT_POINT, Value::Point(Point3::new(-0.14, -0.075, 0.28))),
            (keys::BEST_RIGHT_POINT, Value::Point(Point3::new(-0.14, 0.075, 0.28))),
        ]);
        let board = ctx.blackboard();
        assert_eq!(board.text(keys::BREAST_TYPE_HORIZONTAL).unwrap(), Some("natural"));
        assert_eq!(board.text(keys::BREAST_TYPE_VERTICAL).unwrap(), Some("natural"));
        let h_left = board.number(keys::ANGLE_H_LEFT).unwrap().unwrap();
        let h_right = board.number(keys::ANGLE_H_RIGHT).unwrap().unwrap();
        approx::assert_relative_eq!(h_left, -h_right, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_input_leaves_posture_unset() {
        let ctx = run(vec![
            (keys::BREAST_TOP_Z, Value::Number(0.34)),
            (keys::Z_BAND, Value::Unset),
            (keys::WIDTH_LEFT, Value::Number(0.13)),
            (keys::WIDTH_RIGHT, Value::Number(0.13)),
            (keys::BEST_LEFT_POINT, Value::Point(Point3::new(-0.14, -0.075, 0.28))),
            (keys::BEST_RIGHT_POINT, Value::Point(Point3::new(-0.14, 0.075, 0.28))),
        ]);
        assert_eq!(ctx.blackboard().text(keys::BREAST_TYPE_HORIZONTAL).unwrap(), None);
    }

    #[test]
    fn test_missing_band_entry_is_fatal() {
        let ctx = PipelineContext::new(Mesh::new("o"), AnalysisParams::default()).unwrap();
        let mut s = Scheduler::new(ctx);
        s.enqueue(PostureTask::new);
        assert!(s.start().is_err());
    }
}
