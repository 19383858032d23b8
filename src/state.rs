use serde::{Deserialize, Serialize};

use crate::filters::orientation::EulerAngles;
use crate::types::{LocationData, Vec3};

/// Planar point of the tracked path in the local frame [meters]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

impl PathPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_position(position: &Vec3) -> Self {
        Self::new(position.x, position.y)
    }

    pub fn distance_to(&self, other: &PathPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionStatus {
    #[default]
    Initializing,
    Stationary,
    Moving,
}

/// Display colour token for a status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusColor {
    Gray,
    Green,
    Orange,
}

impl MotionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MotionStatus::Initializing => "Initializing",
            MotionStatus::Stationary => "Stationary",
            MotionStatus::Moving => "Moving",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            MotionStatus::Initializing => StatusColor::Gray,
            MotionStatus::Stationary => StatusColor::Green,
            MotionStatus::Moving => StatusColor::Orange,
        }
    }
}

/// Immutable snapshot published by the motion engine.
///
/// Equality compares every field by value, path history included; the engine
/// relies on it to skip redundant publications.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    /// Filter position in the local frame [m]
    pub position: (f64, f64, f64),
    /// Filter velocity [m/s]
    pub velocity: (f64, f64, f64),
    /// Last world-frame acceleration [m/s²]
    pub world_accel: (f64, f64, f64),

    /// Calibration-relative angles [deg]
    pub relative: EulerAngles,
    /// Angles of the uncalibrated orientation [deg]
    pub absolute: EulerAngles,

    pub is_stationary: bool,
    pub is_high_speed: bool,
    pub speed_mps: f64,
    pub speed_kmh: f64,

    /// Straight-line displacement from the local origin [m]
    pub total_distance: f64,
    /// Travelled distance summed over accumulation intervals [m]
    pub accumulated_distance: f64,

    pub current_point: Option<PathPoint>,
    pub path_history: Vec<PathPoint>,

    pub status: MotionStatus,
    pub status_label: String,
    pub status_color: StatusColor,

    pub latest_gps: Option<LocationData>,
}

impl MotionState {
    pub fn initial() -> Self {
        let status = MotionStatus::Initializing;
        Self {
            position: (0.0, 0.0, 0.0),
            velocity: (0.0, 0.0, 0.0),
            world_accel: (0.0, 0.0, 0.0),
            relative: EulerAngles::default(),
            absolute: EulerAngles::default(),
            is_stationary: false,
            is_high_speed: false,
            speed_mps: 0.0,
            speed_kmh: 0.0,
            total_distance: 0.0,
            accumulated_distance: 0.0,
            current_point: None,
            path_history: Vec::new(),
            status,
            status_label: status.label().to_string(),
            status_color: status.color(),
            latest_gps: None,
        }
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::initial()
    }
}

pub(crate) fn tuple3(v: &Vec3) -> (f64, f64, f64) {
    (v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = MotionState::initial();
        assert_eq!(state.status, MotionStatus::Initializing);
        assert_eq!(state.status_color, StatusColor::Gray);
        assert!(state.path_history.is_empty());
        assert!(state.current_point.is_none());
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(MotionStatus::Stationary.color(), StatusColor::Green);
        assert_eq!(MotionStatus::Moving.color(), StatusColor::Orange);
        assert_eq!(MotionStatus::Moving.label(), "Moving");
    }

    #[test]
    fn test_equality_compares_history_contents() {
        let mut a = MotionState::initial();
        a.path_history.push(PathPoint::new(1.0, 2.0));
        let mut b = a.clone();
        assert_eq!(a, b);
        b.path_history[0].y = 2.5;
        assert_ne!(a, b);
    }

    #[test]
    fn test_path_point_distance() {
        assert_eq!(PathPoint::new(0.0, 0.0).distance_to(&PathPoint::new(3.0, 4.0)), 5.0);
    }
}
