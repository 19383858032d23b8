//! Linear algebra type system for the motion engine
//!
//! Fixed-size nalgebra aliases for the orientation path and the state
//! dimensions shared by the 6-state filter.

use nalgebra::{Matrix3, Vector3};

// ===== State Dimensions =====
pub const STATE_DIM_6: usize = 6;

// ===== State Layout =====
pub const POS_X: usize = 0;
pub const POS_Y: usize = 1;
pub const POS_Z: usize = 2;
pub const VEL_X: usize = 3;
pub const VEL_Y: usize = 4;
pub const VEL_Z: usize = 5;

// ===== Measurement Dimensions =====
pub const MEASURE_DIM_VEL: usize = 3; // zero-velocity pseudo-measurement
pub const MEASURE_DIM_GPS_POS_2D: usize = 2; // (x, y)
pub const MEASURE_DIM_GPS_POS_3D: usize = 3; // (x, y, z)

// ===== Orientation Types =====
pub type Vec3 = Vector3<f64>;

/// Row-major 3×3 rotation matrix (device → world)
pub type Rot3 = Matrix3<f64>;
