/// Estimation building blocks
///
/// Dense matrix primitive, quaternion orientation tracking and the
/// 6-state position/velocity EKF driven by the motion engine.

pub mod ekf_6d;
pub mod matrix;
pub mod orientation;

pub use ekf_6d::{Ekf6d, GpsNoiseRegime, GpsSkipReason, GpsUpdateOutcome};
pub use matrix::Matrix;
pub use orientation::{EulerAngles, OrientationTracker};
