/// Orientation tracking from rotation-vector readings.
///
/// Three quaternions are kept: the raw device orientation, a fixed base
/// correction (identity today, reserved for a hardware-mount offset) and a
/// user calibration offset. Two rotation matrices are derived on every
/// accepted reading:
///
/// - corrected-raw = base ∘ raw      (used for world-frame acceleration and absolute angles)
/// - final         = offset ∘ corrected-raw (relative angles)
///
/// Euler angles follow the Android `getOrientation` decomposition after
/// swapping the device X and Z axes.
use nalgebra::Quaternion;
use serde::{Deserialize, Serialize};

use crate::types::{OrientationData, Rot3, Vec3};

pub type Quat = Quaternion<f64>;

/// Yaw / pitch / roll in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrientationOutcome {
    Accepted,
    /// Too few components or norm below the minimum; prior state kept
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationOutcome {
    Calibrated,
    /// No orientation has been ingested yet
    NoOrientation,
}

pub struct OrientationTracker {
    min_norm: f64,

    raw: Quat,
    base_correction: Quat,
    user_offset: Quat,
    corrected_raw: Quat,
    final_quat: Quat,

    corrected_raw_matrix: Rot3,
    final_matrix: Rot3,

    has_valid_orientation: bool,
}

impl OrientationTracker {
    pub fn new(min_norm: f64) -> Self {
        Self {
            min_norm,
            raw: Quat::identity(),
            base_correction: Quat::identity(),
            user_offset: Quat::identity(),
            corrected_raw: Quat::identity(),
            final_quat: Quat::identity(),
            corrected_raw_matrix: Rot3::identity(),
            final_matrix: Rot3::identity(),
            has_valid_orientation: false,
        }
    }

    pub fn ingest(&mut self, reading: &OrientationData) -> OrientationOutcome {
        match reading.components() {
            Some(components) => self.ingest_components(components),
            None => {
                log::warn!(
                    "Rotation vector reading too short: {} components",
                    reading.values.len()
                );
                OrientationOutcome::Rejected
            }
        }
    }

    /// Ingest `(x, y, z, w)`; the quaternion is normalized before use.
    pub fn ingest_components(&mut self, [x, y, z, w]: [f64; 4]) -> OrientationOutcome {
        let candidate = Quat::new(w, x, y, z);
        let norm = candidate.norm();
        if !norm.is_finite() || norm <= self.min_norm {
            log::warn!("Invalid quaternion from sensor (norm {norm:e} too small)");
            return OrientationOutcome::Rejected;
        }

        self.raw = Quat::new(w / norm, x / norm, y / norm, z / norm);
        self.recompute();
        self.has_valid_orientation = true;
        OrientationOutcome::Accepted
    }

    /// Make the current orientation the zero of every relative angle.
    pub fn calibrate_zero(&mut self) -> CalibrationOutcome {
        if !self.has_valid_orientation {
            log::warn!("Can't calibrate: no rotation data yet");
            return CalibrationOutcome::NoOrientation;
        }
        self.user_offset = self.corrected_raw.conjugate();
        self.recompute();
        log::info!("Orientation offset calibrated");
        CalibrationOutcome::Calibrated
    }

    pub fn reset_user_offset(&mut self) {
        self.user_offset = Quat::identity();
        if self.has_valid_orientation {
            self.recompute();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.min_norm);
    }

    pub fn has_valid_orientation(&self) -> bool {
        self.has_valid_orientation
    }

    pub fn raw_quaternion(&self) -> Quat {
        self.raw
    }

    pub fn corrected_raw_quaternion(&self) -> Quat {
        self.corrected_raw
    }

    pub fn final_quaternion(&self) -> Quat {
        self.final_quat
    }

    pub fn user_offset(&self) -> Quat {
        self.user_offset
    }

    pub fn corrected_raw_matrix(&self) -> &Rot3 {
        &self.corrected_raw_matrix
    }

    pub fn final_matrix(&self) -> &Rot3 {
        &self.final_matrix
    }

    /// Device-frame vector rotated into the world frame, if an orientation is known.
    pub fn rotate_to_world(&self, device: &Vec3) -> Option<Vec3> {
        self.has_valid_orientation
            .then(|| self.corrected_raw_matrix * device)
    }

    /// Angles of the corrected-raw orientation: yaw and roll negated.
    pub fn absolute_angles(&self) -> EulerAngles {
        let e = euler_angles_from_matrix(&remap_swap_xz(&self.corrected_raw_matrix));
        EulerAngles {
            yaw: -e.yaw,
            pitch: e.pitch,
            roll: -e.roll,
        }
    }

    /// Calibration-relative angles: yaw and pitch negated, roll kept.
    pub fn relative_angles(&self) -> EulerAngles {
        let e = euler_angles_from_matrix(&remap_swap_xz(&self.final_matrix));
        EulerAngles {
            yaw: -e.yaw,
            pitch: -e.pitch,
            roll: e.roll,
        }
    }

    fn recompute(&mut self) {
        self.corrected_raw = self.base_correction * self.raw;
        self.corrected_raw_matrix = rotation_matrix_from_quaternion(&self.corrected_raw);

        self.final_quat = self.user_offset * self.corrected_raw;
        self.final_matrix = rotation_matrix_from_quaternion(&self.final_quat);
    }
}

/// Rotation matrix of a unit quaternion
pub fn rotation_matrix_from_quaternion(q: &Quat) -> Rot3 {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);

    let r00 = 1.0 - 2.0 * (y * y + z * z);
    let r01 = 2.0 * (x * y - w * z);
    let r02 = 2.0 * (x * z + w * y);

    let r10 = 2.0 * (x * y + w * z);
    let r11 = 1.0 - 2.0 * (x * x + z * z);
    let r12 = 2.0 * (y * z - w * x);

    let r20 = 2.0 * (x * z - w * y);
    let r21 = 2.0 * (y * z + w * x);
    let r22 = 1.0 - 2.0 * (x * x + y * y);

    Rot3::new(r00, r01, r02, r10, r11, r12, r20, r21, r22)
}

/// Change of basis swapping the device X and Z axes: `P·M·P`.
pub fn remap_swap_xz(m: &Rot3) -> Rot3 {
    let p = Rot3::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
    p * m * p
}

/// Aerospace decomposition (azimuth, pitch, roll) in degrees; yaw wrapped to (-180, 180].
pub fn euler_angles_from_matrix(m: &Rot3) -> EulerAngles {
    let yaw = m[(0, 1)].atan2(m[(1, 1)]);
    let pitch = (-m[(2, 1)]).clamp(-1.0, 1.0).asin();
    let roll = (-m[(2, 0)]).atan2(m[(2, 2)]);

    EulerAngles {
        yaw: normalize_angle_180(yaw.to_degrees()),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}

fn normalize_angle_180(angle: f64) -> f64 {
    let n = angle % 360.0;
    if n > 180.0 {
        n - 360.0
    } else if n <= -180.0 {
        n + 360.0
    } else {
        n
    }
}
