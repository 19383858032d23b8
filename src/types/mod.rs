pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};

/// Linear acceleration in the device frame (gravity already removed).
///
/// `timestamp_ns` is a monotonic sensor clock, only differences matter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccelData {
    pub timestamp_ns: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelData {
    pub fn new(x: f64, y: f64, z: f64, timestamp_ns: i64) -> Self {
        Self { timestamp_ns, x, y, z }
    }

    pub fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Angular rate in rad/s.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GyroData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GyroData {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Rotation-vector reading: `[x, y, z]` or `[x, y, z, w]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientationData {
    pub values: Vec<f64>,
}

impl OrientationData {
    pub fn new(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
        }
    }

    /// Quaternion components `(x, y, z, w)`, deriving `w` for 3-component readings.
    /// `None` when fewer than three components are present.
    pub fn components(&self) -> Option<[f64; 4]> {
        match self.values.as_slice() {
            [x, y, z] => {
                let sum = x * x + y * y + z * z;
                let w = if sum >= 1.0 { 0.0 } else { (1.0 - sum).sqrt() };
                Some([*x, *y, *z, w])
            }
            [x, y, z, w, ..] => Some([*x, *y, *z, *w]),
            _ => None,
        }
    }
}

/// GPS fix with ready-made local tangent-plane coordinates.
///
/// The local frame origin is owned by whoever produces these fixes; the
/// engine never converts geodesic coordinates itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    /// System time in milliseconds
    pub timestamp_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Horizontal speed [m/s]
    pub speed: Option<f64>,
    /// Horizontal accuracy [m]
    pub accuracy: Option<f64>,
    pub speed_accuracy: Option<f64>,
    pub local_x: Option<f64>,
    pub local_y: Option<f64>,
    /// Present only when both the fix and the local origin carry altitude
    pub local_z: Option<f64>,
    #[serde(default)]
    pub is_local_valid: bool,
}

impl LocationData {
    /// A locally valid fix at `(x, y)` with the given accuracy; everything else empty.
    pub fn local(timestamp_ms: i64, x: f64, y: f64, accuracy: f64) -> Self {
        Self {
            timestamp_ms,
            latitude: 0.0,
            longitude: 0.0,
            altitude: None,
            speed: None,
            accuracy: Some(accuracy),
            speed_accuracy: None,
            local_x: Some(x),
            local_y: Some(y),
            local_z: None,
            is_local_valid: true,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_local_z(mut self, z: f64) -> Self {
        self.local_z = Some(z);
        self
    }

    /// Planar distance between the local positions of two fixes, if both have them.
    pub fn planar_distance_to(&self, other: &LocationData) -> Option<f64> {
        let dx = self.local_x? - other.local_x?;
        let dy = self.local_y? - other.local_y?;
        Some((dx * dx + dy * dy).sqrt())
    }
}
