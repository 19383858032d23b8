/// 6-Dimensional Extended Kalman Filter (position / velocity)
///
/// State Vector (6D):
/// [0-2]: Position (X, Y, Z) in the local tangent plane (meters)
/// [3-5]: Velocity (Vx, Vy, Vz) in the same frame (m/s)
///
/// World-frame acceleration is a direct input to the constant-acceleration
/// motion model, not a state. Corrections come from zero-velocity
/// pseudo-measurements (ZUPT) and GPS position fixes already expressed in
/// local coordinates. Every skipped step leaves state and covariance untouched.
use serde::{Deserialize, Serialize};

use super::matrix::Matrix;
use crate::config::FilterConfig;
use crate::error::MatrixError;
use crate::types::{
    LocationData, Vec3, MEASURE_DIM_GPS_POS_2D, MEASURE_DIM_GPS_POS_3D, MEASURE_DIM_VEL, POS_X,
    POS_Y, POS_Z, STATE_DIM_6, VEL_X, VEL_Y, VEL_Z,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ekf6dState {
    /// Position in local frame relative to the externally fixed origin [meters]
    pub position: (f64, f64, f64),

    /// Velocity in local frame [m/s]
    pub velocity: (f64, f64, f64),

    /// Covariance trace for uncertainty
    pub covariance_trace: f64,

    /// Update counters
    pub predicts: u64,
    pub stationary_updates: u64,
    pub gps_updates: u64,
}

/// GPS measurement-noise regime, chosen by the caller's flags
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpsNoiseRegime {
    Normal,
    /// Tighter XY trust
    HighSpeed,
    /// Tightest XY and Z trust; bypasses the short-distance gate
    Forced,
}

impl GpsNoiseRegime {
    pub fn select(high_speed: bool, forced: bool) -> Self {
        if forced {
            GpsNoiseRegime::Forced
        } else if high_speed {
            GpsNoiseRegime::HighSpeed
        } else {
            GpsNoiseRegime::Normal
        }
    }

    /// `(xy_factor, z_factor)` applied to `max(accuracy, min_std_dev)`
    pub fn noise_factors(self, config: &FilterConfig) -> (f64, f64) {
        match self {
            GpsNoiseRegime::Normal => (config.gps_xy_noise_factor, config.gps_z_noise_factor),
            GpsNoiseRegime::HighSpeed => {
                (config.gps_xy_noise_factor_high_speed, config.gps_z_noise_factor)
            }
            GpsNoiseRegime::Forced => {
                (config.gps_xy_noise_factor_forced, config.gps_z_noise_factor_forced)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GpsSkipReason {
    NotLocallyValid,
    MissingLocalPosition,
    InvalidAccuracy(Option<f64>),
    ShortDistance { moved: f64 },
    SingularInnovation,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GpsUpdateOutcome {
    Applied { dims: usize, regime: GpsNoiseRegime },
    Skipped(GpsSkipReason),
}

impl GpsUpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, GpsUpdateOutcome::Applied { .. })
    }
}

pub struct Ekf6d {
    config: FilterConfig,

    /// State vector [6x1]
    state: Matrix,

    /// Covariance matrix [6x6]
    covariance: Matrix,

    /// Zero-velocity measurement model (selects velocity) and its noise
    h_stationary: Matrix,
    r_stationary: Matrix,

    /// Last fix that actually corrected the state (short-distance gating)
    last_fix_used: Option<LocationData>,

    predicts: u64,
    stationary_updates: u64,
    gps_updates: u64,
}

impl Ekf6d {
    pub fn new(config: FilterConfig) -> Self {
        let stationary_var = config.stationary_vel_noise_std * config.stationary_vel_noise_std;
        let h_stationary = Matrix::from_fn(MEASURE_DIM_VEL, STATE_DIM_6, |r, c| {
            if c == r + VEL_X {
                1.0
            } else {
                0.0
            }
        });
        let r_stationary = Matrix::identity(MEASURE_DIM_VEL).scale(stationary_var);

        let mut ekf = Self {
            state: Matrix::zeros(STATE_DIM_6, 1),
            covariance: Matrix::identity(STATE_DIM_6),
            h_stationary,
            r_stationary,
            last_fix_used: None,
            predicts: 0,
            stationary_updates: 0,
            gps_updates: 0,
            config,
        };
        ekf.reset();
        ekf
    }

    /// Zero state, `scale·I` covariance, forget the last fix used.
    pub fn reset(&mut self) {
        self.state = Matrix::zeros(STATE_DIM_6, 1);
        self.covariance = Matrix::identity(STATE_DIM_6).scale(self.config.initial_covariance_scale);
        self.last_fix_used = None;
        self.predicts = 0;
        self.stationary_updates = 0;
        self.gps_updates = 0;
        log::debug!("EKF reset");
    }

    /// Constant-acceleration prediction over `dt` seconds.
    pub fn predict(&mut self, dt: f64, world_accel: &Vec3) {
        if dt <= 0.0 || !dt.is_finite() {
            log::warn!("dt is zero or negative ({dt}), skipping prediction");
            return;
        }
        if let Err(e) = self.try_predict(dt, world_accel) {
            log::error!("EKF predict failed: {e}");
        }
    }

    fn try_predict(&mut self, dt: f64, a: &Vec3) -> Result<(), MatrixError> {
        let dt2 = dt * dt;

        let mut f = Matrix::identity(STATE_DIM_6);
        f.set(POS_X, VEL_X, dt)?;
        f.set(POS_Y, VEL_Y, dt)?;
        f.set(POS_Z, VEL_Z, dt)?;

        // Discrete white-noise acceleration model
        let q_var = self.config.accel_noise_std * self.config.accel_noise_std;
        let q_pos = 0.25 * dt2 * dt2 * q_var;
        let q_vel = dt2 * q_var;
        let q_cross = 0.5 * dt * dt2 * q_var;
        let mut q = Matrix::zeros(STATE_DIM_6, STATE_DIM_6);
        for axis in 0..3 {
            q.set(POS_X + axis, POS_X + axis, q_pos)?;
            q.set(VEL_X + axis, VEL_X + axis, q_vel)?;
            q.set(POS_X + axis, VEL_X + axis, q_cross)?;
            q.set(VEL_X + axis, POS_X + axis, q_cross)?;
        }

        let mut predicted = Matrix::zeros(STATE_DIM_6, 1);
        for axis in 0..3 {
            let p = self.state.get(POS_X + axis, 0)?;
            let v = self.state.get(VEL_X + axis, 0)?;
            predicted.set(POS_X + axis, 0, p + v * dt + 0.5 * a[axis] * dt2)?;
            predicted.set(VEL_X + axis, 0, v + a[axis] * dt)?;
        }

        // P = F * P * F^T + Q
        let fpf_t = f.mul(&self.covariance)?.mul(&f.transpose())?;
        let covariance = fpf_t.add(&q)?.symmetrized()?;

        self.state = predicted;
        self.covariance = covariance;
        self.predicts += 1;
        Ok(())
    }

    /// Zero-velocity pseudo-measurement. Returns `false` when skipped.
    pub fn update_stationary(&mut self) -> bool {
        let z = Matrix::zeros(MEASURE_DIM_VEL, 1);
        let h = self.h_stationary.clone();
        let r = self.r_stationary.clone();
        match self.kalman_update(&h, &z, &r) {
            Ok(true) => {
                self.stationary_updates += 1;
                true
            }
            Ok(false) => false,
            Err(e) => {
                log::error!("Stationary update failed: {e}");
                false
            }
        }
    }

    /// Position update from a locally converted GPS fix.
    ///
    /// 3D when the fix carries a local Z, 2D otherwise. Unforced updates are
    /// gated on planar movement since the last fix actually used.
    pub fn update_gps_position(
        &mut self,
        fix: &LocationData,
        high_speed: bool,
        forced: bool,
    ) -> GpsUpdateOutcome {
        let (x, y) = match Self::validate_fix(fix, &self.config) {
            Ok(xy) => xy,
            Err(reason) => {
                log::warn!("Skipping GPS update: {reason:?} (accuracy {:?})", fix.accuracy);
                return GpsUpdateOutcome::Skipped(reason);
            }
        };

        if !forced {
            if let Some(moved) = self
                .last_fix_used
                .as_ref()
                .and_then(|prev| fix.planar_distance_to(prev))
            {
                if moved < self.config.gps_short_distance_threshold {
                    log::debug!(
                        "Skipping GPS update: short GPS distance ({moved:.2}m < {:.1}m)",
                        self.config.gps_short_distance_threshold
                    );
                    return GpsUpdateOutcome::Skipped(GpsSkipReason::ShortDistance { moved });
                }
            }
        }

        let regime = GpsNoiseRegime::select(high_speed, forced);
        let (xy_factor, z_factor) = regime.noise_factors(&self.config);
        // accuracy presence checked in validate_fix
        let accuracy_std = fix.accuracy.unwrap_or_default().max(self.config.gps_min_std_dev);
        let var_xy = (accuracy_std * xy_factor).powi(2);

        let (h, z, r) = match fix.local_z {
            Some(local_z) => {
                let var_z = (accuracy_std * z_factor).powi(2);
                (
                    Self::position_selector(MEASURE_DIM_GPS_POS_3D),
                    Matrix::column(&[x, y, local_z]),
                    Self::diagonal(&[var_xy, var_xy, var_z]),
                )
            }
            None => (
                Self::position_selector(MEASURE_DIM_GPS_POS_2D),
                Matrix::column(&[x, y]),
                Self::diagonal(&[var_xy, var_xy]),
            ),
        };
        let dims = h.rows();

        match self.kalman_update(&h, &z, &r) {
            Ok(true) => {
                self.last_fix_used = Some(fix.clone());
                self.gps_updates += 1;
                log::debug!("GPS position update applied ({dims}D, {regime:?})");
                GpsUpdateOutcome::Applied { dims, regime }
            }
            Ok(false) => GpsUpdateOutcome::Skipped(GpsSkipReason::SingularInnovation),
            Err(e) => {
                log::error!("GPS update failed: {e}");
                GpsUpdateOutcome::Skipped(GpsSkipReason::SingularInnovation)
            }
        }
    }

    pub fn position(&self) -> Vec3 {
        self.block(POS_X)
    }

    pub fn velocity(&self) -> Vec3 {
        self.block(VEL_X)
    }

    pub fn speed(&self) -> f64 {
        self.velocity().norm()
    }

    /// Overwrite the velocity sub-state; covariance is left as is.
    pub fn set_velocity(&mut self, velocity: &Vec3) {
        for axis in 0..3 {
            // state is always 6x1
            let _ = self.state.set(VEL_X + axis, 0, velocity[axis]);
        }
    }

    pub fn force_zero_velocity(&mut self) {
        self.set_velocity(&Vec3::zeros());
    }

    pub fn covariance(&self) -> &Matrix {
        &self.covariance
    }

    pub fn last_fix_used(&self) -> Option<&LocationData> {
        self.last_fix_used.as_ref()
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn get_state(&self) -> Ekf6dState {
        let p = self.position();
        let v = self.velocity();
        Ekf6dState {
            position: (p.x, p.y, p.z),
            velocity: (v.x, v.y, v.z),
            covariance_trace: self.covariance.trace(),
            predicts: self.predicts,
            stationary_updates: self.stationary_updates,
            gps_updates: self.gps_updates,
        }
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Standard Kalman correction. `Ok(false)` when S has no inverse.
    fn kalman_update(&mut self, h: &Matrix, z: &Matrix, r: &Matrix) -> Result<bool, MatrixError> {
        let innovation = z.sub(&h.mul(&self.state)?)?;
        let p_ht = self.covariance.mul(&h.transpose())?;
        let s = h.mul(&p_ht)?.add(r)?;

        let s_inv = match s.rows() {
            2 => s.inverse2x2(),
            3 => s.inverse3x3(),
            _ => None,
        };
        let Some(s_inv) = s_inv else {
            log::error!("Failed to invert S matrix. S:\n{s}");
            return Ok(false);
        };

        let k = p_ht.mul(&s_inv)?;
        let state = self.state.add(&k.mul(&innovation)?)?;

        // P = (I - K*H) * P
        let i_minus_kh = Matrix::identity(STATE_DIM_6).sub(&k.mul(h)?)?;
        let covariance = i_minus_kh.mul(&self.covariance)?.symmetrized()?;

        self.state = state;
        self.covariance = covariance;
        Ok(true)
    }

    fn validate_fix(fix: &LocationData, config: &FilterConfig) -> Result<(f64, f64), GpsSkipReason> {
        if !fix.is_local_valid {
            return Err(GpsSkipReason::NotLocallyValid);
        }
        let (Some(x), Some(y)) = (fix.local_x, fix.local_y) else {
            return Err(GpsSkipReason::MissingLocalPosition);
        };
        match fix.accuracy {
            Some(acc) if acc > 0.0 && acc <= config.gps_max_accuracy => Ok((x, y)),
            other => Err(GpsSkipReason::InvalidAccuracy(other)),
        }
    }

    fn position_selector(dims: usize) -> Matrix {
        Matrix::from_fn(dims, STATE_DIM_6, |r, c| if r == c { 1.0 } else { 0.0 })
    }

    fn diagonal(values: &[f64]) -> Matrix {
        Matrix::from_fn(values.len(), values.len(), |r, c| {
            if r == c {
                values[r]
            } else {
                0.0
            }
        })
    }

    fn block(&self, start: usize) -> Vec3 {
        Vec3::from_fn(|i, _| self.state.get(start + i, 0).unwrap_or_default())
    }
}
