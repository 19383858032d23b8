use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

// ─── Filter noise model ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    // ── Process / stationary noise ──
    pub accel_noise_std: f64,
    pub stationary_vel_noise_std: f64,
    pub initial_covariance_scale: f64,

    // ── GPS gating ──
    pub gps_short_distance_threshold: f64,
    pub gps_max_accuracy: f64,
    pub gps_min_std_dev: f64,

    // ── GPS noise factors (scale max(accuracy, min_std_dev)) ──
    pub gps_xy_noise_factor: f64,
    pub gps_z_noise_factor: f64,
    pub gps_xy_noise_factor_high_speed: f64,
    pub gps_xy_noise_factor_forced: f64,
    pub gps_z_noise_factor_forced: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            accel_noise_std: 0.8,
            stationary_vel_noise_std: 0.01,
            initial_covariance_scale: 1.0,
            gps_short_distance_threshold: 1.0,
            gps_max_accuracy: 50.0,
            gps_min_std_dev: 1.0,
            gps_xy_noise_factor: 0.5,
            gps_z_noise_factor: 2.0,
            gps_xy_noise_factor_high_speed: 0.1,
            gps_xy_noise_factor_forced: 0.05,
            gps_z_noise_factor_forced: 0.5,
        }
    }
}

// ─── Orchestrator thresholds ─────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub filter: FilterConfig,

    // ── Sample validation ──
    pub min_quaternion_norm: f64,
    pub min_accel_dt: f64,

    // ── Stationarity classifier ──
    pub stationary_accel_threshold: f64,
    pub stationary_gyro_threshold: f64,
    pub stationary_hysteresis: f64,

    // ── High-speed mode ──
    pub high_speed_threshold_kmh: f64,
    pub high_speed_max_accuracy: f64,

    // ── Low-speed clamp ──
    pub min_velocity_threshold: f64,

    // ── Distance accumulation ──
    pub accumulation_interval_ms: i64,
    pub min_accumulation_distance: f64,
    pub max_accumulation_step: f64,

    // ── Path history ──
    pub min_history_spacing: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            min_quaternion_norm: 1e-6,
            min_accel_dt: 1e-7,
            stationary_accel_threshold: 0.2,
            stationary_gyro_threshold: 0.03,
            stationary_hysteresis: 1.5,
            high_speed_threshold_kmh: 5.0,
            high_speed_max_accuracy: 30.0,
            min_velocity_threshold: 0.1,
            accumulation_interval_ms: 1000,
            min_accumulation_distance: 0.05,
            max_accumulation_step: 10.0,
            min_history_spacing: 0.1,
        }
    }
}

impl EngineConfig {
    /// High-speed threshold in m/s. Also the GPS-speed ceiling for stationarity.
    pub fn high_speed_threshold_mps(&self) -> f64 {
        self.high_speed_threshold_kmh / 3.6
    }

    /// Parse a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let positive = [
            ("filter.gps_max_accuracy", self.filter.gps_max_accuracy),
            ("min_history_spacing", self.min_history_spacing),
            ("stationary_accel_threshold", self.stationary_accel_threshold),
            ("stationary_gyro_threshold", self.stationary_gyro_threshold),
        ];
        for (name, value) in positive {
            if value <= 0.0 || value.is_nan() {
                return Err(EngineError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        let scale = self.filter.initial_covariance_scale;
        if scale < 0.0 || scale.is_nan() {
            return Err(EngineError::Config(format!(
                "filter.initial_covariance_scale must be >= 0, got {scale}"
            )));
        }
        if self.min_accumulation_distance > self.max_accumulation_step {
            return Err(EngineError::Config(format!(
                "min_accumulation_distance {} exceeds max_accumulation_step {}",
                self.min_accumulation_distance, self.max_accumulation_step
            )));
        }
        if self.stationary_hysteresis < 1.0 {
            return Err(EngineError::Config(format!(
                "stationary_hysteresis must be >= 1.0, got {}",
                self.stationary_hysteresis
            )));
        }
        if self.accumulation_interval_ms <= 0 {
            return Err(EngineError::Config(
                "accumulation_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
