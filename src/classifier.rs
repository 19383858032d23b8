// classifier.rs: Motion regime state machines
//
// Two independent modes drive the engine's filter schedule:
//   - MotionMode: stationary vs moving, from IMU magnitudes plus GPS speed,
//     with a relaxed "stay stationary" band to avoid toggling at the edge.
//   - SpeedMode: normal vs high speed, purely from GPS-reported speed. It only
//     selects the GPS noise regime, the EKF's own speed never feeds it.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::types::LocationData;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    Stationary,
    #[default]
    Moving,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedMode {
    #[default]
    Normal,
    HighSpeed,
}

/// Result of feeding one sample to a classifier
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition<M> {
    pub from: M,
    pub to: M,
}

impl<M: PartialEq> Transition<M> {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Clone, Debug)]
pub struct StationarityClassifier {
    accel_threshold: f64,
    gyro_threshold: f64,
    hysteresis: f64,
    max_gps_speed: f64,
    mode: MotionMode,
}

impl StationarityClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            accel_threshold: config.stationary_accel_threshold,
            gyro_threshold: config.stationary_gyro_threshold,
            hysteresis: config.stationary_hysteresis,
            max_gps_speed: config.high_speed_threshold_mps(),
            mode: MotionMode::Moving,
        }
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn is_stationary(&self) -> bool {
        self.mode == MotionMode::Stationary
    }

    /// Classify one sample.
    ///
    /// `gps_speed` is the latest reported GPS speed; callers pass 0 when no
    /// fix or no speed is known.
    pub fn update(&mut self, accel_mag: f64, gyro_mag: f64, gps_speed: f64) -> Transition<MotionMode> {
        let from = self.mode;
        let slow = gps_speed < self.max_gps_speed;

        let still = match from {
            MotionMode::Moving => {
                accel_mag < self.accel_threshold && gyro_mag < self.gyro_threshold
            }
            MotionMode::Stationary => {
                accel_mag < self.accel_threshold * self.hysteresis
                    && gyro_mag < self.gyro_threshold * self.hysteresis
            }
        };

        self.mode = if still && slow {
            MotionMode::Stationary
        } else {
            MotionMode::Moving
        };
        Transition { from, to: self.mode }
    }

    pub fn reset(&mut self) {
        self.mode = MotionMode::Moving;
    }
}

/// Why high-speed mode was left
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SpeedModeExit {
    BelowThreshold,
    FixLost,
    FixInvalid,
}

#[derive(Clone, Debug)]
pub struct SpeedModeClassifier {
    threshold_mps: f64,
    max_accuracy: f64,
    mode: SpeedMode,
    last_exit: Option<SpeedModeExit>,
}

impl SpeedModeClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threshold_mps: config.high_speed_threshold_mps(),
            max_accuracy: config.high_speed_max_accuracy,
            mode: SpeedMode::Normal,
            last_exit: None,
        }
    }

    pub fn mode(&self) -> SpeedMode {
        self.mode
    }

    pub fn is_high_speed(&self) -> bool {
        self.mode == SpeedMode::HighSpeed
    }

    /// Reason for the most recent exit from high-speed mode
    pub fn last_exit(&self) -> Option<SpeedModeExit> {
        self.last_exit
    }

    pub fn update(&mut self, fix: Option<&LocationData>) -> Transition<SpeedMode> {
        let from = self.mode;

        let to = match fix {
            None => self.exit(SpeedModeExit::FixLost),
            Some(fix) => {
                let accuracy = fix.accuracy.unwrap_or(f64::INFINITY);
                match fix.speed {
                    Some(speed) if fix.is_local_valid && accuracy < self.max_accuracy => {
                        if speed > self.threshold_mps {
                            SpeedMode::HighSpeed
                        } else {
                            self.exit(SpeedModeExit::BelowThreshold)
                        }
                    }
                    _ => self.exit(SpeedModeExit::FixInvalid),
                }
            }
        };

        self.mode = to;
        Transition { from, to }
    }

    pub fn reset(&mut self) {
        self.mode = SpeedMode::Normal;
        self.last_exit = None;
    }

    fn exit(&mut self, reason: SpeedModeExit) -> SpeedMode {
        if self.mode == SpeedMode::HighSpeed {
            self.last_exit = Some(reason);
        }
        SpeedMode::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_becomes_stationary_below_base_thresholds() {
        let mut c = StationarityClassifier::new(&config());
        let t = c.update(0.1, 0.01, 0.0);
        assert!(t.changed());
        assert_eq!(t.to, MotionMode::Stationary);
    }

    #[test]
    fn test_hysteresis_band_keeps_stationary() {
        let mut c = StationarityClassifier::new(&config());
        // 0.25 is above the base 0.2 but inside the 1.5x band
        assert_eq!(c.update(0.25, 0.01, 0.0).to, MotionMode::Moving);
        assert_eq!(c.update(0.1, 0.01, 0.0).to, MotionMode::Stationary);
        let t = c.update(0.25, 0.04, 0.0);
        assert!(!t.changed());
        assert!(c.is_stationary());
        assert_eq!(c.update(0.31, 0.01, 0.0).to, MotionMode::Moving);
    }

    #[test]
    fn test_gps_speed_blocks_stationary() {
        let mut c = StationarityClassifier::new(&config());
        assert_eq!(c.update(0.0, 0.0, 2.0).to, MotionMode::Moving);
        assert_eq!(c.update(0.0, 0.0, 1.0).to, MotionMode::Stationary);
        assert_eq!(c.update(0.0, 0.0, 1.5).to, MotionMode::Moving);
    }

    #[test]
    fn test_high_speed_enter_and_exit() {
        let mut c = SpeedModeClassifier::new(&config());
        let fast = LocationData::local(0, 0.0, 0.0, 5.0).with_speed(3.0);
        assert_eq!(c.update(Some(&fast)).to, SpeedMode::HighSpeed);

        let slow = LocationData::local(1000, 0.0, 0.0, 5.0).with_speed(5.0 / 3.6);
        let t = c.update(Some(&slow));
        assert!(t.changed());
        assert_eq!(t.to, SpeedMode::Normal);
        assert_eq!(c.last_exit(), Some(SpeedModeExit::BelowThreshold));
    }

    #[test]
    fn test_high_speed_requires_accuracy() {
        let mut c = SpeedModeClassifier::new(&config());
        let vague = LocationData::local(0, 0.0, 0.0, 30.0).with_speed(10.0);
        assert_eq!(c.update(Some(&vague)).to, SpeedMode::Normal);

        let mut no_accuracy = vague.clone();
        no_accuracy.accuracy = None;
        assert_eq!(c.update(Some(&no_accuracy)).to, SpeedMode::Normal);
    }

    #[test]
    fn test_high_speed_exits_on_fix_loss() {
        let mut c = SpeedModeClassifier::new(&config());
        let fast = LocationData::local(0, 0.0, 0.0, 5.0).with_speed(10.0);
        c.update(Some(&fast));
        assert!(c.is_high_speed());
        assert_eq!(c.update(None).to, SpeedMode::Normal);
        assert_eq!(c.last_exit(), Some(SpeedModeExit::FixLost));

        c.update(Some(&fast));
        let mut invalid = fast.clone();
        invalid.is_local_valid = false;
        assert_eq!(c.update(Some(&invalid)).to, SpeedMode::Normal);
        assert_eq!(c.last_exit(), Some(SpeedModeExit::FixInvalid));
    }
}
