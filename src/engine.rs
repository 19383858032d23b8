// engine.rs: Motion orchestrator
//
// Pure and synchronous: samples in, events and snapshots out. No tokio, no
// I/O. The only time source besides sensor timestamps is the injected Clock,
// used for the distance-accumulation interval.
//
// Exclusive access is the caller's job (see service.rs); every method takes
// &mut self and assumes samples arrive in order.

use std::sync::Arc;

use crate::classifier::{
    MotionMode, SpeedMode, SpeedModeClassifier, SpeedModeExit, StationarityClassifier,
};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::filters::ekf_6d::{Ekf6d, GpsSkipReason, GpsUpdateOutcome};
use crate::filters::orientation::{CalibrationOutcome, OrientationOutcome, OrientationTracker};
use crate::state::{tuple3, MotionState, MotionStatus, PathPoint};
use crate::types::{AccelData, GyroData, LocationData, OrientationData, Vec3};

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum MotionEvent {
    MeasurementStarted,
    OrientationRejected,
    BecameStationary,
    BecameMoving,
    EnteredHighSpeed { gps_speed: f64 },
    ExitedHighSpeed { reason: SpeedModeExit },
    GpsApplied { forced: bool, dims: usize },
    GpsSkipped { forced: bool, reason: GpsSkipReason },
    VelocityClamped { speed: f64 },
    DistanceAccumulated { delta: f64, total: f64 },
    DistanceDiscarded { delta: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineMode {
    Uninitialized,
    Measuring,
}

// ─── Distance accumulation ───────────────────────────────────────────────────

/// Sums 3D displacement once per wall-clock interval, dropping noise-sized
/// and implausibly large steps.
#[derive(Clone, Debug)]
pub struct DistanceAccumulator {
    interval_ms: i64,
    min_step: f64,
    max_step: f64,
    checkpoint: Option<(Vec3, i64)>,
    total: f64,
}

impl DistanceAccumulator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            interval_ms: config.accumulation_interval_ms,
            min_step: config.min_accumulation_distance,
            max_step: config.max_accumulation_step,
            checkpoint: None,
            total: 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn update(&mut self, position: &Vec3, now_ms: i64) -> Option<MotionEvent> {
        let Some((last_position, last_ms)) = self.checkpoint else {
            self.checkpoint = Some((*position, now_ms));
            return None;
        };
        if now_ms - last_ms < self.interval_ms {
            return None;
        }

        // checkpoint advances whether or not the step counts
        self.checkpoint = Some((*position, now_ms));
        let delta = (position - last_position).norm();
        if delta >= self.min_step && delta <= self.max_step {
            self.total += delta;
            Some(MotionEvent::DistanceAccumulated {
                delta,
                total: self.total,
            })
        } else {
            Some(MotionEvent::DistanceDiscarded { delta })
        }
    }

    pub fn reset(&mut self) {
        self.checkpoint = None;
        self.total = 0.0;
    }
}

// ─── Path history ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct PathHistory {
    min_spacing: f64,
    points: Vec<PathPoint>,
}

impl PathHistory {
    pub fn new(min_spacing: f64) -> Self {
        Self {
            min_spacing,
            points: Vec::new(),
        }
    }

    /// Append `point` if it is the first one or far enough from the last one.
    pub fn record(&mut self, point: PathPoint) -> bool {
        let far_enough = self
            .points
            .last()
            .map_or(true, |last| last.distance_to(&point) >= self.min_spacing);
        if far_enough {
            self.points.push(point);
        }
        far_enough
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct MotionEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,

    tracker: OrientationTracker,
    ekf: Ekf6d,
    stationarity: StationarityClassifier,
    speed_mode: SpeedModeClassifier,

    mode: EngineMode,
    last_accel_ts: Option<i64>,
    gyro_rate: Vec3,
    world_accel: Vec3,

    latest_gps: Option<LocationData>,
    last_valid_gps: Option<LocationData>,
    position_at_gps_update: Option<Vec3>,

    distance: DistanceAccumulator,
    history: PathHistory,

    snapshot: Arc<MotionState>,
    snapshot_version: u64,
}

impl MotionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            tracker: OrientationTracker::new(config.min_quaternion_norm),
            ekf: Ekf6d::new(config.filter.clone()),
            stationarity: StationarityClassifier::new(&config),
            speed_mode: SpeedModeClassifier::new(&config),
            mode: EngineMode::Uninitialized,
            last_accel_ts: None,
            gyro_rate: Vec3::zeros(),
            world_accel: Vec3::zeros(),
            latest_gps: None,
            last_valid_gps: None,
            position_at_gps_update: None,
            distance: DistanceAccumulator::new(&config),
            history: PathHistory::new(config.min_history_spacing),
            snapshot: Arc::new(MotionState::initial()),
            snapshot_version: 0,
            clock,
            config,
        }
    }

    // ── Inputs ──

    /// Cache the angular rate; it only feeds the stationarity test.
    pub fn process_gyro(&mut self, gyro: &GyroData) {
        self.gyro_rate = Vec3::new(gyro.x, gyro.y, gyro.z);
    }

    pub fn process_orientation(&mut self, reading: &OrientationData) -> Vec<MotionEvent> {
        let mut events = Vec::new();

        if self.tracker.ingest(reading) == OrientationOutcome::Rejected {
            events.push(MotionEvent::OrientationRejected);
        }

        if self.mode == EngineMode::Uninitialized && self.tracker.has_valid_orientation() {
            self.mode = EngineMode::Measuring;
            log::info!("Measurement started");
            events.push(MotionEvent::MeasurementStarted);
        }

        if self.mode == EngineMode::Measuring {
            self.publish();
        }
        events
    }

    pub fn process_accel(&mut self, accel: &AccelData) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        if self.mode != EngineMode::Measuring {
            return events;
        }

        let ts = accel.timestamp_ns;
        let Some(prev_ts) = self.last_accel_ts.replace(ts) else {
            return events;
        };
        let Some(delta_ns) = ts.checked_sub(prev_ts) else {
            log::warn!("Accel timestamp jump overflows ({prev_ts} -> {ts}), skipping sample");
            return events;
        };
        let dt = delta_ns as f64 / 1e9;
        if dt <= self.config.min_accel_dt {
            return events;
        }

        let Some(world) = self.tracker.rotate_to_world(&accel.vector()) else {
            log::warn!("Rotation matrix not available for accel");
            return events;
        };
        self.world_accel = world;

        // Stationarity
        let gps_speed = self
            .latest_gps
            .as_ref()
            .and_then(|fix| fix.speed)
            .unwrap_or(0.0);
        let transition = self
            .stationarity
            .update(world.norm(), self.gyro_rate.norm(), gps_speed);
        if transition.changed() {
            match transition.to {
                MotionMode::Stationary => {
                    log::info!("Became stationary");
                    events.push(MotionEvent::BecameStationary);
                }
                MotionMode::Moving => {
                    log::info!("Became moving");
                    events.push(MotionEvent::BecameMoving);
                }
            }
        }

        // Predict
        if self.stationarity.is_stationary() {
            self.ekf.update_stationary();
            self.ekf.predict(dt, &Vec3::zeros());
        } else {
            self.ekf.predict(dt, &world);
        }

        self.apply_gps(&mut events);

        // Low-speed clamp
        let speed = self.ekf.speed();
        if !self.stationarity.is_stationary()
            && speed < self.config.min_velocity_threshold
            && self.ekf.velocity() != Vec3::zeros()
        {
            self.ekf.force_zero_velocity();
            log::debug!("Applied min velocity threshold. Speed was {speed:.2}");
            events.push(MotionEvent::VelocityClamped { speed });
        }

        let position = self.ekf.position();
        if let Some(event) = self.distance.update(&position, self.clock.now_ms()) {
            events.push(event);
        }
        self.history.record(PathPoint::from_position(&position));

        self.publish();
        events
    }

    /// Cache the latest fix (`None` on fix loss) and re-evaluate high-speed mode.
    ///
    /// Does not touch the filter; the fix is consumed on the next accel sample.
    pub fn process_gps(&mut self, fix: Option<&LocationData>) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        self.latest_gps = fix.cloned();

        let transition = self.speed_mode.update(fix);
        if transition.changed() {
            match transition.to {
                SpeedMode::HighSpeed => {
                    let gps_speed = fix.and_then(|f| f.speed).unwrap_or(0.0);
                    log::info!("Entered high speed mode (GPS speed: {gps_speed:.2}m/s)");
                    events.push(MotionEvent::EnteredHighSpeed { gps_speed });
                }
                SpeedMode::Normal => {
                    let reason = self
                        .speed_mode
                        .last_exit()
                        .unwrap_or(SpeedModeExit::BelowThreshold);
                    log::info!("Exited high speed mode ({reason:?})");
                    events.push(MotionEvent::ExitedHighSpeed { reason });
                }
            }
        }
        events
    }

    /// Zero the relative angles at the current orientation.
    pub fn calibrate_zero(&mut self) -> CalibrationOutcome {
        let outcome = self.tracker.calibrate_zero();
        if outcome == CalibrationOutcome::Calibrated {
            self.publish();
        }
        outcome
    }

    pub fn reset(&mut self) {
        log::info!("Resetting motion engine");
        self.tracker.reset();
        self.ekf.reset();
        self.stationarity.reset();
        self.speed_mode.reset();
        self.mode = EngineMode::Uninitialized;
        self.last_accel_ts = None;
        self.gyro_rate = Vec3::zeros();
        self.world_accel = Vec3::zeros();
        self.latest_gps = None;
        self.last_valid_gps = None;
        self.position_at_gps_update = None;
        self.distance.reset();
        self.history.clear();
        self.publish_state(MotionState::initial());
    }

    // ── Queries ──

    pub fn snapshot(&self) -> Arc<MotionState> {
        Arc::clone(&self.snapshot)
    }

    /// Number of distinct snapshots published so far
    pub fn snapshot_version(&self) -> u64 {
        self.snapshot_version
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn motion_mode(&self) -> MotionMode {
        self.stationarity.mode()
    }

    pub fn speed_mode(&self) -> SpeedMode {
        self.speed_mode.mode()
    }

    pub fn last_valid_gps(&self) -> Option<&LocationData> {
        self.last_valid_gps.as_ref()
    }

    /// Filter position recorded at the last GPS correction
    pub fn filter_position_at_gps_update(&self) -> Option<Vec3> {
        self.position_at_gps_update
    }

    pub fn ekf(&self) -> &Ekf6d {
        &self.ekf
    }

    pub fn tracker(&self) -> &OrientationTracker {
        &self.tracker
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Internals ──

    /// Forced correction, then an ordinary gated one, against the same fix.
    fn apply_gps(&mut self, events: &mut Vec<MotionEvent>) {
        let Some(fix) = self.latest_gps.clone().filter(|f| f.is_local_valid) else {
            return;
        };
        let high_speed = self.speed_mode.is_high_speed();
        let before = self.ekf.position();

        let forced = self.ekf.update_gps_position(&fix, high_speed, true);
        events.push(Self::gps_event(forced, true));
        self.last_valid_gps = Some(fix.clone());
        self.position_at_gps_update = Some(self.ekf.position());

        let normal = self.ekf.update_gps_position(&fix, high_speed, false);
        events.push(Self::gps_event(normal, false));
        if normal.is_applied() {
            self.last_valid_gps = Some(fix);
            self.position_at_gps_update = Some(before);
        }
    }

    fn gps_event(outcome: GpsUpdateOutcome, forced: bool) -> MotionEvent {
        match outcome {
            GpsUpdateOutcome::Applied { dims, .. } => MotionEvent::GpsApplied { forced, dims },
            GpsUpdateOutcome::Skipped(reason) => MotionEvent::GpsSkipped { forced, reason },
        }
    }

    fn build_state(&self) -> MotionState {
        if !self.tracker.has_valid_orientation() {
            return MotionState::initial();
        }

        let position = self.ekf.position();
        let velocity = self.ekf.velocity();
        let speed = velocity.norm();
        let status = if self.stationarity.is_stationary() {
            MotionStatus::Stationary
        } else {
            MotionStatus::Moving
        };

        MotionState {
            position: tuple3(&position),
            velocity: tuple3(&velocity),
            world_accel: tuple3(&self.world_accel),
            relative: self.tracker.relative_angles(),
            absolute: self.tracker.absolute_angles(),
            is_stationary: self.stationarity.is_stationary(),
            is_high_speed: self.speed_mode.is_high_speed(),
            speed_mps: speed,
            speed_kmh: speed * 3.6,
            total_distance: position.norm(),
            accumulated_distance: self.distance.total(),
            current_point: Some(PathPoint::from_position(&position)),
            path_history: self.history.points().to_vec(),
            status,
            status_label: status.label().to_string(),
            status_color: status.color(),
            latest_gps: self.latest_gps.clone(),
        }
    }

    fn publish(&mut self) -> bool {
        let state = self.build_state();
        self.publish_state(state)
    }

    fn publish_state(&mut self, state: MotionState) -> bool {
        if *self.snapshot == state {
            return false;
        }
        self.snapshot = Arc::new(state);
        self.snapshot_version += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use approx::assert_relative_eq;

    const IDENTITY: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

    fn engine() -> (MotionEngine, ManualClock) {
        let clock = ManualClock::new(0);
        let engine = MotionEngine::with_clock(EngineConfig::default(), Arc::new(clock.clone()));
        (engine, clock)
    }

    fn started() -> (MotionEngine, ManualClock) {
        let (mut engine, clock) = engine();
        engine.process_orientation(&OrientationData::new(&IDENTITY));
        (engine, clock)
    }

    #[test]
    fn test_accel_ignored_before_orientation() {
        let (mut engine, _) = engine();
        assert!(engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, 0)).is_empty());
        assert!(engine
            .process_accel(&AccelData::new(1.0, 0.0, 0.0, 100_000_000))
            .is_empty());
        assert_eq!(engine.ekf().velocity(), Vec3::zeros());
        assert_eq!(engine.snapshot().status, MotionStatus::Initializing);
    }

    #[test]
    fn test_first_orientation_starts_measurement() {
        let (mut engine, _) = engine();
        let events = engine.process_orientation(&OrientationData::new(&IDENTITY));
        assert_eq!(events, vec![MotionEvent::MeasurementStarted]);
        assert_eq!(engine.mode(), EngineMode::Measuring);
        assert_eq!(engine.snapshot().status, MotionStatus::Moving);

        let events = engine.process_orientation(&OrientationData::new(&[0.0, 0.0, 0.0, 0.0]));
        assert_eq!(events, vec![MotionEvent::OrientationRejected]);
        assert_eq!(engine.mode(), EngineMode::Measuring);
    }

    #[test]
    fn test_degenerate_orientation_does_not_start() {
        let (mut engine, _) = engine();
        engine.process_orientation(&OrientationData::new(&[0.0, 0.0, 0.0, 0.0]));
        assert_eq!(engine.mode(), EngineMode::Uninitialized);
        assert_eq!(engine.snapshot_version(), 0);
    }

    #[test]
    fn test_integration_after_baseline_sample() {
        let (mut engine, _) = started();
        engine.process_gyro(&GyroData::new(1.0, 0.0, 0.0));
        engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, 1_000_000_000));
        assert_eq!(engine.ekf().velocity(), Vec3::zeros());

        engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, 1_100_000_000));
        let v = engine.ekf().velocity();
        let p = engine.ekf().position();
        assert_relative_eq!(v.x, 0.1, epsilon = 1e-9);
        assert_relative_eq!(p.x, 0.005, epsilon = 1e-9);
        assert_eq!(engine.snapshot().world_accel, (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_tiny_dt_is_ignored() {
        let (mut engine, _) = started();
        engine.process_gyro(&GyroData::new(1.0, 0.0, 0.0));
        engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, 1_000));
        engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, 1_050));
        assert_eq!(engine.ekf().get_state().predicts, 0);
    }

    #[test]
    fn test_overflowing_timestamp_jump_is_ignored() {
        let (mut engine, _) = started();
        engine.process_gyro(&GyroData::new(1.0, 0.0, 0.0));
        engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, i64::MIN + 10));
        assert!(engine
            .process_accel(&AccelData::new(1.0, 0.0, 0.0, i64::MAX - 200_000_000))
            .is_empty());
        assert_eq!(engine.ekf().get_state().predicts, 0);
        assert_eq!(engine.ekf().velocity(), Vec3::zeros());

        // the new timestamp still becomes the baseline
        engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, i64::MAX - 100_000_000));
        assert_eq!(engine.ekf().get_state().predicts, 1);
    }

    #[test]
    fn test_stationary_sample_predicts_with_zero_accel() {
        let (mut engine, _) = started();
        engine.process_accel(&AccelData::new(0.05, 0.0, 0.0, 0));
        let events = engine.process_accel(&AccelData::new(0.05, 0.0, 0.0, 20_000_000));
        assert!(events.contains(&MotionEvent::BecameStationary));
        assert_eq!(engine.ekf().velocity(), Vec3::zeros());
        let snapshot = engine.snapshot();
        assert!(snapshot.is_stationary);
        assert_eq!(snapshot.status, MotionStatus::Stationary);
        // world accel is still reported as measured
        assert_eq!(snapshot.world_accel, (0.05, 0.0, 0.0));
    }

    #[test]
    fn test_low_speed_clamp() {
        let (mut engine, _) = started();
        engine.process_gyro(&GyroData::new(1.0, 0.0, 0.0));
        engine.process_accel(&AccelData::new(0.5, 0.0, 0.0, 0));
        let events = engine.process_accel(&AccelData::new(0.5, 0.0, 0.0, 100_000_000));
        assert!(matches!(events.last(), Some(MotionEvent::VelocityClamped { .. })));
        assert_eq!(engine.ekf().velocity(), Vec3::zeros());
        assert!(engine.ekf().position().x > 0.0);
    }

    #[test]
    fn test_gps_bookkeeping() {
        let (mut engine, _) = started();
        engine.process_gyro(&GyroData::new(1.0, 0.0, 0.0));
        engine.process_gps(Some(&LocationData::local(0, 5.0, 0.0, 4.0)));
        engine.process_accel(&AccelData::new(0.0, 0.0, 0.0, 0));
        let events = engine.process_accel(&AccelData::new(0.0, 0.0, 0.0, 20_000_000));

        assert!(events.contains(&MotionEvent::GpsApplied { forced: true, dims: 2 }));
        // the forced update already consumed the fix, so the gated one sees no movement
        assert!(events.iter().any(|e| matches!(
            e,
            MotionEvent::GpsSkipped {
                forced: false,
                reason: GpsSkipReason::ShortDistance { .. }
            }
        )));
        assert!(engine.last_valid_gps().is_some());
        let recorded = engine.filter_position_at_gps_update().unwrap();
        assert!(recorded.x > 0.0);
    }

    #[test]
    fn test_invalid_gps_not_applied() {
        let (mut engine, _) = started();
        let mut fix = LocationData::local(0, 5.0, 0.0, 4.0);
        fix.is_local_valid = false;
        engine.process_gps(Some(&fix));
        engine.process_accel(&AccelData::new(0.0, 0.0, 0.0, 0));
        let events = engine.process_accel(&AccelData::new(0.0, 0.0, 0.0, 20_000_000));
        assert!(!events.iter().any(|e| matches!(e, MotionEvent::GpsApplied { .. })));
        assert!(engine.last_valid_gps().is_none());
        assert_eq!(engine.snapshot().latest_gps, Some(fix));
    }

    #[test]
    fn test_high_speed_events() {
        let (mut engine, _) = started();
        let fast = LocationData::local(0, 0.0, 0.0, 5.0).with_speed(8.0);
        let events = engine.process_gps(Some(&fast));
        assert_eq!(events, vec![MotionEvent::EnteredHighSpeed { gps_speed: 8.0 }]);
        assert_eq!(engine.speed_mode(), SpeedMode::HighSpeed);

        let events = engine.process_gps(None);
        assert_eq!(
            events,
            vec![MotionEvent::ExitedHighSpeed { reason: SpeedModeExit::FixLost }]
        );
    }

    #[test]
    fn test_distance_accumulator_bounds() {
        let config = EngineConfig::default();
        let mut acc = DistanceAccumulator::new(&config);
        assert!(acc.update(&Vec3::zeros(), 0).is_none());

        // interval not yet elapsed
        assert!(acc.update(&Vec3::new(1.0, 0.0, 0.0), 999).is_none());

        let floor = config.min_accumulation_distance;
        acc.update(&Vec3::new(floor, 0.0, 0.0), 1_000);
        assert_relative_eq!(acc.total(), floor);

        let below = Vec3::new(floor + 0.9 * floor, 0.0, 0.0);
        let event = acc.update(&below, 2_000);
        assert!(matches!(event, Some(MotionEvent::DistanceDiscarded { .. })));
        assert_relative_eq!(acc.total(), floor);

        let jump = Vec3::new(below.x + config.max_accumulation_step + 1.0, 0.0, 0.0);
        assert!(matches!(
            acc.update(&jump, 3_000),
            Some(MotionEvent::DistanceDiscarded { .. })
        ));
        assert_relative_eq!(acc.total(), floor);

        // checkpoint moved to the jump position
        acc.update(&(jump + Vec3::new(0.0, 2.0, 0.0)), 4_000);
        assert_relative_eq!(acc.total(), floor + 2.0);
    }

    #[test]
    fn test_path_history_spacing() {
        let mut history = PathHistory::new(0.1);
        for i in 0..10 {
            history.record(PathPoint::new(0.005 * i as f64, 0.0));
        }
        assert_eq!(history.points().len(), 1);

        assert!(history.record(PathPoint::new(0.2, 0.0)));
        assert!(history.record(PathPoint::new(0.2, 0.15)));
        assert_eq!(history.points().len(), 3);
    }

    #[test]
    fn test_snapshot_only_published_on_change() {
        let (mut engine, _) = started();
        let version = engine.snapshot_version();
        engine.process_orientation(&OrientationData::new(&IDENTITY));
        assert_eq!(engine.snapshot_version(), version);

        engine.process_orientation(&OrientationData::new(&[0.0, 0.0, 0.3826834, 0.9238795]));
        assert_eq!(engine.snapshot_version(), version + 1);
    }

    #[test]
    fn test_calibrate_publishes_zero_relative_angles() {
        let (mut engine, _) = engine();
        assert_eq!(engine.calibrate_zero(), CalibrationOutcome::NoOrientation);

        engine.process_orientation(&OrientationData::new(&[0.1, 0.2, 0.3, 0.9]));
        assert_ne!(engine.snapshot().relative.yaw, 0.0);
        assert_eq!(engine.calibrate_zero(), CalibrationOutcome::Calibrated);
        let relative = engine.snapshot().relative;
        assert_relative_eq!(relative.yaw, 0.0, epsilon = 1e-9);
        assert_relative_eq!(relative.pitch, 0.0, epsilon = 1e-9);
        assert_relative_eq!(relative.roll, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_restores_initial_snapshot() {
        let (mut engine, clock) = started();
        engine.process_gyro(&GyroData::new(1.0, 0.0, 0.0));
        engine.process_accel(&AccelData::new(2.0, 0.0, 0.0, 0));
        clock.advance(1_000);
        engine.process_accel(&AccelData::new(2.0, 0.0, 0.0, 500_000_000));
        assert!(!engine.snapshot().path_history.is_empty());

        engine.reset();
        assert_eq!(*engine.snapshot(), MotionState::initial());
        assert_eq!(engine.mode(), EngineMode::Uninitialized);
        assert_eq!(engine.ekf().position(), Vec3::zeros());
        assert!(engine.last_valid_gps().is_none());
    }
}
