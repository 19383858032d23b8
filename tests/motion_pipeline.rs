use std::sync::Arc;

use approx::assert_relative_eq;
use motion_engine_rs::clock::ManualClock;
use motion_engine_rs::filters::orientation::{CalibrationOutcome, OrientationTracker};
use motion_engine_rs::types::{AccelData, GyroData, LocationData, OrientationData};
use motion_engine_rs::{EngineConfig, MotionEngine, MotionEvent, MotionStatus};

fn engine_with_clock() -> (MotionEngine, ManualClock) {
    let clock = ManualClock::new(0);
    let engine = MotionEngine::with_clock(EngineConfig::default(), Arc::new(clock.clone()));
    (engine, clock)
}

#[test]
fn test_end_to_end_single_step() {
    let (mut engine, _) = engine_with_clock();
    engine.reset();

    engine.process_orientation(&OrientationData::new(&[0.0, 0.0, 0.0, 1.0]));
    // large rotation rate keeps the stationarity test false
    engine.process_gyro(&GyroData::new(0.0, 0.0, 2.0));
    engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, 5_000_000_000));
    engine.process_accel(&AccelData::new(1.0, 0.0, 0.0, 5_100_000_000));

    let state = engine.snapshot();
    assert_relative_eq!(state.velocity.0, 0.1, epsilon = 1e-9);
    assert_relative_eq!(state.velocity.1, 0.0);
    assert_relative_eq!(state.velocity.2, 0.0);
    assert_relative_eq!(state.position.0, 0.005, epsilon = 1e-9);
    assert_relative_eq!(state.speed_kmh, 0.36, epsilon = 1e-9);
    assert_eq!(state.status, MotionStatus::Moving);
    assert_eq!(state.path_history.len(), 1);
}

#[test]
fn test_quaternion_stays_normalized() {
    let mut tracker = OrientationTracker::new(1e-6);
    let inputs = [
        [0.0, 0.0, 0.0, 5.0],
        [1.0, 2.0, 3.0, 4.0],
        [-0.3, 0.01, 7.0, -2.0],
        [1e-3, 0.0, 0.0, 0.0],
    ];
    for input in inputs {
        tracker.ingest(&OrientationData::new(&input));
        assert_relative_eq!(tracker.raw_quaternion().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(tracker.final_quaternion().norm(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_calibration_zeroes_relative_angles_anywhere() {
    let orientations = [
        [0.0, 0.0, 0.0, 1.0],
        [0.2, -0.4, 0.1, 0.8],
        [0.7, 0.1, -0.6, 0.2],
        [0.0, 0.9, 0.0, 0.1],
    ];
    for q in orientations {
        let (mut engine, _) = engine_with_clock();
        engine.process_orientation(&OrientationData::new(&q));
        assert_eq!(engine.calibrate_zero(), CalibrationOutcome::Calibrated);

        let rel = engine.snapshot().relative;
        assert_relative_eq!(rel.yaw, 0.0, epsilon = 1e-6);
        assert_relative_eq!(rel.pitch, 0.0, epsilon = 1e-6);
        assert_relative_eq!(rel.roll, 0.0, epsilon = 1e-6);
    }
}

#[test]
fn test_gps_pull_and_distance_accumulation() {
    let (mut engine, clock) = engine_with_clock();
    engine.process_orientation(&OrientationData::new(&[0.0, 0.0, 0.0, 1.0]));
    engine.process_gyro(&GyroData::new(0.0, 0.0, 1.0));

    let mut ts = 0_i64;
    engine.process_accel(&AccelData::new(0.0, 0.0, 0.0, ts));

    // walk east along a fix track, one accel sample per second of wall clock
    let mut total_applied = 0;
    for step in 1..=5 {
        let fix = LocationData::local(clock_ms(step), 2.0 * step as f64, 0.0, 3.0).with_speed(2.0);
        engine.process_gps(Some(&fix));
        clock.set(clock_ms(step));
        ts += 1_000_000_000;
        let events = engine.process_accel(&AccelData::new(0.0, 0.0, 0.0, ts));
        total_applied += events
            .iter()
            .filter(|e| matches!(e, MotionEvent::GpsApplied { forced: true, .. }))
            .count();
    }

    assert_eq!(total_applied, 5);
    let state = engine.snapshot();
    assert!(state.is_high_speed);
    assert!(state.position.0 > 8.0, "position {:?}", state.position);
    assert!(state.accumulated_distance > 0.0);
    assert!(state.path_history.len() > 1);
    assert!(engine.last_valid_gps().is_some());
}

fn clock_ms(step: i64) -> i64 {
    step * 1_000
}

#[test]
fn test_reset_then_resume() {
    let (mut engine, _) = engine_with_clock();
    engine.process_orientation(&OrientationData::new(&[0.0, 0.0, 0.0, 1.0]));
    engine.process_gyro(&GyroData::new(1.0, 0.0, 0.0));
    engine.process_accel(&AccelData::new(3.0, 0.0, 0.0, 0));
    engine.process_accel(&AccelData::new(3.0, 0.0, 0.0, 200_000_000));
    assert!(engine.snapshot().speed_mps > 0.0);

    engine.reset();
    assert_eq!(engine.snapshot().status, MotionStatus::Initializing);

    // accel before a new orientation sample is ignored
    engine.process_accel(&AccelData::new(3.0, 0.0, 0.0, 400_000_000));
    assert_eq!(engine.ekf().speed(), 0.0);

    engine.process_orientation(&OrientationData::new(&[0.0, 0.0, 0.0, 1.0]));
    engine.process_gyro(&GyroData::new(1.0, 0.0, 0.0));
    engine.process_accel(&AccelData::new(3.0, 0.0, 0.0, 600_000_000));
    engine.process_accel(&AccelData::new(3.0, 0.0, 0.0, 700_000_000));
    assert_relative_eq!(engine.ekf().velocity().x, 0.3, epsilon = 1e-9);
}
