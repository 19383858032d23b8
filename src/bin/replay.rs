use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use flate2::read::GzDecoder;
use motion_engine_rs::clock::ManualClock;
use motion_engine_rs::types::{AccelData, GyroData, LocationData, OrientationData};
use motion_engine_rs::{EngineConfig, MotionEngine, MotionEvent};
use serde::Deserialize;
use serde_json::json;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a recorded session (.json or .json.gz)
    #[arg(long)]
    log: PathBuf,

    /// Engine config overrides (JSON, partial allowed)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// One recorded input. `t_ms` is the wall-clock time the sample arrived.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplayEvent {
    Accel {
        t_ms: i64,
        timestamp_ns: i64,
        x: f64,
        y: f64,
        z: f64,
    },
    Gyro {
        t_ms: i64,
        x: f64,
        y: f64,
        z: f64,
    },
    Orientation {
        t_ms: i64,
        values: Vec<f64>,
    },
    Gps {
        t_ms: i64,
        fix: LocationData,
    },
    GpsLost {
        t_ms: i64,
    },
    Calibrate {
        t_ms: i64,
    },
    Reset {
        t_ms: i64,
    },
}

impl ReplayEvent {
    fn t_ms(&self) -> i64 {
        match self {
            ReplayEvent::Accel { t_ms, .. }
            | ReplayEvent::Gyro { t_ms, .. }
            | ReplayEvent::Orientation { t_ms, .. }
            | ReplayEvent::Gps { t_ms, .. }
            | ReplayEvent::GpsLost { t_ms }
            | ReplayEvent::Calibrate { t_ms }
            | ReplayEvent::Reset { t_ms } => *t_ms,
        }
    }
}

#[derive(Deserialize)]
struct LogFile {
    events: Vec<ReplayEvent>,
}

#[derive(Default)]
struct Counts {
    accel: u64,
    gyro: u64,
    orientation: u64,
    gps: u64,
    gps_lost: u64,
    calibrate: u64,
    reset: u64,

    stationary_transitions: u64,
    gps_forced_applied: u64,
    gps_normal_applied: u64,
    gps_skipped: u64,
    velocity_clamps: u64,
    distance_steps: u64,
    distance_discarded: u64,
}

impl Counts {
    fn record(&mut self, events: &[MotionEvent]) {
        for event in events {
            match event {
                MotionEvent::BecameStationary => self.stationary_transitions += 1,
                MotionEvent::GpsApplied { forced: true, .. } => self.gps_forced_applied += 1,
                MotionEvent::GpsApplied { forced: false, .. } => self.gps_normal_applied += 1,
                MotionEvent::GpsSkipped { .. } => self.gps_skipped += 1,
                MotionEvent::VelocityClamped { .. } => self.velocity_clamps += 1,
                MotionEvent::DistanceAccumulated { .. } => self.distance_steps += 1,
                MotionEvent::DistanceDiscarded { .. } => self.distance_discarded += 1,
                _ => {}
            }
        }
    }
}

fn load_log(path: &Path) -> anyhow::Result<LogFile> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        let reader = BufReader::new(GzDecoder::new(file));
        Ok(serde_json::from_reader(reader)?)
    } else {
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let session = load_log(&args.log)?;
    log::info!("Replaying {} events from {}", session.events.len(), args.log.display());

    let clock = ManualClock::new(session.events.first().map(|e| e.t_ms()).unwrap_or(0));
    let mut engine = MotionEngine::with_clock(config, Arc::new(clock.clone()));
    let mut counts = Counts::default();

    for event in session.events {
        clock.set(event.t_ms());
        match event {
            ReplayEvent::Accel {
                timestamp_ns, x, y, z, ..
            } => {
                counts.accel += 1;
                let events = engine.process_accel(&AccelData::new(x, y, z, timestamp_ns));
                counts.record(&events);
            }
            ReplayEvent::Gyro { x, y, z, .. } => {
                counts.gyro += 1;
                engine.process_gyro(&GyroData::new(x, y, z));
            }
            ReplayEvent::Orientation { values, .. } => {
                counts.orientation += 1;
                let events = engine.process_orientation(&OrientationData { values });
                counts.record(&events);
            }
            ReplayEvent::Gps { fix, .. } => {
                counts.gps += 1;
                let events = engine.process_gps(Some(&fix));
                counts.record(&events);
            }
            ReplayEvent::GpsLost { .. } => {
                counts.gps_lost += 1;
                let events = engine.process_gps(None);
                counts.record(&events);
            }
            ReplayEvent::Calibrate { .. } => {
                counts.calibrate += 1;
                engine.calibrate_zero();
            }
            ReplayEvent::Reset { .. } => {
                counts.reset += 1;
                engine.reset();
            }
        }
    }

    let summary = json!({
        "snapshot": *engine.snapshot(),
        "snapshot_version": engine.snapshot_version(),
        "ekf": engine.ekf().get_state(),
        "inputs": {
            "accel": counts.accel,
            "gyro": counts.gyro,
            "orientation": counts.orientation,
            "gps": counts.gps,
            "gps_lost": counts.gps_lost,
            "calibrate": counts.calibrate,
            "reset": counts.reset,
        },
        "events": {
            "stationary_transitions": counts.stationary_transitions,
            "gps_forced_applied": counts.gps_forced_applied,
            "gps_normal_applied": counts.gps_normal_applied,
            "gps_skipped": counts.gps_skipped,
            "velocity_clamps": counts.velocity_clamps,
            "distance_steps": counts.distance_steps,
            "distance_discarded": counts.distance_discarded,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
