// service.rs: Single-owner async frontend for MotionEngine
//
// Sensor callbacks, GPS listeners and UI actions all talk to the engine through
// one mpsc queue, so the engine is only ever mutated by the task that owns it,
// in arrival order. Snapshots go out through a watch channel: readers always
// see the latest value and never block the pipeline.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::engine::MotionEngine;
use crate::error::{EngineError, EngineResult};
use crate::filters::orientation::CalibrationOutcome;
use crate::state::MotionState;
use crate::types::{AccelData, GyroData, LocationData, OrientationData};

/// Queue depth; sensors at ~50-200Hz fit comfortably
const COMMAND_QUEUE_SIZE: usize = 1024;

#[derive(Debug)]
pub enum EngineCommand {
    Gyro(GyroData),
    Accel(AccelData),
    Orientation(OrientationData),
    /// `None` signals fix loss
    Gps(Option<LocationData>),
    Calibrate(oneshot::Sender<CalibrationOutcome>),
    Reset,
    Shutdown,
}

/// Cloneable sender side of the service
#[derive(Clone)]
pub struct MotionHandle {
    tx: mpsc::Sender<EngineCommand>,
    state: watch::Receiver<Arc<MotionState>>,
}

impl MotionHandle {
    pub async fn send(&self, command: EngineCommand) -> EngineResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| EngineError::ServiceStopped)
    }

    /// Non-blocking send for sensor callbacks. `Ok(false)` when the queue is
    /// full and the sample was dropped.
    pub fn try_send(&self, command: EngineCommand) -> EngineResult<bool> {
        match self.tx.try_send(command) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("Motion command queue full, dropping sample");
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(EngineError::ServiceStopped),
        }
    }

    pub async fn gyro(&self, gyro: GyroData) -> EngineResult<()> {
        self.send(EngineCommand::Gyro(gyro)).await
    }

    pub async fn accel(&self, accel: AccelData) -> EngineResult<()> {
        self.send(EngineCommand::Accel(accel)).await
    }

    pub async fn orientation(&self, reading: OrientationData) -> EngineResult<()> {
        self.send(EngineCommand::Orientation(reading)).await
    }

    pub async fn gps(&self, fix: Option<LocationData>) -> EngineResult<()> {
        self.send(EngineCommand::Gps(fix)).await
    }

    pub async fn reset(&self) -> EngineResult<()> {
        self.send(EngineCommand::Reset).await
    }

    /// Waits until every earlier command has been processed.
    pub async fn calibrate(&self) -> EngineResult<CalibrationOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineCommand::Calibrate(reply_tx)).await?;
        reply_rx.await.map_err(|_| EngineError::ServiceStopped)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MotionState>> {
        self.state.clone()
    }

    pub fn current(&self) -> Arc<MotionState> {
        Arc::clone(&self.state.borrow())
    }
}

pub struct MotionService {
    handle: MotionHandle,
    task: JoinHandle<MotionEngine>,
}

impl MotionService {
    /// Start a service around a fresh engine using the system clock.
    pub fn spawn(config: EngineConfig) -> Self {
        Self::spawn_with_engine(MotionEngine::new(config))
    }

    pub fn spawn_with_engine(engine: MotionEngine) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let (state_tx, state_rx) = watch::channel(engine.snapshot());
        let task = tokio::spawn(run(engine, rx, state_tx));
        Self {
            handle: MotionHandle {
                tx,
                state: state_rx,
            },
            task,
        }
    }

    pub fn handle(&self) -> MotionHandle {
        self.handle.clone()
    }

    /// Stop after draining queued commands and hand back the engine.
    pub async fn shutdown(self) -> EngineResult<MotionEngine> {
        self.handle.send(EngineCommand::Shutdown).await?;
        self.task.await.map_err(|e| {
            log::error!("Motion service task failed: {e}");
            EngineError::ServiceStopped
        })
    }
}

async fn run(
    mut engine: MotionEngine,
    mut rx: mpsc::Receiver<EngineCommand>,
    state_tx: watch::Sender<Arc<MotionState>>,
) -> MotionEngine {
    log::info!("Motion service started");
    while let Some(command) = rx.recv().await {
        match command {
            EngineCommand::Gyro(gyro) => engine.process_gyro(&gyro),
            EngineCommand::Accel(accel) => {
                engine.process_accel(&accel);
            }
            EngineCommand::Orientation(reading) => {
                engine.process_orientation(&reading);
            }
            EngineCommand::Gps(fix) => {
                engine.process_gps(fix.as_ref());
            }
            EngineCommand::Calibrate(reply) => {
                let outcome = engine.calibrate_zero();
                publish(&engine, &state_tx);
                // caller may have given up waiting
                let _ = reply.send(outcome);
            }
            EngineCommand::Reset => engine.reset(),
            EngineCommand::Shutdown => break,
        }
        publish(&engine, &state_tx);
    }
    log::info!("Motion service stopped");
    engine
}

fn publish(engine: &MotionEngine, state_tx: &watch::Sender<Arc<MotionState>>) {
    let snapshot = engine.snapshot();
    state_tx.send_if_modified(|current| {
        if Arc::ptr_eq(current, &snapshot) {
            false
        } else {
            *current = snapshot;
            true
        }
    });
}
