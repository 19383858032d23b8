//! Motion state estimation: quaternion orientation tracking, a 6-state
//! position/velocity EKF, and the orchestrator that schedules them from
//! gyroscope, accelerometer, rotation-vector and GPS samples.
//!
//! [`engine::MotionEngine`] is the synchronous core. [`service::MotionService`]
//! wraps it in a tokio task for callers with concurrent sample sources.

pub mod classifier;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod filters;
pub mod service;
pub mod state;
pub mod types;

pub use config::{EngineConfig, FilterConfig};
pub use engine::{MotionEngine, MotionEvent};
pub use error::{EngineError, EngineResult, MatrixError};
pub use service::{EngineCommand, MotionHandle, MotionService};
pub use state::{MotionState, MotionStatus, PathPoint};
