use thiserror::Error;

/// Shape and indexing failures of the dense matrix primitive
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("Dimension mismatch in {op}: {left:?} vs {right:?}")]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Data length {len} does not match {rows}x{cols} matrix")]
    InvalidShape { rows: usize, cols: usize, len: usize },
}

/// Motion engine error types
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Motion service stopped")]
    ServiceStopped,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
