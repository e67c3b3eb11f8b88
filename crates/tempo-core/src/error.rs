//! Error types for TEMPO

use thiserror::Error;

/// Core TEMPO errors
#[derive(Error, Debug)]
pub enum TempoError {
    // Lifecycle errors
    #[error("No async runtime available to host the worker")]
    NoRuntime,

    // Config errors
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    // Command errors
    #[error("Command rejected: {0}")]
    Command(#[from] CommandError),
}

/// Reasons a command is refused by a clock owner.
///
/// A refused command leaves all state untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Kernel not initialized")]
    NotInitialized,

    #[error("Kernel already initialized")]
    AlreadyInitialized,

    #[error("Invalid surface geometry: {width}x{height} @ {dpr}")]
    InvalidGeometry { width: u32, height: u32, dpr: f64 },

    #[error("Time value out of range: {0} seconds")]
    OutOfRange(i64),
}

/// Result type for TEMPO operations
pub type TempoResult<T> = Result<T, TempoError>;
