//! Error types for the readiness gate.
//!
//! This module defines [`GateError`], the error type for everything that can
//! stop the gate before hand-off, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Probe failures never surface here: they are [`ProbeError`]s and are
//!   retried inside [`wait_until_ready`]
//! - `GateError` covers setup problems and the final hand-off
//! - Use `anyhow::Error` (via `GateError::Other`) for unexpected errors
//!
//! [`ProbeError`]: crate::probe::ProbeError
//! [`wait_until_ready`]: crate::wait::wait_until_ready

use thiserror::Error;

/// Core error type for gate operations.
#[derive(Debug, Error)]
pub enum GateError {
    /// The database driver state could not be prepared.
    #[error("Failed to initialize database driver: {message}")]
    DatabaseSetup { message: String },

    /// The target command could not replace the gate process.
    #[error("Failed to execute '{command}': {source}")]
    HandOff {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The target command was spawned but terminated without an exit code.
    #[error("Command '{command}' was terminated by a signal")]
    TerminatedBySignal { command: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
