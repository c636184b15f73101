//! Error types for rotalock

use thiserror::Error;

/// Result type alias for lock operations
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors surfaced to callers.
///
/// Bad angle input is never an error: it is dropped inside the evaluator.
/// Only configuration problems fail hard.
#[derive(Debug, Error)]
pub enum LockError {
    /// Password does not have the configured number of slots
    #[error("Password has {actual} colors, expected {expected}")]
    SequenceLengthMismatch { expected: usize, actual: usize },

    /// Color name outside the fixed set
    #[error("Unknown color: {0}")]
    UnknownColor(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Replay script error
    #[error("Replay script line {line}: {message}")]
    Script { line: usize, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
