//! Rotalock: rotary color-sequence lock evaluator
//!
//! Sensor angle → quadrant color → dwell confirmation → sequence verdict

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::LockConfig;
pub use error::{LockError, Result};

// =============================================================================
// TIMING
// =============================================================================

/// How long the pointer must stay in one quadrant before its color counts
pub const DWELL_DURATION_MS: u64 = 3000;

/// How long a verdict is shown before the evaluator resets
pub const COOLDOWN_MS: u64 = 2000;

/// Background tick period for the server driver
pub const TICK_INTERVAL_MS: u64 = 50;

// =============================================================================
// SEQUENCE
// =============================================================================

/// Number of password slots
pub const DEFAULT_SEQUENCE_LENGTH: usize = 4;

/// Method label carried by every outcome event
pub const AUTH_METHOD: &str = "Rotary Lock";

// =============================================================================
// SENSOR [C] - Pico firmware values
// =============================================================================

/// Moving-average window for raw ADC readings
pub const ADC_BUFFER_SIZE: usize = 10;

/// Minimum change in degrees before a new angle is reported
pub const ANGLE_REPORT_THRESHOLD: u32 = 5;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
