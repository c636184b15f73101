//! Reason codes for evaluator steps

use serde::{Deserialize, Serialize};

/// Why the evaluator is in its current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R001: Dwell
    // =========================================================================
    /// Fresh evaluator or just reset
    R001_READY,
    /// Pointer entered a quadrant, dwell timer started
    R001_DWELL_STARTED,
    /// Same quadrant reported again, timer untouched
    R001_DWELL_CONTINUED,
    /// Pointer left every arc, dwell cancelled
    R001_QUADRANT_CLEARED,

    // =========================================================================
    // R002: Sequence
    // =========================================================================
    /// Dwell timer fired, color appended
    R002_COLOR_CONFIRMED,

    // =========================================================================
    // R003: Verdict
    // =========================================================================
    /// Sequence matched the password
    R003_VERDICT_SUCCESS,
    /// Sequence did not match the password
    R003_VERDICT_FAILURE,

    // =========================================================================
    // R004: Input handling
    // =========================================================================
    /// Non-finite angle dropped at the boundary
    R004_INPUT_REJECTED,
    /// Angle arrived during cool-down and was dropped
    R004_INPUT_IGNORED_COOLDOWN,

    // =========================================================================
    // R005: Lifecycle
    // =========================================================================
    /// Evaluator returned to its initial state
    R005_RESET,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R001_READY => "R001_READY",
            Self::R001_DWELL_STARTED => "R001_DWELL_STARTED",
            Self::R001_DWELL_CONTINUED => "R001_DWELL_CONTINUED",
            Self::R001_QUADRANT_CLEARED => "R001_QUADRANT_CLEARED",
            Self::R002_COLOR_CONFIRMED => "R002_COLOR_CONFIRMED",
            Self::R003_VERDICT_SUCCESS => "R003_VERDICT_SUCCESS",
            Self::R003_VERDICT_FAILURE => "R003_VERDICT_FAILURE",
            Self::R004_INPUT_REJECTED => "R004_INPUT_REJECTED",
            Self::R004_INPUT_IGNORED_COOLDOWN => "R004_INPUT_IGNORED_COOLDOWN",
            Self::R005_RESET => "R005_RESET",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R001_READY => "Ready for input",
            Self::R001_DWELL_STARTED => "Holding on quadrant",
            Self::R001_DWELL_CONTINUED => "Still holding",
            Self::R001_QUADRANT_CLEARED => "No quadrant selected",
            Self::R002_COLOR_CONFIRMED => "Color confirmed",
            Self::R003_VERDICT_SUCCESS => "Access granted",
            Self::R003_VERDICT_FAILURE => "Access denied",
            Self::R004_INPUT_REJECTED => "Malformed angle dropped",
            Self::R004_INPUT_IGNORED_COOLDOWN => "Input ignored during cool-down",
            Self::R005_RESET => "Reset for next attempt",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
