//! Lock state definitions

use serde::{Deserialize, Serialize};

use crate::types::{AuthStatus, Color};

/// The three phases of a rotary lock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    /// No active dwell; the sequence may be partially filled
    Idle,
    /// Pointer has stayed in `color`'s arc since the dwell timer started
    Dwelling { color: Color, deadline_ms: u64 },
    /// Attempt finished; input is dropped until `until_ms`
    Verdict { status: AuthStatus, until_ms: u64 },
}

impl LockState {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            LockState::Idle => "\x1b[90m",
            LockState::Dwelling { color, .. } => color.ansi_code(),
            LockState::Verdict { status: AuthStatus::Success, .. } => "\x1b[32m",
            LockState::Verdict { status: AuthStatus::Failure, .. } => "\x1b[31m",
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for state
    pub fn emoji(&self) -> &'static str {
        match self {
            LockState::Idle => "⏳",
            LockState::Dwelling { .. } => "🔶",
            LockState::Verdict { status: AuthStatus::Success, .. } => "🔓",
            LockState::Verdict { status: AuthStatus::Failure, .. } => "🔒",
        }
    }

    /// Color currently being dwelt on, if any
    pub fn dwelling_color(&self) -> Option<Color> {
        match self {
            LockState::Dwelling { color, .. } => Some(*color),
            _ => None,
        }
    }

    pub fn is_verdict(&self) -> bool {
        matches!(self, LockState::Verdict { .. })
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LockState::Idle => "IDLE",
            LockState::Dwelling { .. } => "DWELLING",
            LockState::Verdict { .. } => "VERDICT",
        };
        write!(f, "{}", name)
    }
}
