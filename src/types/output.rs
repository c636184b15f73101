//! Output structures for terminal display and UI hints

use serde::{Deserialize, Serialize};

use crate::types::{format_sequence, Color, LockState, ReasonCode};

/// Presentation snapshot of the evaluator. Not part of the verdict contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateOutput {
    /// Current state
    pub state: LockState,
    /// Quadrant to highlight on the dial
    pub highlighted: Option<Color>,
    /// Colors confirmed so far in this attempt
    pub confirmed: Vec<Color>,
    /// Slots in the password
    pub sequence_length: usize,
    /// Fraction of the dwell elapsed, 0.0 when not dwelling
    pub dwell_progress: f64,
    /// Reason for current state
    pub reason: ReasonCode,
}

impl StateOutput {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.state.color_code();
        let reset = LockState::color_reset();
        let emoji = self.state.emoji();

        format!(
            "{}{} state={} | quadrant={} | {}/{} [{}] | dwell={:.0}% | {}{}",
            color,
            emoji,
            self.state,
            self.highlighted.map(|c| c.name()).unwrap_or("-"),
            self.confirmed.len(),
            self.sequence_length,
            format_sequence(&self.confirmed),
            self.dwell_progress * 100.0,
            self.reason.code(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "state={} | quadrant={} | confirmed={}/{} | dwell={:.2} | reason={}",
            self.state,
            self.highlighted.map(|c| c.name()).unwrap_or("-"),
            self.confirmed.len(),
            self.sequence_length,
            self.dwell_progress,
            self.reason.code()
        )
    }
}
