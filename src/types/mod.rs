//! Core types for rotalock

mod color;
mod outcome;
mod output;
mod password;
mod reason;
mod state;

pub use color::{format_sequence, normalize_angle, quadrant_of, Color};
pub use outcome::{AuthOutcome, AuthStatus};
pub use output::StateOutput;
pub use password::PasswordSequence;
pub use reason::ReasonCode;
pub use state::LockState;
