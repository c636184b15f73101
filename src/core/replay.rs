//! Deterministic replay of timestamped angle scripts
//!
//! Script format, one step per line:
//!
//! ```text
//! # t_ms angle
//! 0     10
//! 3000  60
//! ```

use serde::Serialize;
use tracing::debug;

use crate::config::LockConfig;
use crate::core::clock::{Clock, ManualClock};
use crate::core::evaluator::RotaryLockEvaluator;
use crate::core::sink::MemorySink;
use crate::error::{LockError, Result};
use crate::types::{AuthOutcome, PasswordSequence, StateOutput};

/// One scripted angle reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayStep {
    pub at_ms: u64,
    pub angle: f64,
}

/// Result of running a script
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub outcomes: Vec<AuthOutcome>,
    pub final_state: StateOutput,
    pub end_ms: u64,
    pub dropped_inputs: u64,
}

/// Parse `<t_ms> <angle>` lines. Timestamps must not go backwards.
pub fn parse_script(script: &str) -> Result<Vec<ReplayStep>> {
    let mut steps = Vec::new();
    let mut last_ms = 0;

    for (idx, raw) in script.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let err = |message: &str| LockError::Script {
            line: line_no,
            message: message.to_string(),
        };

        let mut parts = line.split_whitespace();
        let (Some(t), Some(a), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(err("expected `<t_ms> <angle>`"));
        };
        let at_ms: u64 = t.parse().map_err(|_| err("bad timestamp"))?;
        // Non-finite angles are kept: the evaluator drops them itself
        let angle: f64 = a.parse().map_err(|_| err("bad angle"))?;

        if at_ms < last_ms {
            return Err(err("timestamp goes backwards"));
        }
        last_ms = at_ms;
        steps.push(ReplayStep { at_ms, angle });
    }

    Ok(steps)
}

/// Drive a fresh evaluator through `steps`, then let `tail_ms` more elapse
pub fn run_script(
    config: &LockConfig,
    password: PasswordSequence,
    steps: &[ReplayStep],
    tail_ms: u64,
) -> Result<ReplayReport> {
    let clock = ManualClock::new();
    let sink = MemorySink::new();
    let mut engine = RotaryLockEvaluator::new(config, password, clock.clone(), Box::new(sink.clone()))?;

    for step in steps {
        clock.set(step.at_ms);
        engine.on_angle_update(step.angle);
        debug!(at_ms = step.at_ms, angle = step.angle, state = %engine.state(), "replayed");
    }

    let end_ms = steps.last().map(|s| s.at_ms).unwrap_or(0).saturating_add(tail_ms);
    clock.set(end_ms);
    engine.tick();

    Ok(ReplayReport {
        outcomes: sink.outcomes(),
        final_state: engine.current_output(),
        end_ms: clock.now_ms(),
        dropped_inputs: engine.dropped_inputs(),
    })
}
