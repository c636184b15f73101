//! Rotary lock evaluator: dwell-confirmed color sequence with a verdict
//!
//! State transitions:
//! - IDLE → DWELLING: angle lands in a quadrant
//! - DWELLING → DWELLING: angle moves to a different quadrant (timer restarts)
//! - DWELLING → IDLE: dwell timer fires, color appended
//! - IDLE → VERDICT: sequence full, outcome emitted
//! - VERDICT → IDLE: cool-down elapsed, sequence cleared
//!
//! Timers fire at their deadlines, not at the moment `tick` notices them.
//! A late tick therefore produces the same outcome timestamps and the same
//! cool-down end as a punctual one.

use tracing::{debug, info, trace, warn};

use crate::config::LockConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::core::sink::OutcomeSink;
use crate::core::timer::TimerSlot;
use crate::error::{LockError, Result};
use crate::types::{
    format_sequence, normalize_angle, quadrant_of, AuthOutcome, AuthStatus, Color, LockState,
    PasswordSequence, ReasonCode, StateOutput,
};

/// Rotary color-sequence lock
pub struct RotaryLockEvaluator<C: Clock = SystemClock> {
    /// Dwell duration (milliseconds)
    dwell_ms: u64,
    /// Verdict hold time (milliseconds)
    cooldown_ms: u64,
    /// Password slots
    sequence_length: usize,
    /// Password for the current attempt
    password: PasswordSequence,
    /// Password waiting for the next reset
    staged_password: Option<PasswordSequence>,
    clock: C,
    sink: Box<dyn OutcomeSink>,
    /// Current state
    state: LockState,
    /// Colors confirmed so far
    confirmed: Vec<Color>,
    /// Quadrant shown on the dial
    highlighted: Option<Color>,
    dwell: TimerSlot<Color>,
    cooldown: TimerSlot<AuthStatus>,
    last_reason: ReasonCode,
    /// Completed attempts
    attempts: u64,
    /// Updates dropped as malformed or during cool-down
    dropped_inputs: u64,
}

impl<C: Clock> std::fmt::Debug for RotaryLockEvaluator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotaryLockEvaluator")
            .field("state", &self.state)
            .field("confirmed", &self.confirmed)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl<C: Clock> RotaryLockEvaluator<C> {
    /// Create an evaluator. Fails if the timing settings are invalid or the
    /// password length differs from `sequence_length`.
    pub fn new(
        config: &LockConfig,
        password: PasswordSequence,
        clock: C,
        sink: Box<dyn OutcomeSink>,
    ) -> Result<Self> {
        if config.dwell_duration_ms == 0 {
            return Err(LockError::Config("dwell_duration_ms must be > 0".into()));
        }
        if password.len() != config.sequence_length {
            return Err(LockError::SequenceLengthMismatch {
                expected: config.sequence_length,
                actual: password.len(),
            });
        }
        if password.is_empty() {
            return Err(LockError::Config("sequence_length must be > 0".into()));
        }

        Ok(Self {
            dwell_ms: config.dwell_duration_ms,
            cooldown_ms: config.cooldown_ms,
            sequence_length: config.sequence_length,
            password,
            staged_password: None,
            clock,
            sink,
            state: LockState::Idle,
            confirmed: Vec::with_capacity(config.sequence_length),
            highlighted: None,
            dwell: TimerSlot::new(),
            cooldown: TimerSlot::new(),
            last_reason: ReasonCode::R001_READY,
            attempts: 0,
            dropped_inputs: 0,
        })
    }

    /// Create an evaluator using the password stored in `config`
    pub fn from_config(config: &LockConfig, clock: C, sink: Box<dyn OutcomeSink>) -> Result<Self> {
        let password = config.password_sequence()?;
        Self::new(config, password, clock, sink)
    }

    /// Feed one angle reading. Never fails: bad input is dropped.
    pub fn on_angle_update(&mut self, angle: f64) {
        self.tick();

        let Some(normalized) = normalize_angle(angle) else {
            self.dropped_inputs += 1;
            self.last_reason = ReasonCode::R004_INPUT_REJECTED;
            debug!(angle, "dropping non-finite angle");
            return;
        };

        if self.state.is_verdict() {
            self.dropped_inputs += 1;
            self.last_reason = ReasonCode::R004_INPUT_IGNORED_COOLDOWN;
            trace!(angle = normalized, "ignoring angle during cool-down");
            return;
        }

        match quadrant_of(normalized) {
            None => {
                self.dwell.cancel();
                self.state = LockState::Idle;
                self.highlighted = None;
                self.last_reason = ReasonCode::R001_QUADRANT_CLEARED;
            }
            Some(color) if self.state.dwelling_color() == Some(color) => {
                self.last_reason = ReasonCode::R001_DWELL_CONTINUED;
            }
            Some(color) => {
                let deadline_ms = self.clock.now_ms().saturating_add(self.dwell_ms);
                self.dwell.schedule(color, deadline_ms);
                self.state = LockState::Dwelling { color, deadline_ms };
                self.highlighted = Some(color);
                self.last_reason = ReasonCode::R001_DWELL_STARTED;
                debug!(%color, deadline_ms, "dwell started");
            }
        }
    }

    /// Fire every timer whose deadline has passed
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        loop {
            if let Some((color, at)) = self.dwell.take_due(now) {
                self.confirm(color, at);
                continue;
            }
            if let Some((status, at)) = self.cooldown.take_due(now) {
                debug!(%status, at, "cool-down finished");
                self.reset();
                continue;
            }
            break;
        }
    }

    /// Clear the attempt and cancel all timers. Idempotent.
    pub fn reset(&mut self) {
        self.confirmed.clear();
        self.dwell.cancel();
        self.cooldown.cancel();
        self.state = LockState::Idle;
        self.highlighted = None;
        self.last_reason = ReasonCode::R005_RESET;

        if let Some(password) = self.staged_password.take() {
            info!("applying staged password");
            self.password = password;
        }
    }

    /// Replace the password. Applied now if no attempt is under way,
    /// otherwise held until the next reset.
    pub fn configure_password(&mut self, password: PasswordSequence) -> Result<()> {
        if password.len() != self.sequence_length {
            return Err(LockError::SequenceLengthMismatch {
                expected: self.sequence_length,
                actual: password.len(),
            });
        }

        if self.attempt_in_progress() {
            info!("attempt in progress, staging new password");
            self.staged_password = Some(password);
        } else {
            info!("password updated");
            self.password = password;
            self.staged_password = None;
        }
        Ok(())
    }

    /// Append a confirmed color and judge the sequence when full
    fn confirm(&mut self, color: Color, at: u64) {
        self.confirmed.push(color);
        self.state = LockState::Idle;
        self.last_reason = ReasonCode::R002_COLOR_CONFIRMED;
        info!(
            %color,
            position = self.confirmed.len(),
            of = self.sequence_length,
            "color confirmed"
        );

        if self.confirmed.len() == self.sequence_length {
            self.judge(at);
        }
    }

    /// Compare against the password and emit exactly one outcome
    fn judge(&mut self, at: u64) {
        let status = if self.password.matches(&self.confirmed) {
            AuthStatus::Success
        } else {
            AuthStatus::Failure
        };
        self.attempts += 1;

        let outcome = AuthOutcome::new(self.clock.wall_time_at(at), status, self.confirmed.clone());
        match status {
            AuthStatus::Success => {
                info!(sequence = %format_sequence(&self.confirmed), "ROTARY - SUCCESS")
            }
            AuthStatus::Failure => {
                warn!(sequence = %format_sequence(&self.confirmed), "ROTARY - FAILURE")
            }
        }
        self.sink.record(&outcome);

        let until_ms = at.saturating_add(self.cooldown_ms);
        self.cooldown.schedule(status, until_ms);
        self.state = LockState::Verdict { status, until_ms };
        self.highlighted = None;
        self.last_reason = match status {
            AuthStatus::Success => ReasonCode::R003_VERDICT_SUCCESS,
            AuthStatus::Failure => ReasonCode::R003_VERDICT_FAILURE,
        };
    }

    fn attempt_in_progress(&self) -> bool {
        !self.confirmed.is_empty() || self.state.is_verdict()
    }

    /// Get current state
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Colors confirmed in this attempt
    pub fn confirmed_sequence(&self) -> &[Color] {
        &self.confirmed
    }

    /// Password for the current attempt
    pub fn password(&self) -> &PasswordSequence {
        &self.password
    }

    /// Password waiting for the next reset
    pub fn staged_password(&self) -> Option<&PasswordSequence> {
        self.staged_password.as_ref()
    }

    pub fn dwell_duration_ms(&self) -> u64 {
        self.dwell_ms
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Completed attempts since start
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Updates dropped since start
    pub fn dropped_inputs(&self) -> u64 {
        self.dropped_inputs
    }

    /// Get current output without updating
    pub fn current_output(&self) -> StateOutput {
        let dwell_progress = match self.state {
            LockState::Dwelling { deadline_ms, .. } => {
                let remaining = deadline_ms.saturating_sub(self.clock.now_ms());
                (1.0 - remaining as f64 / self.dwell_ms as f64).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };

        StateOutput {
            state: self.state,
            highlighted: self.highlighted,
            confirmed: self.confirmed.clone(),
            sequence_length: self.sequence_length,
            dwell_progress,
            reason: self.last_reason,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::sink::MemorySink;
    use crate::{COOLDOWN_MS, DWELL_DURATION_MS};
    use pretty_assertions::assert_eq;

    use Color::*;

    fn setup() -> (RotaryLockEvaluator<ManualClock>, ManualClock, MemorySink) {
        let clock = ManualClock::new();
        let sink = MemorySink::new();
        let engine = RotaryLockEvaluator::from_config(
            &LockConfig::default(),
            clock.clone(),
            Box::new(sink.clone()),
        )
        .unwrap();
        (engine, clock, sink)
    }

    /// Point at `color`, wait `ms`, then let timers fire
    fn hold(engine: &mut RotaryLockEvaluator<ManualClock>, clock: &ManualClock, color: Color, ms: u64) {
        engine.on_angle_update(color.center());
        clock.advance(ms);
        engine.tick();
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (engine, _, _) = setup();
        assert_eq!(engine.state(), LockState::Idle);
        assert!(engine.confirmed_sequence().is_empty());
    }

    #[test]
    fn test_dwell_confirms_exactly_once() {
        let (mut engine, clock, _) = setup();
        hold(&mut engine, &clock, Red, DWELL_DURATION_MS);
        assert_eq!(engine.confirmed_sequence(), &[Red]);
        assert_eq!(engine.state(), LockState::Idle);

        // No further confirmation without a new angle update
        clock.advance(DWELL_DURATION_MS * 3);
        engine.tick();
        assert_eq!(engine.confirmed_sequence(), &[Red]);
    }

    #[test]
    fn test_dwell_one_ms_short_confirms_nothing() {
        let (mut engine, clock, _) = setup();
        hold(&mut engine, &clock, Red, DWELL_DURATION_MS - 1);
        assert!(engine.confirmed_sequence().is_empty());
        assert_eq!(engine.state().dwelling_color(), Some(Red));
    }

    #[test]
    fn test_interruption_restarts_dwell() {
        let (mut engine, clock, _) = setup();
        hold(&mut engine, &clock, Red, DWELL_DURATION_MS - 1);
        hold(&mut engine, &clock, Blue, DWELL_DURATION_MS - 1);
        hold(&mut engine, &clock, Red, DWELL_DURATION_MS - 1);
        assert!(engine.confirmed_sequence().is_empty());
    }

    #[test]
    fn test_same_quadrant_does_not_extend_dwell() {
        let (mut engine, clock, _) = setup();
        engine.on_angle_update(5.0);
        clock.advance(2000);
        engine.on_angle_update(20.0);
        engine.on_angle_update(340.0);
        assert_eq!(engine.current_output().reason, ReasonCode::R001_DWELL_CONTINUED);
        clock.advance(1000);
        engine.tick();
        assert_eq!(engine.confirmed_sequence(), &[Red]);
    }

    #[test]
    fn test_late_update_fires_expired_timer_first() {
        let (mut engine, clock, _) = setup();
        engine.on_angle_update(Red.center());
        clock.advance(5000);
        engine.on_angle_update(Blue.center());
        assert_eq!(engine.confirmed_sequence(), &[Red]);
        assert_eq!(engine.state().dwelling_color(), Some(Blue));
    }

    #[test]
    fn test_full_sequence_success() {
        let (mut engine, clock, sink) = setup();
        for color in [Red, Blue, Green, Yellow] {
            hold(&mut engine, &clock, color, DWELL_DURATION_MS);
        }

        let outcomes = sink.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, AuthStatus::Success);
        assert_eq!(outcomes[0].confirmed_sequence, vec![Red, Blue, Green, Yellow]);
        assert_eq!(outcomes[0].method, "Rotary Lock");
        assert_eq!(outcomes[0].timestamp.timestamp_millis(), 12_000);
        assert!(matches!(
            engine.state(),
            LockState::Verdict { status: AuthStatus::Success, until_ms: 14_000 }
        ));
        assert_eq!(engine.attempts(), 1);
    }

    #[test]
    fn test_mismatch_emits_single_failure() {
        let (mut engine, clock, sink) = setup();
        for color in [Red, Blue, Yellow, Yellow] {
            hold(&mut engine, &clock, color, DWELL_DURATION_MS);
        }

        let outcomes = sink.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, AuthStatus::Failure);
        assert_eq!(outcomes[0].confirmed_sequence, vec![Red, Blue, Yellow, Yellow]);
    }

    #[test]
    fn test_cooldown_drops_input_then_resets() {
        let (mut engine, clock, sink) = setup();
        for color in [Red, Blue, Green, Yellow] {
            hold(&mut engine, &clock, color, DWELL_DURATION_MS);
        }

        // Held during cool-down: dropped, no new dwell
        engine.on_angle_update(Purple.center());
        assert!(engine.state().is_verdict());
        assert_eq!(engine.dropped_inputs(), 1);
        assert_eq!(
            engine.current_output().reason,
            ReasonCode::R004_INPUT_IGNORED_COOLDOWN
        );

        clock.advance(COOLDOWN_MS - 1);
        engine.tick();
        assert!(engine.state().is_verdict());

        clock.advance(1);
        engine.tick();
        assert_eq!(engine.state(), LockState::Idle);
        assert!(engine.confirmed_sequence().is_empty());

        // The dropped angle was not replayed
        clock.advance(DWELL_DURATION_MS);
        engine.tick();
        assert!(engine.confirmed_sequence().is_empty());

        // Fresh attempt accumulates from zero
        hold(&mut engine, &clock, Orange, DWELL_DURATION_MS);
        assert_eq!(engine.confirmed_sequence(), &[Orange]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_late_tick_measures_cooldown_from_verdict() {
        let (mut engine, clock, sink) = setup();
        for color in [Red, Blue, Green] {
            hold(&mut engine, &clock, color, DWELL_DURATION_MS);
        }
        engine.on_angle_update(Yellow.center());
        // Dwell due at 12000, cool-down ends at 14000
        clock.advance(DWELL_DURATION_MS + COOLDOWN_MS + 500);
        engine.tick();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.outcomes()[0].timestamp.timestamp_millis(), 12_000);
        assert_eq!(engine.state(), LockState::Idle);
        assert!(engine.confirmed_sequence().is_empty());
    }

    #[test]
    fn test_zero_cooldown_resets_in_same_tick() {
        let clock = ManualClock::new();
        let sink = MemorySink::new();
        let config = LockConfig {
            cooldown_ms: 0,
            ..LockConfig::default()
        };
        let mut engine =
            RotaryLockEvaluator::from_config(&config, clock.clone(), Box::new(sink.clone()))
                .unwrap();
        for color in [Red, Blue, Green, Yellow] {
            hold(&mut engine, &clock, color, DWELL_DURATION_MS);
        }

        assert_eq!(sink.len(), 1);
        assert_eq!(engine.state(), LockState::Idle);
        assert!(engine.confirmed_sequence().is_empty());
    }

    #[test]
    fn test_deadlines_saturate_near_end_of_time() {
        let (mut engine, clock, sink) = setup();
        clock.set(u64::MAX - 10_000);
        for color in [Red, Blue, Green] {
            hold(&mut engine, &clock, color, DWELL_DURATION_MS);
        }
        engine.on_angle_update(Yellow.center());
        assert!(matches!(
            engine.state(),
            LockState::Dwelling { color: Yellow, deadline_ms: u64::MAX }
        ));

        clock.set(u64::MAX);
        engine.tick();

        let outcomes = sink.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, AuthStatus::Success);
        // Cool-down end pins to the same instant, so reset follows at once
        assert_eq!(engine.state(), LockState::Idle);
    }

    #[test]
    fn test_non_finite_angle_is_dropped() {
        let (mut engine, clock, _) = setup();
        engine.on_angle_update(Red.center());
        clock.advance(1000);
        engine.on_angle_update(f64::NAN);
        engine.on_angle_update(f64::INFINITY);

        assert_eq!(engine.state().dwelling_color(), Some(Red));
        assert_eq!(engine.dropped_inputs(), 2);

        clock.advance(2000);
        engine.tick();
        assert_eq!(engine.confirmed_sequence(), &[Red]);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (mut engine, clock, _) = setup();
        hold(&mut engine, &clock, Red, DWELL_DURATION_MS);
        engine.on_angle_update(Blue.center());

        engine.reset();
        engine.reset();
        assert_eq!(engine.state(), LockState::Idle);
        assert!(engine.confirmed_sequence().is_empty());

        // Cancelled dwell never fires
        clock.advance(DWELL_DURATION_MS);
        engine.tick();
        assert!(engine.confirmed_sequence().is_empty());
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let password = PasswordSequence::new(vec![Red, Blue, Green], 3).unwrap();
        let err = RotaryLockEvaluator::new(
            &LockConfig::default(),
            password,
            ManualClock::new(),
            Box::new(MemorySink::new()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LockError::SequenceLengthMismatch { expected: 4, actual: 3 }
        ));
    }

    #[test]
    fn test_password_change_is_staged_during_attempt() {
        let (mut engine, clock, sink) = setup();
        hold(&mut engine, &clock, Purple, DWELL_DURATION_MS);

        let new_pw = PasswordSequence::new(vec![Purple, Purple, Purple, Purple], 4).unwrap();
        engine.configure_password(new_pw.clone()).unwrap();
        assert_eq!(engine.staged_password(), Some(&new_pw));

        for _ in 0..3 {
            hold(&mut engine, &clock, Purple, DWELL_DURATION_MS);
        }
        // Judged against the old password
        assert_eq!(sink.outcomes()[0].status, AuthStatus::Failure);

        clock.advance(COOLDOWN_MS);
        engine.tick();
        assert_eq!(engine.password(), &new_pw);
        assert!(engine.staged_password().is_none());
    }

    #[test]
    fn test_password_change_applies_immediately_when_idle() {
        let (mut engine, _, _) = setup();
        let new_pw = PasswordSequence::new(vec![Orange, Red, Orange, Red], 4).unwrap();
        engine.configure_password(new_pw.clone()).unwrap();
        assert_eq!(engine.password(), &new_pw);

        let short = PasswordSequence::new(vec![Red], 1).unwrap();
        assert!(engine.configure_password(short).is_err());
        assert_eq!(engine.password(), &new_pw);
    }

    #[test]
    fn test_dwell_progress_hint() {
        let (mut engine, clock, _) = setup();
        engine.on_angle_update(Green.center());
        clock.advance(1500);
        let output = engine.current_output();
        assert_eq!(output.highlighted, Some(Green));
        assert!((output.dwell_progress - 0.5).abs() < 1e-9);
    }
}
