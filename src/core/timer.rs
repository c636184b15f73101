//! Single-slot cancelable timer

/// Holds at most one pending deadline.
///
/// Scheduling replaces whatever was pending, so two timers from the same
/// slot can never both fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSlot<K> {
    pending: Option<(K, u64)>,
}

impl<K> Default for TimerSlot<K> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<K: Copy> TimerSlot<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot, cancelling any pending timer
    pub fn schedule(&mut self, kind: K, deadline_ms: u64) {
        self.pending = Some((kind, deadline_ms));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.pending.map(|(_, d)| d)
    }

    /// Remove and return the timer if it is due at `now_ms`
    pub fn take_due(&mut self, now_ms: u64) -> Option<(K, u64)> {
        match self.pending {
            Some((kind, deadline)) if deadline <= now_ms => {
                self.pending = None;
                Some((kind, deadline))
            }
            _ => None,
        }
    }
}
