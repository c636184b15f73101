//! Outcome sinks and the authentication log
//!
//! Sinks are fire-and-forget: the evaluator never waits on them and never
//! sees a failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::types::{format_sequence, AuthOutcome, AuthStatus, Color};

/// Receives one event per completed attempt
pub trait OutcomeSink: Send {
    fn record(&self, outcome: &AuthOutcome);
}

/// Collects outcomes in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    outcomes: Arc<Mutex<Vec<AuthOutcome>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn outcomes(&self) -> Vec<AuthOutcome> {
        self.outcomes
            .lock()
            .map(|o| o.clone())
            .unwrap_or_default()
    }

    /// Take everything recorded since the last drain
    pub fn drain(&self) -> Vec<AuthOutcome> {
        self.outcomes
            .lock()
            .map(|mut o| std::mem::take(&mut *o))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutcomeSink for MemorySink {
    fn record(&self, outcome: &AuthOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(outcome.clone());
        }
    }
}

/// One row of the dashboard's authentication log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthLogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub location: String,
    pub status: AuthStatus,
    pub details: String,
    pub method: String,
    pub confirmed_sequence: Vec<Color>,
}

/// Append-only authentication log with running counters
#[derive(Debug, Clone, Default)]
pub struct AuthLog {
    location: String,
    entries: Vec<AuthLogEntry>,
    success_count: usize,
    failure_count: usize,
}

impl AuthLog {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    /// Append an entry for `outcome`, returning it
    pub fn append(&mut self, outcome: &AuthOutcome) -> AuthLogEntry {
        let (user, details) = match outcome.status {
            AuthStatus::Success => {
                self.success_count += 1;
                ("User", "Pattern recognized correctly".to_string())
            }
            AuthStatus::Failure => {
                self.failure_count += 1;
                (
                    "Unknown",
                    format!(
                        "Incorrect pattern: {}",
                        format_sequence(&outcome.confirmed_sequence)
                    ),
                )
            }
        };

        let entry = AuthLogEntry {
            id: self.entries.len() as u64 + 1,
            timestamp: outcome.timestamp,
            user: user.to_string(),
            location: self.location.clone(),
            status: outcome.status,
            details,
            method: outcome.method.clone(),
            confirmed_sequence: outcome.confirmed_sequence.clone(),
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[AuthLogEntry] {
        &self.entries
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }
}

/// Counters pushed to dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub state: String,
    pub sensor_connected: bool,
    pub auth_success_count: usize,
    pub auth_failure_count: usize,
}

/// Messages pushed over the live channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    AuthEvent(AuthLogEntry),
    StatusUpdate(StatusUpdate),
}

/// Appends to a shared log and publishes a live event
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    log: Arc<Mutex<AuthLog>>,
    tx: broadcast::Sender<LiveEvent>,
}

impl BroadcastSink {
    pub fn new(log: Arc<Mutex<AuthLog>>, tx: broadcast::Sender<LiveEvent>) -> Self {
        Self { log, tx }
    }
}

impl OutcomeSink for BroadcastSink {
    fn record(&self, outcome: &AuthOutcome) {
        let entry = match self.log.lock() {
            Ok(mut log) => log.append(outcome),
            Err(_) => {
                warn!("auth log poisoned, outcome dropped");
                return;
            }
        };
        if self.tx.send(LiveEvent::AuthEvent(entry)).is_err() {
            debug!("no live subscribers for auth event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: AuthStatus) -> AuthOutcome {
        AuthOutcome::new(
            DateTime::<Utc>::UNIX_EPOCH,
            status,
            vec![Color::Red, Color::Blue, Color::Yellow, Color::Yellow],
        )
    }

    #[test]
    fn test_memory_sink_drain_takes_each_outcome_once() {
        let sink = MemorySink::new();
        let writer = sink.clone();
        writer.record(&outcome(AuthStatus::Failure));
        writer.record(&outcome(AuthStatus::Success));

        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].status, AuthStatus::Success);
        assert!(sink.is_empty());
        assert!(sink.drain().is_empty());

        writer.record(&outcome(AuthStatus::Failure));
        assert_eq!(sink.drain().len(), 1);
    }

    #[test]
    fn test_auth_log_ids_and_counts() {
        let mut log = AuthLog::new("Main Entrance");
        let first = log.append(&outcome(AuthStatus::Success));
        let second = log.append(&outcome(AuthStatus::Failure));

        assert_eq!(first.id, 1);
        assert_eq!(first.user, "User");
        assert_eq!(first.details, "Pattern recognized correctly");
        assert_eq!(second.id, 2);
        assert_eq!(second.user, "Unknown");
        assert_eq!(second.details, "Incorrect pattern: red, blue, yellow, yellow");
        assert_eq!(log.success_count(), 1);
        assert_eq!(log.failure_count(), 1);
        assert_eq!(log.entries().len(), 2);
    }

    #[test]
    fn test_broadcast_sink_without_subscribers_still_logs() {
        let log = Arc::new(Mutex::new(AuthLog::new("Lab")));
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        let sink = BroadcastSink::new(log.clone(), tx);

        sink.record(&outcome(AuthStatus::Failure));

        let log = log.lock().unwrap();
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].location, "Lab");
    }

    #[test]
    fn test_broadcast_sink_publishes() {
        let log = Arc::new(Mutex::new(AuthLog::new("Lab")));
        let (tx, mut rx) = broadcast::channel(4);
        let sink = BroadcastSink::new(log, tx);

        sink.record(&outcome(AuthStatus::Success));

        match rx.try_recv().unwrap() {
            LiveEvent::AuthEvent(entry) => assert_eq!(entry.status, AuthStatus::Success),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_live_event_wire_shape() {
        let event = LiveEvent::StatusUpdate(StatusUpdate {
            state: "IDLE".into(),
            sensor_connected: true,
            auth_success_count: 2,
            auth_failure_count: 1,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "status_update");
        assert_eq!(json["data"]["auth_success_count"], 2);
    }
}
