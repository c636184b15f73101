//! Authentication outcome events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{format_sequence, Color};
use crate::AUTH_METHOD;

/// Verdict of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Success,
    Failure,
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStatus::Success => write!(f, "success"),
            AuthStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Emitted exactly once per completed attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutcome {
    pub timestamp: DateTime<Utc>,
    pub status: AuthStatus,
    pub confirmed_sequence: Vec<Color>,
    pub method: String,
}

impl AuthOutcome {
    pub fn new(timestamp: DateTime<Utc>, status: AuthStatus, confirmed_sequence: Vec<Color>) -> Self {
        Self {
            timestamp,
            status,
            confirmed_sequence,
            method: AUTH_METHOD.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AuthStatus::Success
    }

    /// One-line summary for logs and the terminal
    pub fn summary(&self) -> String {
        format!(
            "{} {} [{}]",
            self.timestamp.to_rfc3339(),
            self.status.to_string().to_uppercase(),
            format_sequence(&self.confirmed_sequence)
        )
    }
}
