//! Lock configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LockError, Result};
use crate::types::{Color, PasswordSequence};
use crate::{COOLDOWN_MS, DEFAULT_SEQUENCE_LENGTH, DWELL_DURATION_MS, TICK_INTERVAL_MS};

/// Evaluator and server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Time the pointer must stay in one quadrant (milliseconds)
    pub dwell_duration_ms: u64,

    /// Time a verdict is held before reset (milliseconds). Zero resets at once.
    pub cooldown_ms: u64,

    /// Number of password slots
    pub sequence_length: usize,

    /// Stored password; stand-in for a real secret store
    pub password: Vec<Color>,

    /// HTTP server settings
    pub server: ServerConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,

    /// Location label written into auth log entries
    pub location: String,

    /// How often the background task fires due timers (milliseconds)
    pub tick_interval_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            dwell_duration_ms: DWELL_DURATION_MS,
            cooldown_ms: COOLDOWN_MS,
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            password: vec![Color::Red, Color::Blue, Color::Green, Color::Yellow],
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            location: "Main Entrance".to_string(),
            tick_interval_ms: TICK_INTERVAL_MS,
        }
    }
}

impl LockConfig {
    /// Parse from a TOML string and validate
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject inconsistent settings before anything starts.
    /// `cooldown_ms` may be zero.
    pub fn validate(&self) -> Result<()> {
        if self.dwell_duration_ms == 0 {
            return Err(LockError::Config("dwell_duration_ms must be > 0".into()));
        }
        if self.sequence_length == 0 {
            return Err(LockError::Config("sequence_length must be > 0".into()));
        }
        if self.server.tick_interval_ms == 0 {
            return Err(LockError::Config("server.tick_interval_ms must be > 0".into()));
        }
        self.password_sequence().map(|_| ())
    }

    /// Stored password checked against `sequence_length`
    pub fn password_sequence(&self) -> Result<PasswordSequence> {
        PasswordSequence::new(self.password.clone(), self.sequence_length)
    }
}
