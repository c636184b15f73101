//! Password sequence

use serde::Serialize;

use crate::error::{LockError, Result};
use crate::types::{format_sequence, Color};

/// Ordered color list with a fixed, validated length.
///
/// Serialize only: every instance goes through [`PasswordSequence::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PasswordSequence(Vec<Color>);

impl PasswordSequence {
    /// Build a password with exactly `length` colors.
    /// A mismatch is a configuration bug and fails; nothing is truncated or padded.
    pub fn new(colors: Vec<Color>, length: usize) -> Result<Self> {
        if colors.len() != length {
            return Err(LockError::SequenceLengthMismatch {
                expected: length,
                actual: colors.len(),
            });
        }
        Ok(Self(colors))
    }

    pub fn colors(&self) -> &[Color] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position-wise exact match
    pub fn matches(&self, attempt: &[Color]) -> bool {
        self.0.as_slice() == attempt
    }
}

impl std::fmt::Display for PasswordSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", format_sequence(&self.0))
    }
}
