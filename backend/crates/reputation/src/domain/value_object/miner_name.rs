//! Miner Name Value Object
//!
//! Display name shown on the leaderboard. Names are claimed first come first
//! served and stay unique across identities.
//!
//! ## Invariants
//! - 1 to [`MINER_NAME_MAX_LENGTH`] characters after trimming
//! - No control characters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum length for a miner name (in characters)
pub const MINER_NAME_MAX_LENGTH: usize = 32;

/// Error returned when miner name validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinerNameError {
    /// Name is empty after trimming
    Empty,

    /// Name is too long
    TooLong { length: usize, max: usize },

    /// Name contains a control character
    ControlCharacter { position: usize },
}

impl fmt::Display for MinerNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Miner name cannot be empty"),
            Self::TooLong { length, max } => {
                write!(f, "Miner name is too long ({length} chars, maximum {max})")
            }
            Self::ControlCharacter { position } => {
                write!(f, "Miner name contains a control character at position {position}")
            }
        }
    }
}

impl std::error::Error for MinerNameError {}

/// Validated miner display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinerName(String);

impl MinerName {
    /// Validate with the default length limit
    pub fn new(raw: &str) -> Result<Self, MinerNameError> {
        Self::with_max_length(raw, MINER_NAME_MAX_LENGTH)
    }

    /// Validate with an explicit length limit
    pub fn with_max_length(raw: &str, max: usize) -> Result<Self, MinerNameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MinerNameError::Empty);
        }

        let length = trimmed.chars().count();
        if length > max {
            return Err(MinerNameError::TooLong { length, max });
        }

        if let Some(position) = trimmed.chars().position(char::is_control) {
            return Err(MinerNameError::ControlCharacter { position });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Wrap a name read back from storage
    pub(crate) fn from_trusted(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MinerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert_eq!(MinerName::new("seedminer").unwrap().as_str(), "seedminer");
        assert_eq!(MinerName::new("  padded  ").unwrap().as_str(), "padded");
        assert!(MinerName::new("名前").is_ok());
        assert!(MinerName::new(&"a".repeat(MINER_NAME_MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(MinerName::new("   "), Err(MinerNameError::Empty));
        assert_eq!(
            MinerName::new(&"a".repeat(33)),
            Err(MinerNameError::TooLong { length: 33, max: 32 })
        );
        assert_eq!(
            MinerName::new("bad\u{7}name"),
            Err(MinerNameError::ControlCharacter { position: 3 })
        );
    }

    #[test]
    fn test_custom_max_length() {
        assert!(MinerName::with_max_length("abcd", 3).is_err());
        assert!(MinerName::with_max_length("abc", 3).is_ok());
    }
}
