//! Miner ID Value Object
//!
//! Miners have no accounts. A miner is whoever talks to the server from a
//! given network identity (the client address after proxy headers are
//! resolved), and every score, ban and display name is keyed by it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identity of a miner (or of the bot)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinerId(String);

impl MinerId {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity could not be determined
    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MinerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MinerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MinerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MinerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
