//! Miner Entity

use crate::domain::value_object::{MinerId, MinerName};
use serde::Serialize;

/// A miner's standing
///
/// Rows are created lazily by the first score change or name claim. An
/// identity with no row has score 0 and is not banned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Miner {
    pub id: MinerId,
    pub score: i64,
    /// Set by operators directly in storage
    pub banned: bool,
    pub name: Option<MinerName>,
}

impl Miner {
    /// Default standing of an identity never seen before
    pub fn new(id: MinerId) -> Self {
        Self {
            id,
            score: 0,
            banned: false,
            name: None,
        }
    }

    /// Name shown publicly, falling back to "anonymous"
    pub fn display_name(&self) -> &str {
        self.name.as_ref().map(MinerName::as_str).unwrap_or("anonymous")
    }

    /// Eligible for the leaderboard
    pub fn is_ranked(&self) -> bool {
        self.score > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_miner_defaults() {
        let miner = Miner::new(MinerId::from("10.0.0.1"));
        assert_eq!(miner.score, 0);
        assert!(!miner.banned);
        assert!(!miner.is_ranked());
        assert_eq!(miner.display_name(), "anonymous");
    }
}
