//! Application Configuration
//!
//! Configuration for the reputation ledger.

use crate::domain::value_object::MINER_NAME_MAX_LENGTH;

/// Reputation application configuration
#[derive(Debug, Clone)]
pub struct ReputationConfig {
    /// Points credited for each uploaded result
    pub result_reward: i64,
    /// Points deducted when a lease is hard-reclaimed
    pub abandon_penalty: i64,
    /// Number of miners shown on the leaderboard
    pub leaderboard_size: usize,
    /// Maximum display name length (in characters)
    pub name_max_length: usize,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            result_reward: 5,
            abandon_penalty: 3,
            leaderboard_size: 5,
            name_max_length: MINER_NAME_MAX_LENGTH,
        }
    }
}
