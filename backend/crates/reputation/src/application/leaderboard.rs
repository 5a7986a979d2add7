//! Leaderboard Use Case

use crate::application::config::ReputationConfig;
use crate::domain::repository::MinerRepository;
use crate::error::ReputationResult;
use serde::Serialize;
use std::sync::Arc;

/// Public leaderboard row. Network identities are never published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub score: i64,
}

/// Leaderboard Use Case
pub struct LeaderboardUseCase<M>
where
    M: MinerRepository,
{
    repo: Arc<M>,
    config: Arc<ReputationConfig>,
}

impl<M> LeaderboardUseCase<M>
where
    M: MinerRepository,
{
    pub fn new(repo: Arc<M>, config: Arc<ReputationConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self) -> ReputationResult<Vec<LeaderboardEntry>> {
        let miners = self.repo.leaderboard(self.config.leaderboard_size).await?;

        Ok(miners
            .iter()
            .filter(|m| m.is_ranked())
            .enumerate()
            .map(|(i, m)| LeaderboardEntry {
                rank: i + 1,
                name: m.display_name().to_string(),
                score: m.score,
            })
            .collect())
    }
}
