//! Ledger
//!
//! Score bookkeeping shared with the job coordinator: results earn points,
//! abandoned leases cost points.

use crate::application::config::ReputationConfig;
use crate::domain::repository::MinerRepository;
use crate::domain::value_object::MinerId;
use crate::error::ReputationResult;
use std::sync::Arc;

/// Reputation ledger
pub struct Ledger<M>
where
    M: MinerRepository,
{
    repo: Arc<M>,
    config: Arc<ReputationConfig>,
}

impl<M> Clone for Ledger<M>
where
    M: MinerRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

impl<M> Ledger<M>
where
    M: MinerRepository,
{
    pub fn new(repo: Arc<M>, config: Arc<ReputationConfig>) -> Self {
        Self { repo, config }
    }

    pub fn repo(&self) -> &Arc<M> {
        &self.repo
    }

    pub fn config(&self) -> &Arc<ReputationConfig> {
        &self.config
    }

    /// Credit a submitted result. Returns the new score.
    pub async fn credit(&self, miner: &MinerId) -> ReputationResult<i64> {
        let score = self
            .repo
            .adjust_score(miner, self.config.result_reward)
            .await?;
        tracing::info!(miner = %miner, score, "Miner credited");
        Ok(score)
    }

    /// Penalize an abandoned lease. Returns the new score.
    pub async fn penalize(&self, miner: &MinerId) -> ReputationResult<i64> {
        let score = self
            .repo
            .adjust_score(miner, -self.config.abandon_penalty)
            .await?;
        tracing::info!(miner = %miner, score, "Miner penalized");
        Ok(score)
    }

    pub async fn is_banned(&self, miner: &MinerId) -> ReputationResult<bool> {
        self.repo.is_banned(miner).await
    }
}
