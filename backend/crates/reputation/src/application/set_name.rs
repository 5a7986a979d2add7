//! Set Name Use Case

use crate::application::config::ReputationConfig;
use crate::domain::repository::MinerRepository;
use crate::domain::value_object::{MinerId, MinerName};
use crate::error::{ReputationError, ReputationResult};
use std::sync::Arc;

/// Set Name Use Case
pub struct SetNameUseCase<M>
where
    M: MinerRepository,
{
    repo: Arc<M>,
    config: Arc<ReputationConfig>,
}

impl<M> SetNameUseCase<M>
where
    M: MinerRepository,
{
    pub fn new(repo: Arc<M>, config: Arc<ReputationConfig>) -> Self {
        Self { repo, config }
    }

    /// Claim `raw_name` for `miner`. Re-claiming one's own name succeeds.
    pub async fn execute(
        &self,
        miner: &MinerId,
        raw_name: Option<&str>,
    ) -> ReputationResult<MinerName> {
        let raw_name = raw_name.ok_or(ReputationError::NameMissing)?;
        let name = MinerName::with_max_length(raw_name, self.config.name_max_length)?;

        if !self.repo.claim_name(miner, &name).await? {
            tracing::warn!(miner = %miner, name = %name, "Miner name taken");
            return Err(ReputationError::NameTaken);
        }

        tracing::info!(miner = %miner, name = %name, "Miner name set");
        Ok(name)
    }
}
