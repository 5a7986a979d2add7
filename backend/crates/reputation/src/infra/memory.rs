//! In-memory Repository Implementation
//!
//! Same semantics as the PostgreSQL store, kept in process. Used by
//! `STORE=memory` and by tests.

use crate::domain::entity::Miner;
use crate::domain::repository::MinerRepository;
use crate::domain::value_object::{MinerId, MinerName};
use crate::error::ReputationResult;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// In-memory miner repository
#[derive(Clone, Default)]
pub struct MemoryMinerRepository {
    miners: Arc<DashMap<MinerId, Miner>>,
    /// name -> owner
    names: Arc<DashMap<String, MinerId>>,
}

impl MemoryMinerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ban or unban an identity (operators do this directly in storage)
    pub fn set_banned(&self, id: &MinerId, banned: bool) {
        self.miners
            .entry(id.clone())
            .or_insert_with(|| Miner::new(id.clone()))
            .banned = banned;
    }

    /// Current score, 0 for unknown identities
    pub fn score(&self, id: &MinerId) -> i64 {
        self.miners.get(id).map(|m| m.score).unwrap_or(0)
    }
}

impl MinerRepository for MemoryMinerRepository {
    async fn find(&self, id: &MinerId) -> ReputationResult<Option<Miner>> {
        Ok(self.miners.get(id).map(|m| m.value().clone()))
    }

    async fn is_banned(&self, id: &MinerId) -> ReputationResult<bool> {
        Ok(self.miners.get(id).is_some_and(|m| m.banned))
    }

    async fn adjust_score(&self, id: &MinerId, delta: i64) -> ReputationResult<i64> {
        let mut miner = self
            .miners
            .entry(id.clone())
            .or_insert_with(|| Miner::new(id.clone()));
        miner.score += delta;
        Ok(miner.score)
    }

    async fn claim_name(&self, id: &MinerId, name: &MinerName) -> ReputationResult<bool> {
        match self.names.entry(name.as_str().to_string()) {
            Entry::Occupied(owner) if owner.get() != id => return Ok(false),
            Entry::Occupied(_) => return Ok(true),
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }

        let previous = self
            .miners
            .entry(id.clone())
            .or_insert_with(|| Miner::new(id.clone()))
            .name
            .replace(name.clone());

        if let Some(previous) = previous.filter(|p| p != name) {
            self.names
                .remove_if(previous.as_str(), |_, owner| owner == id);
        }

        Ok(true)
    }

    async fn leaderboard(&self, limit: usize) -> ReputationResult<Vec<Miner>> {
        let mut ranked: Vec<Miner> = self
            .miners
            .iter()
            .filter(|m| m.score > 0)
            .map(|m| m.value().clone())
            .collect();

        ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        ranked.truncate(limit);

        Ok(ranked)
    }
}
