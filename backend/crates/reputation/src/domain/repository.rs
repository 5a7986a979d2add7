//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use crate::domain::entity::Miner;
use crate::domain::value_object::{MinerId, MinerName};
use crate::error::ReputationResult;

/// Miner repository trait
#[trait_variant::make(MinerRepository: Send)]
pub trait LocalMinerRepository {
    /// Get a miner by identity
    async fn find(&self, id: &MinerId) -> ReputationResult<Option<Miner>>;

    /// Whether the identity is banned (unknown identities are not)
    async fn is_banned(&self, id: &MinerId) -> ReputationResult<bool>;

    /// Add `delta` to the score, creating the miner if needed.
    /// Returns the new score.
    async fn adjust_score(&self, id: &MinerId, delta: i64) -> ReputationResult<i64>;

    /// Give `name` to `id` unless another identity holds it.
    /// Returns false when the name is taken.
    async fn claim_name(&self, id: &MinerId, name: &MinerName) -> ReputationResult<bool>;

    /// Miners with a positive score, highest first
    async fn leaderboard(&self, limit: usize) -> ReputationResult<Vec<Miner>>;
}
