//! Miner Reputation Ledger
//!
//! Clean Architecture structure:
//! - `domain/` - Miner entity, value objects, repository trait
//! - `application/` - Ledger (credit/penalize), name claims, leaderboard
//! - `infra/` - PostgreSQL and in-memory implementations
//! - `presentation/` - HTTP handlers, router, admission filter
//!
//! Miners are keyed by network identity. Scores move +5 per uploaded result
//! and -3 per abandoned lease; banned identities are rejected on every
//! request.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::Ledger;
pub use application::config::ReputationConfig;
pub use domain::entity::Miner;
pub use domain::repository::MinerRepository;
pub use domain::value_object::{MinerId, MinerName};
pub use error::{ReputationError, ReputationResult};
pub use infra::memory::MemoryMinerRepository;
pub use infra::postgres::PgMinerRepository;
pub use presentation::router::{reputation_router, reputation_router_generic, with_ban_filter};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
