//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.

pub mod config;
pub mod leaderboard;
pub mod ledger;
pub mod set_name;

pub use leaderboard::{LeaderboardEntry, LeaderboardUseCase};
pub use ledger::Ledger;
pub use set_name::SetNameUseCase;
