//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" shared by the coordinator and the
//! reputation ledger:
//! - Common error types and result aliases
//! - The clock used for every lease and heartbeat deadline
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod clock;
