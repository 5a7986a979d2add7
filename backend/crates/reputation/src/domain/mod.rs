//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Miner)
//! - Value objects (MinerId, MinerName)
//! - Repository traits (interfaces)

pub mod entity;
pub mod repository;
pub mod value_object;
