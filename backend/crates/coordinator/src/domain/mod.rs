//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Device, DeviceStage, DeviceEvent)
//! - Domain value objects (Id0, FriendCode, Lfcs, Status)
//! - Domain services (friend code checksum, id1 heuristic, file formats)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
