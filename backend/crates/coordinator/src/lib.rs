//! Brute-force Job Coordinator
//!
//! Clean Architecture structure:
//! - `domain/` - Device pipeline, value objects, validation, repository trait
//! - `application/` - Intake, bot, work and result use cases, notification,
//!   reconciliation loop
//! - `infra/` - PostgreSQL and in-memory registries, session directory,
//!   activity windows
//! - `presentation/` - HTTP handlers, push channel, router
//!
//! Devices register a friend code or a part1 blob over a WebSocket; the bot
//! resolves friend codes to an LFCS; miners lease queued jobs, heartbeat
//! them and upload the resulting movable.sed. A background loop reclaims
//! leases that stop heartbeating.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::CoordinatorConfig;
pub use application::{Notifier, ReconcileReport, Reconciler};
pub use domain::entities::{Device, DeviceCounters, DeviceEvent, DeviceStage};
pub use domain::repository::DeviceRepository;
pub use domain::value_objects::{FriendCode, Id0, Lfcs, MinerId, Status};
pub use error::{JobError, JobResult};
pub use infra::memory::MemoryDeviceRepository;
pub use infra::postgres::PgDeviceRepository;
pub use presentation::handlers::CoordinatorAppState;
pub use presentation::router::{coordinator_router, coordinator_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
