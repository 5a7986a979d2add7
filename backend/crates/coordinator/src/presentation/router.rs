//! Coordinator Router

use crate::domain::repository::DeviceRepository;
use crate::infra::postgres::PgDeviceRepository;
use crate::presentation::handlers::{self, CoordinatorAppState};
use crate::presentation::socket;
use axum::{
    Router,
    routing::{get, post},
};
use reputation::{MinerRepository, PgMinerRepository};

/// Create the coordinator router with PostgreSQL repositories
pub fn coordinator_router(
    state: CoordinatorAppState<PgDeviceRepository, PgMinerRepository>,
) -> Router {
    coordinator_router_generic(state)
}

/// Create a generic coordinator router for any repository implementation
pub fn coordinator_router_generic<R, M>(state: CoordinatorAppState<R, M>) -> Router
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        // Devices
        .route("/socket", get(socket::socket::<R, M>))
        // Bot
        .route("/getfcs", get(handlers::get_fcs::<R, M>))
        .route("/added/{fc}", get(handlers::added::<R, M>))
        .route("/lfcs/{fc}", get(handlers::lfcs::<R, M>))
        // Miners
        .route("/getwork", get(handlers::get_work::<R, M>))
        .route("/claim/{id}", get(handlers::claim::<R, M>))
        .route("/check/{id}", get(handlers::check::<R, M>))
        .route("/cancel/{id}", get(handlers::cancel::<R, M>))
        .route("/part1/{id}", get(handlers::part1::<R, M>))
        .route("/movable/{id}", get(handlers::movable::<R, M>))
        .route("/upload/{id}", post(handlers::upload::<R, M>))
        // Public
        .route("/stats", get(handlers::stats::<R, M>))
        .with_state(state)
}
