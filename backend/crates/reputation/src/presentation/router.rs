//! Reputation Router

use crate::application::config::ReputationConfig;
use crate::domain::repository::MinerRepository;
use crate::infra::postgres::PgMinerRepository;
use crate::presentation::handlers::{self, ReputationAppState};
use crate::presentation::middleware::{self, BanFilterState};
use axum::{Router, routing::get};
use std::sync::Arc;

/// Create the reputation router with PostgreSQL repository
pub fn reputation_router(repo: PgMinerRepository, config: ReputationConfig) -> Router {
    reputation_router_generic(repo, config)
}

/// Create a generic reputation router for any repository implementation
pub fn reputation_router_generic<R>(repo: R, config: ReputationConfig) -> Router
where
    R: MinerRepository + Clone + Send + Sync + 'static,
{
    let state = ReputationAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    Router::new()
        .route("/setname", get(handlers::set_name::<R>))
        .route("/leaderboard", get(handlers::leaderboard::<R>))
        .with_state(state)
}

/// Wrap `router` with the admission filter
pub fn with_ban_filter<R>(router: Router, repo: Arc<R>) -> Router
where
    R: MinerRepository + Clone + Send + Sync + 'static,
{
    router.layer(axum::middleware::from_fn_with_state(
        BanFilterState { repo },
        middleware::reject_banned::<R>,
    ))
}
