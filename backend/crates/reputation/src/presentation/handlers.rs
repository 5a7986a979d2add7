//! HTTP Handlers

use crate::application::config::ReputationConfig;
use crate::application::{LeaderboardUseCase, SetNameUseCase};
use crate::domain::repository::MinerRepository;
use crate::domain::value_object::MinerId;
use crate::error::ReputationResult;
use crate::presentation::dto::{LeaderboardResponse, SetNameQuery};
use axum::Json;
use axum::extract::{Query, State};
use platform::client::ClientIdentity;
use std::sync::Arc;

/// Shared state for reputation handlers
#[derive(Clone)]
pub struct ReputationAppState<R>
where
    R: MinerRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<ReputationConfig>,
}

/// GET /setname?name=
pub async fn set_name<R>(
    State(state): State<ReputationAppState<R>>,
    ClientIdentity(identity): ClientIdentity,
    Query(query): Query<SetNameQuery>,
) -> ReputationResult<&'static str>
where
    R: MinerRepository + Clone + Send + Sync + 'static,
{
    let use_case = SetNameUseCase::new(state.repo.clone(), state.config.clone());

    use_case
        .execute(&MinerId::new(identity), query.name.as_deref())
        .await?;

    Ok("success")
}

/// GET /leaderboard
pub async fn leaderboard<R>(
    State(state): State<ReputationAppState<R>>,
) -> ReputationResult<Json<LeaderboardResponse>>
where
    R: MinerRepository + Clone + Send + Sync + 'static,
{
    let use_case = LeaderboardUseCase::new(state.repo.clone(), state.config.clone());

    let miners = use_case.execute().await?;

    Ok(Json(LeaderboardResponse { miners }))
}
