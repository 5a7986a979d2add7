//! HTTP Handlers
//!
//! Miner and bot endpoints. Replies are the plain-text words the worker and
//! bot scripts expect; errors keep a matching HTTP status.

use crate::application::config::CoordinatorConfig;
use crate::application::{
    BotUseCase, ClaimOutcome, IntakeUseCase, Notifier, Reconciler, StatsSnapshot, StatsUseCase,
    SubmitResultInput, SubmitResultUseCase, WorkUseCase,
};
use crate::domain::repository::DeviceRepository;
use crate::domain::services::part1_file;
use crate::domain::value_objects::{Id0, MinerId};
use crate::error::{JobError, JobResult};
use crate::infra::activity::ActivityTracker;
use crate::infra::session::SessionDirectory;
use crate::presentation::dto::{CancelQuery, LfcsQuery};
use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use kernel::clock::Clock;
use platform::archive::FsMsedArchive;
use platform::client::ClientIdentity;
use reputation::{Ledger, MinerRepository, ReputationConfig};
use std::sync::Arc;

/// Shared state for coordinator handlers
#[derive(Clone)]
pub struct CoordinatorAppState<R, M>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub ledger: Ledger<M>,
    pub notifier: Arc<Notifier<R>>,
    pub activity: Arc<ActivityTracker>,
    pub sessions: Arc<SessionDirectory>,
    pub archive: Arc<FsMsedArchive>,
    pub config: Arc<CoordinatorConfig>,
    pub clock: Arc<dyn Clock>,
}

impl<R, M> CoordinatorAppState<R, M>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    pub fn new(
        repo: Arc<R>,
        miners: Arc<M>,
        reputation_config: Arc<ReputationConfig>,
        config: Arc<CoordinatorConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = Arc::new(SessionDirectory::new());
        let activity = Arc::new(ActivityTracker::new(clock.now_ms()));
        let notifier = Arc::new(Notifier::new(
            repo.clone(),
            sessions.clone(),
            activity.clone(),
            clock.clone(),
        ));

        Self {
            archive: Arc::new(FsMsedArchive::new(config.msed_dir.clone())),
            ledger: Ledger::new(miners, reputation_config),
            repo,
            notifier,
            activity,
            sessions,
            config,
            clock,
        }
    }

    pub fn intake(&self) -> IntakeUseCase<R> {
        IntakeUseCase::new(self.repo.clone())
    }

    pub fn bot(&self) -> BotUseCase<R> {
        BotUseCase::new(
            self.repo.clone(),
            self.notifier.clone(),
            self.activity.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    pub fn work(&self) -> WorkUseCase<R> {
        WorkUseCase::new(
            self.repo.clone(),
            self.notifier.clone(),
            self.activity.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    pub fn submit(&self) -> SubmitResultUseCase<R, M, FsMsedArchive> {
        SubmitResultUseCase::new(
            self.repo.clone(),
            self.ledger.clone(),
            self.notifier.clone(),
            self.archive.clone(),
        )
    }

    pub fn stats(&self) -> StatsUseCase<R, M> {
        StatsUseCase::new(
            self.notifier.clone(),
            self.activity.clone(),
            self.ledger.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    /// Reconciliation loop sharing this state
    pub fn reconciler(&self) -> Reconciler<R, M> {
        Reconciler::new(
            self.repo.clone(),
            self.ledger.clone(),
            self.notifier.clone(),
            self.activity.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }
}

/// Binary download
fn attachment(bytes: Vec<u8>, file_name: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

// ============================================================================
// Bot
// ============================================================================

/// GET /getfcs
pub async fn get_fcs<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    ClientIdentity(identity): ClientIdentity,
) -> Response
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    match state.bot().pending_friend_codes(&MinerId::new(identity)).await {
        Ok(codes) if codes.is_empty() => "nothing".into_response(),
        Ok(codes) => codes
            .iter()
            .map(|code| format!("{code}\n"))
            .collect::<String>()
            .into_response(),
        Err(e) => e.reply_with("nothing"),
    }
}

/// GET /added/{fc}
pub async fn added<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    ClientIdentity(identity): ClientIdentity,
    Path(fc): Path<String>,
) -> Response
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    match state.bot().mark_added(&MinerId::new(identity), &fc).await {
        Ok(_) => "success".into_response(),
        Err(e) => e.reply_with("fail"),
    }
}

/// GET /lfcs/{fc}?lfcs=
pub async fn lfcs<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    ClientIdentity(identity): ClientIdentity,
    Path(fc): Path<String>,
    Query(query): Query<LfcsQuery>,
) -> Response
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    match state
        .bot()
        .record_lfcs(&MinerId::new(identity), &fc, query.lfcs.as_deref())
        .await
    {
        Ok(_) => "success".into_response(),
        Err(e) => e.reply_with("fail"),
    }
}

// ============================================================================
// Miners
// ============================================================================

/// GET /getwork
pub async fn get_work<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    ClientIdentity(identity): ClientIdentity,
) -> JobResult<String>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    let next = state.work().request_work(&MinerId::new(identity)).await?;

    Ok(next.map_or_else(|| "nothing".to_string(), |id0| id0.to_string()))
}

/// GET /claim/{id}
pub async fn claim<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    ClientIdentity(identity): ClientIdentity,
    Path(id0): Path<String>,
) -> JobResult<&'static str>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    match state.work().claim(&MinerId::new(identity), &id0).await? {
        ClaimOutcome::Claimed { .. } => Ok("success"),
        ClaimOutcome::AlreadyLeasing => Ok("nothing"),
    }
}

/// GET /check/{id}
pub async fn check<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    ClientIdentity(identity): ClientIdentity,
    Path(id0): Path<String>,
) -> JobResult<&'static str>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    state.work().check(&MinerId::new(identity), &id0).await?;

    Ok("ok")
}

/// GET /cancel/{id}?kill=y|n
pub async fn cancel<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    Path(id0): Path<String>,
    Query(query): Query<CancelQuery>,
) -> JobResult<&'static str>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    state.work().cancel(&id0, query.kill.as_deref()).await?;

    Ok("success")
}

/// GET /part1/{id}
pub async fn part1<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    Path(id0): Path<String>,
) -> JobResult<Response>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    let id0 = Id0::parse(&id0)?;
    let device = state
        .repo
        .find(&id0)
        .await?
        .ok_or(JobError::DeviceNotFound)?;
    let lfcs = device.lfcs.ok_or(JobError::NotReady("part1"))?;

    Ok(attachment(part1_file(&lfcs, &id0), "movable_part1.sed"))
}

/// GET /movable/{id}
pub async fn movable<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    Path(id0): Path<String>,
) -> Response
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    let lookup = match Id0::parse(&id0) {
        Ok(id0) => state.repo.find(&id0).await,
        Err(e) => Err(e),
    };

    match lookup {
        Ok(Some(device)) => match device.movable {
            Some(movable) => attachment(movable, "movable.sed"),
            None => JobError::NotReady("movable").into_response(),
        },
        Ok(None) => JobError::DeviceNotFound.reply_with(""),
        Err(e) => e.into_response(),
    }
}

/// POST /upload/{id} (multipart: `movable`, optional `msed`)
pub async fn upload<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    ClientIdentity(identity): ClientIdentity,
    Path(id0): Path<String>,
    mut multipart: Multipart,
) -> JobResult<&'static str>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    let mut movable = None;
    let mut msed = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| JobError::InvalidUpload(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| JobError::InvalidUpload(e.to_string()))?;

        match name.as_deref() {
            Some("movable") => movable = Some(bytes.to_vec()),
            Some("msed") => msed = Some(bytes.to_vec()),
            _ => {}
        }
    }

    let movable = movable.ok_or_else(|| JobError::InvalidUpload("missing movable".into()))?;

    state
        .submit()
        .execute(
            &MinerId::new(identity),
            SubmitResultInput { id0, movable, msed },
        )
        .await?;

    Ok("success")
}

// ============================================================================
// Public
// ============================================================================

/// GET /stats
pub async fn stats<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
) -> JobResult<Json<StatsSnapshot>>
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    Ok(Json(state.stats().execute().await?))
}
