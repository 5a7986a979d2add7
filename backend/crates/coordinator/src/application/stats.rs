//! Stats Use Case
//!
//! Public service overview: device counters, miner activity, bot liveness
//! and the reputation leaderboard.

use crate::application::config::CoordinatorConfig;
use crate::application::notify::Notifier;
use crate::domain::repository::DeviceRepository;
use crate::error::JobResult;
use crate::infra::activity::ActivityTracker;
use chrono::{DateTime, Utc};
use kernel::clock::Clock;
use reputation::application::{LeaderboardEntry, LeaderboardUseCase};
use reputation::{Ledger, MinerRepository};
use serde::Serialize;
use std::sync::Arc;

/// Output DTO for stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub miner_count: u64,
    pub interactive_miner_count: u64,
    pub user_count: u64,
    pub mining_count: u64,
    pub p1_count: u64,
    pub ms_count: u64,
    pub total_count: u64,
    /// Bot heard from within the liveness window
    pub is_up: bool,
    pub bot_last_seen: Option<DateTime<Utc>>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Stats Use Case
pub struct StatsUseCase<R, M>
where
    R: DeviceRepository,
    M: MinerRepository,
{
    notifier: Arc<Notifier<R>>,
    activity: Arc<ActivityTracker>,
    ledger: Ledger<M>,
    clock: Arc<dyn Clock>,
    config: Arc<CoordinatorConfig>,
}

impl<R, M> StatsUseCase<R, M>
where
    R: DeviceRepository,
    M: MinerRepository,
{
    pub fn new(
        notifier: Arc<Notifier<R>>,
        activity: Arc<ActivityTracker>,
        ledger: Ledger<M>,
        clock: Arc<dyn Clock>,
        config: Arc<CoordinatorConfig>,
    ) -> Self {
        Self {
            notifier,
            activity,
            ledger,
            clock,
            config,
        }
    }

    pub async fn execute(&self) -> JobResult<StatsSnapshot> {
        let now_ms = self.clock.now_ms();
        let counters = self.notifier.counters().await;

        let leaderboard =
            LeaderboardUseCase::new(self.ledger.repo().clone(), self.ledger.config().clone())
                .execute()
                .await?;

        let bot_last_seen_ms = self.activity.bot_last_seen_ms();

        Ok(StatsSnapshot {
            miner_count: self.activity.active_count() as u64,
            interactive_miner_count: self.activity.interactive_count() as u64,
            user_count: counters.user_count,
            mining_count: counters.mining_count,
            p1_count: counters.p1_count,
            ms_count: counters.ms_count,
            total_count: counters.total_count,
            is_up: self
                .activity
                .bot_seen_within(now_ms, self.config.bot_liveness_window_ms()),
            bot_last_seen: DateTime::from_timestamp_millis(bot_last_seen_ms),
            leaderboard,
        })
    }
}
