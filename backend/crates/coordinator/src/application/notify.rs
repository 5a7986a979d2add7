//! Notification Protocol
//!
//! Every status pushed to a device carries the global counters, recomputed
//! per message.

use crate::domain::entities::DeviceCounters;
use crate::domain::repository::DeviceRepository;
use crate::domain::value_objects::{Id0, Status};
use crate::infra::activity::ActivityTracker;
use crate::infra::session::SessionDirectory;
use kernel::clock::Clock;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// Outbound status frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub status: Status,
    pub miner_count: u64,
    pub user_count: u64,
    pub mining_count: u64,
    pub p1_count: u64,
    pub ms_count: u64,
    pub total_count: u64,
}

impl StatusMessage {
    pub fn new(status: Status, miner_count: u64, counters: DeviceCounters) -> Self {
        Self {
            status,
            miner_count,
            user_count: counters.user_count,
            mining_count: counters.mining_count,
            p1_count: counters.p1_count,
            ms_count: counters.ms_count,
            total_count: counters.total_count,
        }
    }
}

/// Builds status frames and pushes them to device sessions
pub struct Notifier<R>
where
    R: DeviceRepository,
{
    repo: Arc<R>,
    sessions: Arc<SessionDirectory>,
    activity: Arc<ActivityTracker>,
    clock: Arc<dyn Clock>,
    last_counters: RwLock<DeviceCounters>,
}

impl<R> Notifier<R>
where
    R: DeviceRepository,
{
    pub fn new(
        repo: Arc<R>,
        sessions: Arc<SessionDirectory>,
        activity: Arc<ActivityTracker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            sessions,
            activity,
            clock,
            last_counters: RwLock::new(DeviceCounters::default()),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionDirectory> {
        &self.sessions
    }

    /// Current counters, or the last good ones if the registry fails
    pub async fn counters(&self) -> DeviceCounters {
        match self.repo.counters(self.clock.now_ms()).await {
            Ok(counters) => {
                *self
                    .last_counters
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = counters;
                counters
            }
            Err(e) => {
                tracing::warn!(error = %e, "Counting devices failed, using last counters");
                *self
                    .last_counters
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
            }
        }
    }

    pub async fn message(&self, status: Status) -> StatusMessage {
        let counters = self.counters().await;
        StatusMessage::new(status, self.activity.active_count() as u64, counters)
    }

    /// JSON text of a status frame
    pub async fn render(&self, status: Status) -> String {
        let message = self.message(status).await;
        serde_json::to_string(&message).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Serializing status frame failed");
            "{}".to_string()
        })
    }

    /// Push `status` to the session of `id0`, if there is one
    pub async fn notify(&self, id0: &Id0, status: Status) -> bool {
        if !self.sessions.contains(id0) {
            return false;
        }
        let text = self.render(status).await;
        let delivered = self.sessions.send(id0, text).await;
        tracing::debug!(id0 = %id0, status = %status, delivered, "Status pushed");
        delivered
    }
}
