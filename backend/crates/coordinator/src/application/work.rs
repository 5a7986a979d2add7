//! Work Use Case
//!
//! The claim-lease protocol between miners and queued jobs:
//! look-ahead (`request_work`), lease (`claim`), heartbeat (`check`) and
//! miner-side cancellation (`cancel`).

use crate::application::config::CoordinatorConfig;
use crate::application::mutate_device;
use crate::application::notify::Notifier;
use crate::domain::entities::{Device, DeviceEvent};
use crate::domain::repository::DeviceRepository;
use crate::domain::value_objects::{Id0, MinerId, Status};
use crate::error::{JobError, JobResult};
use crate::infra::activity::ActivityTracker;
use kernel::clock::Clock;
use std::sync::Arc;

/// Result of a claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Lease granted until `expires_at_ms`
    Claimed { expires_at_ms: i64 },
    /// The miner already holds a live lease
    AlreadyLeasing,
}

/// Work Use Case
pub struct WorkUseCase<R>
where
    R: DeviceRepository,
{
    repo: Arc<R>,
    notifier: Arc<Notifier<R>>,
    activity: Arc<ActivityTracker>,
    clock: Arc<dyn Clock>,
    config: Arc<CoordinatorConfig>,
}

impl<R> WorkUseCase<R>
where
    R: DeviceRepository,
{
    pub fn new(
        repo: Arc<R>,
        notifier: Arc<Notifier<R>>,
        activity: Arc<ActivityTracker>,
        clock: Arc<dyn Clock>,
        config: Arc<CoordinatorConfig>,
    ) -> Self {
        Self {
            repo,
            notifier,
            activity,
            clock,
            config,
        }
    }

    /// Suggest a queued job. Nothing is reserved.
    pub async fn request_work(&self, miner: &MinerId) -> JobResult<Option<Id0>> {
        let now_ms = self.clock.now_ms();
        self.activity.record_work_request(miner, now_ms);

        if let Some(leased) = self.repo.active_lease(miner, now_ms).await? {
            tracing::debug!(miner = %miner, id0 = %leased, "Miner already holds a lease");
            return Ok(None);
        }

        self.repo.next_queued().await
    }

    /// Lease a queued job to `miner`
    pub async fn claim(&self, miner: &MinerId, raw_id0: &str) -> JobResult<ClaimOutcome> {
        let now_ms = self.clock.now_ms();
        self.activity.record_active(miner, now_ms);

        if self.repo.active_lease(miner, now_ms).await?.is_some() {
            return Ok(ClaimOutcome::AlreadyLeasing);
        }

        let id0 = Id0::parse(raw_id0)?;
        let expires_at_ms = now_ms + self.config.lease_duration_ms();

        mutate_device(self.repo.as_ref(), &id0, false, |device| {
            device
                .apply(DeviceEvent::Claimed {
                    miner: miner.clone(),
                    expires_at_ms,
                })
                .map_err(JobError::from)
        })
        .await?
        .ok_or(JobError::DeviceNotFound)?;

        tracing::info!(id0 = %id0, miner = %miner, expires_at_ms, "Job claimed");
        self.notifier.notify(&id0, Status::Bruteforcing).await;

        Ok(ClaimOutcome::Claimed { expires_at_ms })
    }

    /// Heartbeat from the lease holder. Returns the new heartbeat deadline.
    pub async fn check(&self, miner: &MinerId, raw_id0: &str) -> JobResult<i64> {
        let id0 = Id0::parse(raw_id0)?;
        let now_ms = self.clock.now_ms();
        let check_until_ms = now_ms + self.config.heartbeat_extension_ms();

        let result = mutate_device(self.repo.as_ref(), &id0, false, |device| {
            device
                .apply(DeviceEvent::Heartbeat {
                    miner: miner.clone(),
                    now_ms,
                    check_until_ms,
                })
                .map_err(|_| JobError::NotLeaseHolder)
        })
        .await?;
        result.ok_or(JobError::DeviceNotFound)?;

        self.activity.record_active(miner, now_ms);
        tracing::debug!(id0 = %id0, miner = %miner, check_until_ms, "Heartbeat");

        Ok(check_until_ms)
    }

    /// Miner gives a job back: `kill=y` kills it, `kill=n` requeues it
    pub async fn cancel(&self, raw_id0: &str, kill: Option<&str>) -> JobResult<Device> {
        let expire = match kill {
            Some("y") => true,
            Some("n") => false,
            _ => return Err(JobError::InvalidParameter("kill must be y or n")),
        };
        let id0 = Id0::parse(raw_id0)?;

        let (device, ()) = mutate_device(self.repo.as_ref(), &id0, false, |device| {
            device
                .apply(DeviceEvent::Killed { expire })
                .map_err(JobError::from)
        })
        .await?
        .ok_or(JobError::DeviceNotFound)?;

        tracing::info!(
            id0 = %id0,
            expire,
            stage = device.stage.name(),
            "Job cancelled by miner"
        );
        self.notifier.notify(&id0, Status::Flag).await;

        Ok(device)
    }
}
