//! Bot Use Case
//!
//! The bot befriends devices by friend code and reports the LFCS it learns.
//! Only the configured bot identity may call these operations.

use crate::application::config::CoordinatorConfig;
use crate::application::mutate_device;
use crate::application::notify::Notifier;
use crate::domain::entities::{DeviceEvent, DeviceStage};
use crate::domain::repository::DeviceRepository;
use crate::domain::value_objects::{FriendCode, Id0, Lfcs, MinerId, Status};
use crate::error::{JobError, JobResult};
use crate::infra::activity::ActivityTracker;
use kernel::clock::Clock;
use std::sync::Arc;

/// Result of an LFCS report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LfcsOutcome {
    /// The device moved to part1-ready
    Recorded(Id0),
    /// Every device with the friend code already had its LFCS
    AlreadyKnown,
}

/// Bot Use Case
pub struct BotUseCase<R>
where
    R: DeviceRepository,
{
    repo: Arc<R>,
    notifier: Arc<Notifier<R>>,
    activity: Arc<ActivityTracker>,
    clock: Arc<dyn Clock>,
    config: Arc<CoordinatorConfig>,
}

impl<R> BotUseCase<R>
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

    fn ensure_trusted(&self, caller: &MinerId) -> JobResult<()> {
        if self.config.is_trusted_bot(caller) {
            Ok(())
        } else {
            Err(JobError::UntrustedBot)
        }
    }

    /// Friend codes waiting to be added
    pub async fn pending_friend_codes(&self, caller: &MinerId) -> JobResult<Vec<FriendCode>> {
        self.ensure_trusted(caller)?;
        self.activity.record_bot(self.clock.now_ms());

        self.repo.pending_friend_codes().await
    }

    /// The bot added a friend code
    pub async fn mark_added(&self, caller: &MinerId, raw_code: &str) -> JobResult<Id0> {
        self.ensure_trusted(caller)?;
        let code = FriendCode::parse_unchecked(raw_code)?;

        let id0 = self
            .repo
            .find_by_friend_code(code)
            .await?
            .into_iter()
            .find(|device| device.stage == DeviceStage::AwaitingAdd)
            .map(|device| device.id0)
            .ok_or(JobError::DeviceNotFound)?;

        mutate_device(self.repo.as_ref(), &id0, false, |device| {
            device.apply(DeviceEvent::BotAdded).map_err(JobError::from)
        })
        .await?
        .ok_or(JobError::DeviceNotFound)?;

        tracing::info!(id0 = %id0, friend_code = %code, "Friend code added by bot");
        self.notifier.notify(&id0, Status::FriendCodeAdded).await;

        Ok(id0)
    }

    /// The bot learned the LFCS of a friend code
    pub async fn record_lfcs(
        &self,
        caller: &MinerId,
        raw_code: &str,
        raw_lfcs: Option<&str>,
    ) -> JobResult<LfcsOutcome> {
        self.ensure_trusted(caller)?;
        let code = FriendCode::parse_unchecked(raw_code)?;
        let lfcs = Lfcs::from_bot_hex(raw_lfcs.ok_or(JobError::InvalidLfcs)?)?;

        let devices = self.repo.find_by_friend_code(code).await?;
        if devices.is_empty() {
            return Err(JobError::DeviceNotFound);
        }

        let Some(id0) = devices
            .into_iter()
            .find(|device| {
                matches!(
                    device.stage,
                    DeviceStage::AwaitingAdd | DeviceStage::AwaitingPart1
                )
            })
            .map(|device| device.id0)
        else {
            tracing::debug!(friend_code = %code, "LFCS already known");
            return Ok(LfcsOutcome::AlreadyKnown);
        };

        mutate_device(self.repo.as_ref(), &id0, false, |device| {
            device
                .apply(DeviceEvent::LfcsFound(lfcs))
                .map_err(JobError::from)
        })
        .await?
        .ok_or(JobError::DeviceNotFound)?;

        tracing::info!(id0 = %id0, friend_code = %code, "LFCS recorded");
        self.notifier.notify(&id0, Status::MovablePart1).await;

        Ok(LfcsOutcome::Recorded(id0))
    }
}
