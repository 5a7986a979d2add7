//! Device Intake Use Case
//!
//! Handles the control messages a device sends over its push channel:
//! friend code and part1 submission, brute-force requests, cancellation and
//! status queries. Each message yields at most one reply status.

use crate::application::mutate_device;
use crate::domain::entities::{Device, DeviceEvent, DeviceStage};
use crate::domain::repository::DeviceRepository;
use crate::domain::services::detect_id1_heuristic;
use crate::domain::value_objects::{FriendCode, Id0, Lfcs, Status};
use crate::error::{JobError, JobResult};
use std::sync::Arc;

/// What a device asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// `request: "bruteforce"`
    Bruteforce,
    /// `request: "cancel"`
    Cancel,
    /// Base64 movable_part1 blob
    Part1 { part1: String, defo_id0: bool },
    /// Decimal friend code
    FriendCode { friend_code: String, defo_id0: bool },
    /// No intent, report the current status
    Query,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Bruteforce => "bruteforce",
            Intent::Cancel => "cancel",
            Intent::Part1 { .. } => "part1",
            Intent::FriendCode { .. } => "friend_code",
            Intent::Query => "query",
        }
    }
}

/// Device Intake Use Case
pub struct IntakeUseCase<R>
where
    R: DeviceRepository,
{
    repo: Arc<R>,
}

impl<R> IntakeUseCase<R>
where
    R: DeviceRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Handle one message. Returns the status to reply with, if any.
    pub async fn execute(&self, raw_id0: &str, intent: Intent) -> JobResult<Option<Status>> {
        match intent {
            Intent::Bruteforce => self.request(raw_id0, DeviceEvent::BruteforceRequested).await,
            Intent::Cancel => self.request(raw_id0, DeviceEvent::UserCancelled).await,
            Intent::Part1 { part1, defo_id0 } => {
                self.submit_part1(raw_id0, &part1, defo_id0).await.map(Some)
            }
            Intent::FriendCode {
                friend_code,
                defo_id0,
            } => self
                .submit_friend_code(raw_id0, &friend_code, defo_id0)
                .await
                .map(Some),
            Intent::Query => self.query(raw_id0).await,
        }
    }

    async fn request(&self, raw_id0: &str, event: DeviceEvent) -> JobResult<Option<Status>> {
        let Ok(id0) = Id0::parse(raw_id0) else {
            return Ok(None);
        };
        let event_name = event.name();

        let result = mutate_device(self.repo.as_ref(), &id0, false, |device| {
            device.apply(event.clone()).map_err(JobError::from)
        })
        .await;

        match result {
            Ok(Some((device, ()))) => {
                tracing::info!(
                    id0 = %id0,
                    event = event_name,
                    stage = device.stage.name(),
                    "Device request applied"
                );
                Ok(Some(device.status()))
            }
            Ok(None) => Ok(None),
            Err(JobError::Transition { stage, event }) => {
                tracing::debug!(id0 = %id0, stage, event, "Request not applicable");
                self.current_status(&id0).await
            }
            Err(e) => Err(e),
        }
    }

    async fn submit_part1(&self, raw_id0: &str, part1: &str, defo_id0: bool) -> JobResult<Status> {
        let id0 = match Id0::parse(raw_id0) {
            Ok(id0) => id0,
            Err(_) => return Ok(Status::FriendCodeInvalid),
        };
        if let Some(status) = self.expired_status(&id0).await? {
            return Ok(status);
        }

        let lfcs = match validate_part1(&id0, part1, defo_id0) {
            Ok(lfcs) => lfcs,
            Err(e) => return rejection(&id0, e),
        };

        self.apply_submission(&id0, DeviceEvent::Part1Submitted(lfcs))
            .await
    }

    async fn submit_friend_code(
        &self,
        raw_id0: &str,
        friend_code: &str,
        defo_id0: bool,
    ) -> JobResult<Status> {
        let id0 = match Id0::parse(raw_id0) {
            Ok(id0) => id0,
            Err(_) => return Ok(Status::FriendCodeInvalid),
        };
        if let Some(status) = self.expired_status(&id0).await? {
            return Ok(status);
        }

        let code = match validate_friend_code(&id0, friend_code, defo_id0) {
            Ok(code) => code,
            Err(e) => return rejection(&id0, e),
        };

        self.apply_submission(&id0, DeviceEvent::FriendCodeSubmitted(code))
            .await
    }

    /// Apply a submission, creating the device on first contact
    async fn apply_submission(&self, id0: &Id0, event: DeviceEvent) -> JobResult<Status> {
        let event_name = event.name();

        match mutate_device(self.repo.as_ref(), id0, true, |device| {
            device.apply(event.clone()).map_err(JobError::from)
        })
        .await
        {
            Ok(Some((device, ()))) => {
                tracing::info!(
                    id0 = %id0,
                    event = event_name,
                    stage = device.stage.name(),
                    "Device submission accepted"
                );
                Ok(device.status())
            }
            Ok(None) => Err(JobError::DeviceNotFound),
            Err(JobError::Transition { stage, event }) => {
                tracing::debug!(id0 = %id0, stage, event, "Submission not applicable");
                Ok(self
                    .current_status(id0)
                    .await?
                    .unwrap_or(Status::FriendCodeInvalid))
            }
            Err(e) => Err(e),
        }
    }

    async fn query(&self, raw_id0: &str) -> JobResult<Option<Status>> {
        match Id0::parse(raw_id0) {
            Ok(id0) => self.current_status(&id0).await,
            Err(_) => Ok(None),
        }
    }

    async fn current_status(&self, id0: &Id0) -> JobResult<Option<Status>> {
        Ok(self.repo.find(id0).await?.as_ref().map(Device::status))
    }

    /// `flag` for a device that was killed
    async fn expired_status(&self, id0: &Id0) -> JobResult<Option<Status>> {
        let expired = self
            .repo
            .find(id0)
            .await?
            .is_some_and(|device| device.stage == DeviceStage::Expired);
        Ok(expired.then_some(Status::Flag))
    }
}

fn validate_part1(id0: &Id0, part1: &str, defo_id0: bool) -> JobResult<Lfcs> {
    let blob = platform::crypto::from_base64(part1.trim())
        .map_err(|_| JobError::InvalidPart1("not base64"))?;
    let lfcs = Lfcs::from_part1(&blob)?;
    check_not_id1(id0, defo_id0)?;
    Ok(lfcs)
}

fn validate_friend_code(id0: &Id0, friend_code: &str, defo_id0: bool) -> JobResult<FriendCode> {
    let code = FriendCode::parse(friend_code)?;
    check_not_id1(id0, defo_id0)?;
    Ok(code)
}

fn check_not_id1(id0: &Id0, defo_id0: bool) -> JobResult<()> {
    if !defo_id0 && detect_id1_heuristic(id0.as_str()) {
        return Err(JobError::CouldBeId1);
    }
    Ok(())
}

/// Reply status for a rejected submission
fn rejection(id0: &Id0, err: JobError) -> JobResult<Status> {
    tracing::warn!(id0 = %id0, error = %err, "Submission rejected");
    match err {
        JobError::CouldBeId1 => Ok(Status::CouldBeId1),
        JobError::InvalidId0 | JobError::InvalidFriendCode | JobError::InvalidPart1(_) => {
            Ok(Status::FriendCodeInvalid)
        }
        other => Err(other),
    }
}
