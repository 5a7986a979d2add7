//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Every device change goes through [`mutate_device`]: load, apply one
//! change, compare-and-swap save.

pub mod bot;
pub mod config;
pub mod intake;
pub mod notify;
pub mod reconcile;
pub mod stats;
pub mod submit;
pub mod work;

pub use bot::{BotUseCase, LfcsOutcome};
pub use intake::{Intent, IntakeUseCase};
pub use notify::{Notifier, StatusMessage};
pub use reconcile::{ReconcileReport, Reconciler};
pub use stats::{StatsSnapshot, StatsUseCase};
pub use submit::{SubmitResultInput, SubmitResultOutput, SubmitResultUseCase};
pub use work::{ClaimOutcome, WorkUseCase};

use crate::domain::entities::Device;
use crate::domain::repository::DeviceRepository;
use crate::domain::value_objects::Id0;
use crate::error::{JobError, JobResult};

/// Saves attempted before a version conflict is reported
const MAX_SAVE_ATTEMPTS: usize = 3;

/// Load `id0`, run `change` on it and save it with a version check
///
/// A device that does not exist is created when `create_missing` is set,
/// otherwise `Ok(None)` is returned. If `change` fails nothing is written.
/// On a version conflict the device is re-read and `change` runs again.
pub(crate) async fn mutate_device<R, T>(
    repo: &R,
    id0: &Id0,
    create_missing: bool,
    mut change: impl FnMut(&mut Device) -> JobResult<T>,
) -> JobResult<Option<(Device, T)>>
where
    R: DeviceRepository,
{
    for attempt in 1..=MAX_SAVE_ATTEMPTS {
        let mut device = match repo.find(id0).await? {
            Some(device) => device,
            None if create_missing => Device::new(id0.clone()),
            None => return Ok(None),
        };

        let output = change(&mut device)?;

        match repo.save(&device).await {
            Ok(version) => {
                device.version = version;
                return Ok(Some((device, output)));
            }
            Err(JobError::Conflict) => {
                tracing::debug!(id0 = %id0, attempt, "Version conflict, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::warn!(id0 = %id0, "Giving up after repeated version conflicts");
    Err(JobError::Conflict)
}
