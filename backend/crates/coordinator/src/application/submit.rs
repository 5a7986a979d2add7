//! Submit Result Use Case

use crate::application::mutate_device;
use crate::application::notify::Notifier;
use crate::domain::entities::DeviceEvent;
use crate::domain::repository::DeviceRepository;
use crate::domain::services::{expected_id0, is_valid_movable_len, pad_movable};
use crate::domain::value_objects::{Id0, MinerId, Status};
use crate::error::{JobError, JobResult};
use platform::archive::{MSED_PART_LEN, MsedArchive};
use reputation::{Ledger, MinerRepository};
use std::sync::Arc;

/// Input DTO for submit result
#[derive(Debug, Clone)]
pub struct SubmitResultInput {
    pub id0: String,
    /// movable.sed, 0x120 or 0x140 bytes
    pub movable: Vec<u8>,
    /// Optional msed part, kept only when it is 12 bytes
    pub msed: Option<Vec<u8>>,
}

/// Output DTO for submit result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResultOutput {
    pub id0: Id0,
    /// Uploader score after the credit, if the ledger accepted it
    pub score: Option<i64>,
    /// Archive file name of the msed part
    pub archived: Option<String>,
}

/// Submit Result Use Case
pub struct SubmitResultUseCase<R, M, A>
where
    R: DeviceRepository,
    M: MinerRepository,
    A: MsedArchive,
{
    repo: Arc<R>,
    ledger: Ledger<M>,
    notifier: Arc<Notifier<R>>,
    archive: Arc<A>,
}

impl<R, M, A> SubmitResultUseCase<R, M, A>
where
    R: DeviceRepository,
    M: MinerRepository,
    A: MsedArchive,
{
    pub fn new(repo: Arc<R>, ledger: Ledger<M>, notifier: Arc<Notifier<R>>, archive: Arc<A>) -> Self {
        Self {
            repo,
            ledger,
            notifier,
            archive,
        }
    }

    pub async fn execute(
        &self,
        uploader: &MinerId,
        input: SubmitResultInput,
    ) -> JobResult<SubmitResultOutput> {
        if !is_valid_movable_len(input.movable.len()) {
            return Err(JobError::InvalidUpload(format!(
                "movable is {} bytes",
                input.movable.len()
            )));
        }
        let id0 = Id0::parse(&input.id0)?;

        if let Some(derived) = expected_id0(&input.movable) {
            if !derived.eq_ignore_ascii_case(id0.as_str()) {
                tracing::warn!(
                    id0 = %id0,
                    derived = %derived,
                    uploader = %uploader,
                    "Uploaded movable does not match id0"
                );
            }
        }

        let ms_data = match input.msed.as_deref() {
            Some(raw) => match <[u8; MSED_PART_LEN]>::try_from(raw) {
                Ok(part) => Some(part),
                Err(_) => {
                    tracing::warn!(id0 = %id0, len = raw.len(), "Ignoring msed part of wrong size");
                    None
                }
            },
            None => None,
        };

        let movable = pad_movable(&input.movable);
        mutate_device(self.repo.as_ref(), &id0, false, |device| {
            device
                .apply(DeviceEvent::ResultSubmitted {
                    movable: movable.clone(),
                    ms_data,
                })
                .map_err(JobError::from)
        })
        .await?
        .ok_or(JobError::DeviceNotFound)?;

        tracing::info!(id0 = %id0, uploader = %uploader, "Result submitted");

        let score = match self.ledger.credit(uploader).await {
            Ok(score) => Some(score),
            Err(e) => {
                tracing::error!(miner = %uploader, error = %e, "Crediting uploader failed");
                None
            }
        };

        self.notifier.notify(&id0, Status::Done).await;

        let archived = match ms_data {
            Some(part) => match self.archive.store(id0.as_str(), &part).await {
                Ok(name) => Some(name),
                Err(e) => {
                    tracing::error!(id0 = %id0, error = %e, "Archiving msed part failed");
                    None
                }
            },
            None => None,
        };

        Ok(SubmitResultOutput {
            id0,
            score,
            archived,
        })
    }
}
