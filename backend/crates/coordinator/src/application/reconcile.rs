//! Reconciliation Loop
//!
//! Every tick evicts stale activity entries and reclaims leases whose
//! heartbeat or lease ran out. A device whose heartbeat deadline is still in
//! the future is soft-reclaimed (requeued); any other candidate is
//! hard-reclaimed (expired) and its miner penalized.

use crate::application::config::CoordinatorConfig;
use crate::application::mutate_device;
use crate::application::notify::Notifier;
use crate::domain::entities::{Device, DeviceEvent};
use crate::domain::repository::DeviceRepository;
use crate::domain::value_objects::{MinerId, Status};
use crate::error::{JobError, JobResult};
use crate::infra::activity::ActivityTracker;
use kernel::clock::Clock;
use reputation::{Ledger, MinerRepository};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub soft: usize,
    pub hard: usize,
    /// Candidates that changed under us
    pub skipped: usize,
    /// Activity entries evicted
    pub evicted: usize,
}

impl ReconcileReport {
    pub fn is_idle(&self) -> bool {
        self.soft == 0 && self.hard == 0 && self.skipped == 0
    }
}

/// Reconciliation loop
pub struct Reconciler<R, M>
where
    R: DeviceRepository,
    M: MinerRepository,
{
    repo: Arc<R>,
    ledger: Ledger<M>,
    notifier: Arc<Notifier<R>>,
    activity: Arc<ActivityTracker>,
    clock: Arc<dyn Clock>,
    config: Arc<CoordinatorConfig>,
}

impl<R, M> Reconciler<R, M>
where
    R: DeviceRepository,
    M: MinerRepository,
{
    pub fn new(
        repo: Arc<R>,
        ledger: Ledger<M>,
        notifier: Arc<Notifier<R>>,
        activity: Arc<ActivityTracker>,
        clock: Arc<dyn Clock>,
        config: Arc<CoordinatorConfig>,
    ) -> Self {
        Self {
            repo,
            ledger,
            notifier,
            activity,
            clock,
            config,
        }
    }

    /// Run one pass
    ///
    /// A store or ledger error aborts the pass; a device that changed since
    /// the scan is skipped.
    pub async fn tick(&self) -> JobResult<ReconcileReport> {
        let now_ms = self.clock.now_ms();
        let mut report = ReconcileReport {
            evicted: self.activity.evict(
                now_ms,
                self.config.active_window_ms(),
                self.config.interactive_window_ms(),
            ),
            ..Default::default()
        };

        for candidate in self.repo.reclaim_candidates(now_ms).await? {
            let soft = candidate.check_time_ms.is_some_and(|t| t > now_ms);
            let outcome = if soft {
                self.soft_reclaim(&candidate).await
            } else {
                self.hard_reclaim(&candidate).await
            };

            match outcome {
                Ok(()) if soft => report.soft += 1,
                Ok(()) => report.hard += 1,
                Err(JobError::Transition { stage, event }) => {
                    tracing::debug!(id0 = %candidate.id0, stage, event, "Reclaim no longer applies");
                    report.skipped += 1;
                }
                Err(JobError::Conflict) => {
                    tracing::debug!(id0 = %candidate.id0, "Reclaim lost a version race");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    async fn soft_reclaim(&self, candidate: &Device) -> JobResult<()> {
        let changed = mutate_device(self.repo.as_ref(), &candidate.id0, false, |device| {
            device
                .apply(DeviceEvent::SoftReclaim)
                .map_err(JobError::from)
        })
        .await?;
        if changed.is_none() {
            return Ok(());
        }

        tracing::info!(id0 = %candidate.id0, "Lease reclaimed, job requeued");
        self.notifier.notify(&candidate.id0, Status::Queue).await;
        Ok(())
    }

    async fn hard_reclaim(&self, candidate: &Device) -> JobResult<()> {
        let changed = mutate_device(self.repo.as_ref(), &candidate.id0, false, |device| {
            let miner: Option<MinerId> = device
                .lease_holder()
                .cloned()
                .or_else(|| device.miner.clone());
            device
                .apply(DeviceEvent::HardReclaim)
                .map_err(JobError::from)?;
            Ok(miner)
        })
        .await?;
        let Some((_, miner)) = changed else {
            return Ok(());
        };

        tracing::info!(
            id0 = %candidate.id0,
            miner = ?miner.as_ref().map(MinerId::as_str),
            "Lease abandoned, job expired"
        );

        if let Some(miner) = miner.filter(|m| !m.is_unknown()) {
            if let Err(e) = self.ledger.penalize(&miner).await {
                tracing::error!(miner = %miner, error = %e, "Penalizing miner failed");
            }
        }
        self.notifier.notify(&candidate.id0, Status::Flag).await;
        Ok(())
    }

    /// Tick every `reconcile_interval` until `shutdown` fires
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.reconcile_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            period_ms = self.config.reconcile_interval.as_millis() as u64,
            "Reconciliation loop started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Reconciliation loop stopped");
                    break;
                }
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(report) if report.is_idle() => {
                            tracing::trace!(evicted = report.evicted, "Reconciliation tick");
                        }
                        Ok(report) => {
                            tracing::info!(
                                soft = report.soft,
                                hard = report.hard,
                                skipped = report.skipped,
                                evicted = report.evicted,
                                "Reconciliation tick"
                            );
                        }
                        Err(e) => {
                            e.log();
                            tracing::warn!("Reconciliation tick aborted");
                        }
                    }
                }
            }
        }
    }
}
