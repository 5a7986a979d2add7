//! In-memory Device Registry
//!
//! Same semantics as the PostgreSQL store, kept in process. Used by
//! `STORE=memory` and by tests.

use crate::domain::entities::{Device, DeviceCounters, DeviceStage};
use crate::domain::repository::DeviceRepository;
use crate::domain::value_objects::{FriendCode, Id0, MinerId};
use crate::error::{JobError, JobResult};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone)]
struct StoredDevice {
    device: Device,
    /// Insertion order, stands in for `created_at`
    seq: u64,
}

/// In-memory device repository
#[derive(Clone, Default)]
pub struct MemoryDeviceRepository {
    devices: Arc<DashMap<Id0, StoredDevice>>,
    next_seq: Arc<AtomicU64>,
}

impl MemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Snapshot of matching devices in insertion order
    fn select(&self, mut keep: impl FnMut(&Device) -> bool) -> Vec<Device> {
        let mut rows: Vec<(u64, Device)> = self
            .devices
            .iter()
            .filter(|entry| keep(&entry.device))
            .map(|entry| (entry.seq, entry.device.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, device)| device).collect()
    }
}

impl DeviceRepository for MemoryDeviceRepository {
    async fn find(&self, id0: &Id0) -> JobResult<Option<Device>> {
        Ok(self.devices.get(id0).map(|entry| entry.device.clone()))
    }

    async fn find_by_friend_code(&self, code: FriendCode) -> JobResult<Vec<Device>> {
        Ok(self.select(|device| device.friend_code == Some(code)))
    }

    async fn save(&self, device: &Device) -> JobResult<i64> {
        match self.devices.entry(device.id0.clone()) {
            Entry::Vacant(slot) => {
                if device.version != 0 {
                    return Err(JobError::Conflict);
                }
                let mut stored = device.clone();
                stored.version = 1;
                slot.insert(StoredDevice {
                    device: stored,
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                });
                Ok(1)
            }
            Entry::Occupied(mut slot) => {
                if slot.get().device.version != device.version {
                    return Err(JobError::Conflict);
                }
                let version = device.version + 1;
                let mut stored = device.clone();
                stored.version = version;
                slot.get_mut().device = stored;
                Ok(version)
            }
        }
    }

    async fn pending_friend_codes(&self) -> JobResult<Vec<FriendCode>> {
        Ok(self
            .select(|device| device.stage == DeviceStage::AwaitingAdd)
            .into_iter()
            .filter_map(|device| device.friend_code)
            .collect())
    }

    async fn next_queued(&self) -> JobResult<Option<Id0>> {
        Ok(self
            .select(|device| device.stage == DeviceStage::Queued)
            .into_iter()
            .next()
            .map(|device| device.id0))
    }

    async fn active_lease(&self, miner: &MinerId, now_ms: i64) -> JobResult<Option<Id0>> {
        Ok(self
            .select(|device| match &device.stage {
                DeviceStage::Leased {
                    miner: holder,
                    expires_at_ms,
                } => holder == miner && *expires_at_ms > now_ms,
                _ => false,
            })
            .into_iter()
            .next()
            .map(|device| device.id0))
    }

    async fn reclaim_candidates(&self, now_ms: i64) -> JobResult<Vec<Device>> {
        Ok(self.select(|device| {
            let flags = device.flags();
            flags.wants_bf
                && !flags.has_movable
                && (device.check_time_ms.is_some_and(|t| t < now_ms)
                    || flags.expiry_time_ms.is_some_and(|t| t < now_ms)
                    || flags.expired)
        }))
    }

    async fn counters(&self, now_ms: i64) -> JobResult<DeviceCounters> {
        let mut counters = DeviceCounters::default();
        for entry in self.devices.iter() {
            counters.record(&entry.device, now_ms);
        }
        Ok(counters)
    }
}
