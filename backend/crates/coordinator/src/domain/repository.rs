//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use crate::domain::entities::{Device, DeviceCounters};
use crate::domain::value_objects::{FriendCode, Id0, MinerId};
use crate::error::JobResult;

/// Device registry
///
/// Saves are compare-and-swap on [`Device::version`]: a save succeeds only if
/// the stored version still equals the version the device was read with
/// (0 means "must not exist yet"), and returns the new version. Otherwise it
/// fails with `JobError::Conflict` and writes nothing.
#[trait_variant::make(DeviceRepository: Send)]
pub trait LocalDeviceRepository {
    /// Get a device by id0
    async fn find(&self, id0: &Id0) -> JobResult<Option<Device>>;

    /// All devices registered with a friend code, oldest first
    async fn find_by_friend_code(&self, code: FriendCode) -> JobResult<Vec<Device>>;

    /// Insert or update with version check. Returns the new version.
    async fn save(&self, device: &Device) -> JobResult<i64>;

    /// Friend codes of devices waiting for the bot
    async fn pending_friend_codes(&self) -> JobResult<Vec<FriendCode>>;

    /// Any one queued device
    async fn next_queued(&self) -> JobResult<Option<Id0>>;

    /// Device leased to `miner` whose lease still runs at `now_ms`, if any.
    /// A lapsed lease awaiting reclaim does not count.
    async fn active_lease(&self, miner: &MinerId, now_ms: i64) -> JobResult<Option<Id0>>;

    /// Devices wanting brute-forcing, without a result, whose heartbeat or
    /// lease ran out or which are flagged expired
    async fn reclaim_candidates(&self, now_ms: i64) -> JobResult<Vec<Device>>;

    /// Status counters
    async fn counters(&self, now_ms: i64) -> JobResult<DeviceCounters>;
}
