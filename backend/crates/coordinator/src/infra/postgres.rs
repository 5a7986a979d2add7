//! PostgreSQL Device Registry

use crate::domain::entities::{Device, DeviceCounters, DeviceFlags, DeviceStage};
use crate::domain::repository::DeviceRepository;
use crate::domain::value_objects::{FriendCode, Id0, Lfcs, MinerId};
use crate::error::{JobError, JobResult};
use platform::archive::MSED_PART_LEN;
use sqlx::PgPool;

const DEVICE_COLUMNS: &str = r#"
    id0,
    friend_code,
    lfcs,
    msed,
    ms_data,
    has_part1,
    has_movable,
    has_added,
    wants_bf,
    expired,
    cancelled,
    expiry_time_ms,
    check_time_ms,
    miner,
    version
"#;

/// Live (not done, cancelled or expired) devices
const LIVE: &str = "NOT has_movable AND NOT cancelled AND NOT expired";

/// PostgreSQL-backed device repository
#[derive(Clone)]
pub struct PgDeviceRepository {
    pool: PgPool,
}

impl PgDeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, device: &Device, flags: &DeviceFlags) -> JobResult<i64> {
        let version = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO devices (
                id0, friend_code, lfcs, msed, ms_data,
                has_part1, has_movable, has_added, wants_bf, expired, cancelled,
                expiry_time_ms, check_time_ms, miner, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 1)
            ON CONFLICT (id0) DO NOTHING
            RETURNING version
            "#,
        )
        .bind(device.id0.as_str())
        .bind(device.friend_code.map(FriendCode::to_stored))
        .bind(device.lfcs.as_ref().map(|l| l.as_bytes().to_vec()))
        .bind(device.movable.as_deref())
        .bind(device.ms_data.as_ref().map(|m| m.to_vec()))
        .bind(flags.has_part1)
        .bind(flags.has_movable)
        .bind(flags.has_added)
        .bind(flags.wants_bf)
        .bind(flags.expired)
        .bind(flags.cancelled)
        .bind(flags.expiry_time_ms)
        .bind(device.check_time_ms)
        .bind(device.miner.as_ref().map(MinerId::as_str))
        .fetch_optional(&self.pool)
        .await?;

        version.ok_or(JobError::Conflict)
    }

    async fn update(&self, device: &Device, flags: &DeviceFlags) -> JobResult<i64> {
        let version = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE devices SET
                friend_code = $3,
                lfcs = $4,
                msed = $5,
                ms_data = $6,
                has_part1 = $7,
                has_movable = $8,
                has_added = $9,
                wants_bf = $10,
                expired = $11,
                cancelled = $12,
                expiry_time_ms = $13,
                check_time_ms = $14,
                miner = $15,
                version = version + 1,
                updated_at = NOW()
            WHERE id0 = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(device.id0.as_str())
        .bind(device.version)
        .bind(device.friend_code.map(FriendCode::to_stored))
        .bind(device.lfcs.as_ref().map(|l| l.as_bytes().to_vec()))
        .bind(device.movable.as_deref())
        .bind(device.ms_data.as_ref().map(|m| m.to_vec()))
        .bind(flags.has_part1)
        .bind(flags.has_movable)
        .bind(flags.has_added)
        .bind(flags.wants_bf)
        .bind(flags.expired)
        .bind(flags.cancelled)
        .bind(flags.expiry_time_ms)
        .bind(device.check_time_ms)
        .bind(device.miner.as_ref().map(MinerId::as_str))
        .fetch_optional(&self.pool)
        .await?;

        version.ok_or(JobError::Conflict)
    }
}

impl DeviceRepository for PgDeviceRepository {
    async fn find(&self, id0: &Id0) -> JobResult<Option<Device>> {
        let row = sqlx::query_as::<_, DeviceRow>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id0 = $1"
        ))
        .bind(id0.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeviceRow::into_device).transpose()
    }

    async fn find_by_friend_code(&self, code: FriendCode) -> JobResult<Vec<Device>> {
        let rows = sqlx::query_as::<_, DeviceRow>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE friend_code = $1 ORDER BY created_at"
        ))
        .bind(code.to_stored())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DeviceRow::into_device).collect()
    }

    async fn save(&self, device: &Device) -> JobResult<i64> {
        let flags = device.flags();
        let version = if device.is_persisted() {
            self.update(device, &flags).await?
        } else {
            self.insert(device, &flags).await?
        };

        tracing::debug!(
            id0 = %device.id0,
            stage = device.stage.name(),
            version,
            "Device saved"
        );

        Ok(version)
    }

    async fn pending_friend_codes(&self) -> JobResult<Vec<FriendCode>> {
        let codes = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT friend_code FROM devices
            WHERE {LIVE}
              AND NOT has_part1
              AND NOT has_added
              AND friend_code IS NOT NULL
            ORDER BY created_at
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(codes.into_iter().map(FriendCode::from_stored).collect())
    }

    async fn next_queued(&self) -> JobResult<Option<Id0>> {
        let id0 = sqlx::query_scalar::<_, String>(&format!(
            r#"
            SELECT id0 FROM devices
            WHERE {LIVE}
              AND has_part1
              AND wants_bf
              AND expiry_time_ms IS NULL
            ORDER BY created_at
            LIMIT 1
            "#
        ))
        .fetch_optional(&self.pool)
        .await?;

        id0.map(|raw| stored_id0(&raw)).transpose()
    }

    async fn active_lease(&self, miner: &MinerId, now_ms: i64) -> JobResult<Option<Id0>> {
        let id0 = sqlx::query_scalar::<_, String>(&format!(
            r#"
            SELECT id0 FROM devices
            WHERE miner = $1
              AND {LIVE}
              AND has_part1
              AND wants_bf
              AND expiry_time_ms > $2
            LIMIT 1
            "#
        ))
        .bind(miner.as_str())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        id0.map(|raw| stored_id0(&raw)).transpose()
    }

    async fn reclaim_candidates(&self, now_ms: i64) -> JobResult<Vec<Device>> {
        let rows = sqlx::query_as::<_, DeviceRow>(&format!(
            r#"
            SELECT {DEVICE_COLUMNS} FROM devices
            WHERE wants_bf
              AND NOT has_movable
              AND (
                    (check_time_ms IS NOT NULL AND check_time_ms < $1)
                 OR (expiry_time_ms IS NOT NULL AND expiry_time_ms < $1)
                 OR expired
              )
            "#
        ))
        .bind(now_ms)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DeviceRow::into_device).collect()
    }

    async fn counters(&self, now_ms: i64) -> JobResult<DeviceCounters> {
        let row = sqlx::query_as::<_, CountersRow>(&format!(
            r#"
            SELECT
                COUNT(*) FILTER (
                    WHERE {LIVE} AND has_part1 AND wants_bf AND expiry_time_ms IS NULL
                ) AS user_count,
                COUNT(*) FILTER (
                    WHERE {LIVE} AND has_part1 AND wants_bf AND expiry_time_ms > $1
                ) AS mining_count,
                COUNT(*) FILTER (WHERE has_part1) AS p1_count,
                COUNT(*) FILTER (WHERE has_movable) AS ms_count,
                COUNT(*) AS total_count
            FROM devices
            "#
        ))
        .bind(now_ms)
        .fetch_one(&self.pool)
        .await?;

        Ok(DeviceCounters {
            user_count: row.user_count as u64,
            mining_count: row.mining_count as u64,
            p1_count: row.p1_count as u64,
            ms_count: row.ms_count as u64,
            total_count: row.total_count as u64,
        })
    }
}

fn stored_id0(raw: &str) -> JobResult<Id0> {
    Id0::parse(raw).map_err(|_| JobError::Internal(format!("stored id0 {raw:?} is malformed")))
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct DeviceRow {
    id0: String,
    friend_code: Option<i64>,
    lfcs: Option<Vec<u8>>,
    msed: Option<Vec<u8>>,
    ms_data: Option<Vec<u8>>,
    has_part1: bool,
    has_movable: bool,
    has_added: bool,
    wants_bf: bool,
    expired: bool,
    cancelled: bool,
    expiry_time_ms: Option<i64>,
    check_time_ms: Option<i64>,
    miner: Option<String>,
    version: i64,
}

impl DeviceRow {
    fn into_device(self) -> JobResult<Device> {
        let flags = DeviceFlags {
            has_part1: self.has_part1,
            has_movable: self.has_movable,
            has_added: self.has_added,
            wants_bf: self.wants_bf,
            expired: self.expired,
            cancelled: self.cancelled,
            expiry_time_ms: self.expiry_time_ms,
        };
        let miner = self.miner.map(MinerId::new);
        let stage = DeviceStage::from_flags(&flags, self.friend_code.is_some(), miner.as_ref());

        let lfcs = match self.lfcs {
            Some(raw) if self.has_part1 => Some(Lfcs::from_stored(&raw)?),
            _ => None,
        };

        let ms_data = self
            .ms_data
            .and_then(|raw| <[u8; MSED_PART_LEN]>::try_from(raw.as_slice()).ok());

        Ok(Device {
            id0: stored_id0(&self.id0)?,
            friend_code: self.friend_code.map(FriendCode::from_stored),
            lfcs,
            movable: self.msed,
            ms_data,
            stage,
            check_time_ms: self.check_time_ms,
            miner,
            version: self.version,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CountersRow {
    user_count: i64,
    mining_count: i64,
    p1_count: i64,
    ms_count: i64,
    total_count: i64,
}
