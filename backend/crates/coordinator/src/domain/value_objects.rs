//! Domain Value Objects

use crate::domain::services;
use crate::error::{JobError, JobResult};
use serde::Serialize;
use std::fmt;

pub use reputation::MinerId;

/// Length of an id0 in hex characters
pub const ID0_LEN: usize = 32;

/// Length of an LFCS seed in bytes
pub const LFCS_LEN: usize = 8;

// ============================================================================
// Id0
// ============================================================================

/// Device identifier: 32 hexadecimal characters
///
/// The original casing is kept; it is the key devices, miners and the bot
/// all use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Id0(String);

impl Id0 {
    pub fn parse(raw: &str) -> JobResult<Self> {
        if services::is_valid_id0(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(JobError::InvalidId0)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id0 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Friend code
// ============================================================================

/// 40-bit account number with an embedded checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FriendCode(u64);

impl FriendCode {
    /// Parse a decimal friend code submitted by a device and verify it
    pub fn parse(raw: &str) -> JobResult<Self> {
        let code: u64 = raw.trim().parse().map_err(|_| JobError::InvalidFriendCode)?;
        if services::verify_friend_code(code) {
            Ok(Self(code))
        } else {
            Err(JobError::InvalidFriendCode)
        }
    }

    /// Parse a friend code echoed back by the bot
    ///
    /// The bot only ever echoes codes it got from `/getfcs`, so the checksum
    /// is not re-verified.
    pub fn parse_unchecked(raw: &str) -> JobResult<Self> {
        raw.trim()
            .parse()
            .map(Self)
            .map_err(|_| JobError::InvalidFriendCode)
    }

    pub(crate) fn from_stored(value: i64) -> Self {
        Self(value as u64)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Column value (friend codes fit in 40 bits)
    pub(crate) fn to_stored(self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for FriendCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// LFCS
// ============================================================================

/// 8-byte seed bound to a friend code
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lfcs([u8; LFCS_LEN]);

impl Lfcs {
    /// Extract the LFCS from a device's part1 blob: the first 8 bytes,
    /// byte-reversed. An all-zero seed is rejected.
    pub fn from_part1(part1: &[u8]) -> JobResult<Self> {
        let head = part1
            .get(..LFCS_LEN)
            .ok_or(JobError::InvalidPart1("shorter than 8 bytes"))?;

        let mut bytes = [0u8; LFCS_LEN];
        bytes.copy_from_slice(head);
        bytes.reverse();

        if bytes == [0u8; LFCS_LEN] {
            return Err(JobError::InvalidPart1("empty LFCS"));
        }
        Ok(Self(bytes))
    }

    /// Parse the hex LFCS reported by the bot. Up to 8 bytes are copied and
    /// the first three are always zeroed.
    pub fn from_bot_hex(raw: &str) -> JobResult<Self> {
        let decoded = platform::crypto::from_hex(raw.trim()).map_err(|_| JobError::InvalidLfcs)?;

        let mut bytes = [0u8; LFCS_LEN];
        let len = decoded.len().min(LFCS_LEN);
        bytes[..len].copy_from_slice(&decoded[..len]);
        bytes[..3].fill(0);

        Ok(Self(bytes))
    }

    pub(crate) fn from_stored(raw: &[u8]) -> JobResult<Self> {
        <[u8; LFCS_LEN]>::try_from(raw)
            .map(Self)
            .map_err(|_| JobError::Internal(format!("stored LFCS has {} bytes", raw.len())))
    }

    pub fn as_bytes(&self) -> &[u8; LFCS_LEN] {
        &self.0
    }
}

impl fmt::Debug for Lfcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lfcs({})", platform::crypto::to_hex(&self.0))
    }
}

// ============================================================================
// Status
// ============================================================================

/// Status word pushed to devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    #[serde(rename = "flag")]
    Flag,
    #[serde(rename = "friendCodeInvalid")]
    FriendCodeInvalid,
    #[serde(rename = "couldBeID1")]
    CouldBeId1,
    #[serde(rename = "queue")]
    Queue,
    #[serde(rename = "friendCodeProcessing")]
    FriendCodeProcessing,
    #[serde(rename = "bruteforcing")]
    Bruteforcing,
    #[serde(rename = "movablePart1")]
    MovablePart1,
    #[serde(rename = "friendCodeAdded")]
    FriendCodeAdded,
    #[serde(rename = "done")]
    Done,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Flag => "flag",
            Status::FriendCodeInvalid => "friendCodeInvalid",
            Status::CouldBeId1 => "couldBeID1",
            Status::Queue => "queue",
            Status::FriendCodeProcessing => "friendCodeProcessing",
            Status::Bruteforcing => "bruteforcing",
            Status::MovablePart1 => "movablePart1",
            Status::FriendCodeAdded => "friendCodeAdded",
            Status::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
