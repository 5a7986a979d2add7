//! Domain Entities
//!
//! A device moves through one pipeline:
//!
//! ```text
//! New -> AwaitingAdd -> AwaitingPart1 -> Part1Ready -> Queued <-> Leased -> Done
//!                                                        \          /
//!                                                         Expired / Cancelled
//! ```
//!
//! Application code works on [`DeviceStage`] only and changes it through
//! [`Device::apply`]. The stored flag columns are derived from the stage at
//! the persistence boundary ([`DeviceStage::flags`], [`DeviceStage::from_flags`]).

use crate::domain::value_objects::{FriendCode, Id0, Lfcs, MinerId, Status};
use platform::archive::MSED_PART_LEN;

// ============================================================================
// Stage
// ============================================================================

/// Pipeline position of a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStage {
    New,
    /// Friend code known, waiting for the bot to add it
    AwaitingAdd,
    /// Bot added the friend code, waiting for the LFCS
    AwaitingPart1,
    /// LFCS known, brute-forcing not requested yet
    Part1Ready,
    Queued,
    Leased {
        miner: MinerId,
        expires_at_ms: i64,
    },
    Done,
    Expired,
    Cancelled,
}

impl DeviceStage {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceStage::New => "new",
            DeviceStage::AwaitingAdd => "awaiting_add",
            DeviceStage::AwaitingPart1 => "awaiting_part1",
            DeviceStage::Part1Ready => "part1_ready",
            DeviceStage::Queued => "queued",
            DeviceStage::Leased { .. } => "leased",
            DeviceStage::Done => "done",
            DeviceStage::Expired => "expired",
            DeviceStage::Cancelled => "cancelled",
        }
    }

    /// Status reported to the device
    pub fn status(&self) -> Status {
        match self {
            DeviceStage::New | DeviceStage::AwaitingAdd => Status::FriendCodeProcessing,
            DeviceStage::AwaitingPart1 => Status::FriendCodeAdded,
            DeviceStage::Part1Ready => Status::MovablePart1,
            DeviceStage::Queued => Status::Queue,
            DeviceStage::Leased { .. } => Status::Bruteforcing,
            DeviceStage::Done => Status::Done,
            DeviceStage::Expired | DeviceStage::Cancelled => Status::Flag,
        }
    }

    /// Stored flags for this stage
    pub fn flags(&self, has_lfcs: bool) -> DeviceFlags {
        DeviceFlags {
            has_part1: has_lfcs,
            has_movable: matches!(self, DeviceStage::Done),
            has_added: !matches!(self, DeviceStage::New | DeviceStage::AwaitingAdd),
            wants_bf: matches!(self, DeviceStage::Queued | DeviceStage::Leased { .. }),
            expired: matches!(self, DeviceStage::Expired),
            cancelled: matches!(self, DeviceStage::Cancelled),
            expiry_time_ms: match self {
                DeviceStage::Leased { expires_at_ms, .. } => Some(*expires_at_ms),
                _ => None,
            },
        }
    }

    /// Stage for stored flags, first match wins
    pub fn from_flags(
        flags: &DeviceFlags,
        has_friend_code: bool,
        miner: Option<&MinerId>,
    ) -> Self {
        if flags.has_movable {
            DeviceStage::Done
        } else if flags.cancelled {
            DeviceStage::Cancelled
        } else if flags.expired {
            DeviceStage::Expired
        } else if flags.has_part1 && flags.wants_bf {
            match flags.expiry_time_ms {
                Some(expires_at_ms) => DeviceStage::Leased {
                    miner: miner.cloned().unwrap_or_else(|| MinerId::new("")),
                    expires_at_ms,
                },
                None => DeviceStage::Queued,
            }
        } else if flags.has_part1 {
            DeviceStage::Part1Ready
        } else if flags.has_added {
            DeviceStage::AwaitingPart1
        } else if has_friend_code {
            DeviceStage::AwaitingAdd
        } else {
            DeviceStage::New
        }
    }
}

/// Flag columns of the `devices` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceFlags {
    pub has_part1: bool,
    pub has_movable: bool,
    pub has_added: bool,
    pub wants_bf: bool,
    pub expired: bool,
    pub cancelled: bool,
    pub expiry_time_ms: Option<i64>,
}

// ============================================================================
// Events
// ============================================================================

/// Something that happened to a device
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    FriendCodeSubmitted(FriendCode),
    Part1Submitted(Lfcs),
    BotAdded,
    LfcsFound(Lfcs),
    BruteforceRequested,
    UserCancelled,
    Claimed {
        miner: MinerId,
        expires_at_ms: i64,
    },
    Heartbeat {
        miner: MinerId,
        now_ms: i64,
        check_until_ms: i64,
    },
    /// `/cancel` from a miner: `expire` kills the job, otherwise it is requeued
    Killed {
        expire: bool,
    },
    ResultSubmitted {
        movable: Vec<u8>,
        ms_data: Option<[u8; MSED_PART_LEN]>,
    },
    SoftReclaim,
    HardReclaim,
}

impl DeviceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceEvent::FriendCodeSubmitted(_) => "friend_code_submitted",
            DeviceEvent::Part1Submitted(_) => "part1_submitted",
            DeviceEvent::BotAdded => "bot_added",
            DeviceEvent::LfcsFound(_) => "lfcs_found",
            DeviceEvent::BruteforceRequested => "bruteforce_requested",
            DeviceEvent::UserCancelled => "user_cancelled",
            DeviceEvent::Claimed { .. } => "claimed",
            DeviceEvent::Heartbeat { .. } => "heartbeat",
            DeviceEvent::Killed { .. } => "killed",
            DeviceEvent::ResultSubmitted { .. } => "result_submitted",
            DeviceEvent::SoftReclaim => "soft_reclaim",
            DeviceEvent::HardReclaim => "hard_reclaim",
        }
    }
}

/// Event not allowed in the current stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub stage: &'static str,
    pub event: &'static str,
}

impl From<TransitionError> for crate::error::JobError {
    fn from(err: TransitionError) -> Self {
        crate::error::JobError::Transition {
            stage: err.stage,
            event: err.event,
        }
    }
}

// ============================================================================
// Device
// ============================================================================

/// A device record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id0: Id0,
    pub friend_code: Option<FriendCode>,
    pub lfcs: Option<Lfcs>,
    /// movable.sed, padded to 0x140 bytes
    pub movable: Option<Vec<u8>>,
    /// msed part uploaded with the result
    pub ms_data: Option<[u8; MSED_PART_LEN]>,
    pub stage: DeviceStage,
    /// Heartbeat deadline of the current lease
    pub check_time_ms: Option<i64>,
    /// Last miner that claimed the device
    pub miner: Option<MinerId>,
    /// Optimistic concurrency token, 0 until first saved
    pub version: i64,
}

impl Device {
    /// A device seen for the first time
    pub fn new(id0: Id0) -> Self {
        Self {
            id0,
            friend_code: None,
            lfcs: None,
            movable: None,
            ms_data: None,
            stage: DeviceStage::New,
            check_time_ms: None,
            miner: None,
            version: 0,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    pub fn status(&self) -> Status {
        self.stage.status()
    }

    pub fn flags(&self) -> DeviceFlags {
        self.stage.flags(self.lfcs.is_some())
    }

    /// Lease holder, if leased
    pub fn lease_holder(&self) -> Option<&MinerId> {
        match &self.stage {
            DeviceStage::Leased { miner, .. } => Some(miner),
            _ => None,
        }
    }

    /// Apply `event`, or leave the device untouched and return an error
    pub fn apply(&mut self, event: DeviceEvent) -> Result<(), TransitionError> {
        use DeviceStage as S;

        let rejected = TransitionError {
            stage: self.stage.name(),
            event: event.name(),
        };

        match event {
            DeviceEvent::FriendCodeSubmitted(code) => match self.stage {
                S::New | S::AwaitingAdd | S::AwaitingPart1 | S::Part1Ready | S::Cancelled => {
                    self.friend_code = Some(code);
                    self.lfcs = None;
                    self.check_time_ms = None;
                    self.stage = S::AwaitingAdd;
                }
                _ => return Err(rejected),
            },

            DeviceEvent::Part1Submitted(lfcs) => match self.stage {
                S::New
                | S::AwaitingAdd
                | S::AwaitingPart1
                | S::Part1Ready
                | S::Queued
                | S::Cancelled => {
                    self.lfcs = Some(lfcs);
                    self.check_time_ms = None;
                    self.stage = S::Queued;
                }
                _ => return Err(rejected),
            },

            DeviceEvent::BotAdded => match self.stage {
                S::AwaitingAdd => self.stage = S::AwaitingPart1,
                _ => return Err(rejected),
            },

            DeviceEvent::LfcsFound(lfcs) => match self.stage {
                S::AwaitingAdd | S::AwaitingPart1 => {
                    self.lfcs = Some(lfcs);
                    self.stage = S::Part1Ready;
                }
                _ => return Err(rejected),
            },

            DeviceEvent::BruteforceRequested => match self.stage {
                S::Part1Ready | S::Queued => self.stage = S::Queued,
                S::Cancelled if self.lfcs.is_some() => {
                    self.check_time_ms = None;
                    self.stage = S::Queued;
                }
                _ => return Err(rejected),
            },

            DeviceEvent::UserCancelled => match self.stage {
                S::AwaitingAdd
                | S::AwaitingPart1
                | S::Part1Ready
                | S::Queued
                | S::Leased { .. } => self.stage = S::Cancelled,
                _ => return Err(rejected),
            },

            DeviceEvent::Claimed {
                miner,
                expires_at_ms,
            } => match self.stage {
                S::Queued => {
                    self.miner = Some(miner.clone());
                    self.check_time_ms = None;
                    self.stage = S::Leased {
                        miner,
                        expires_at_ms,
                    };
                }
                _ => return Err(rejected),
            },

            DeviceEvent::Heartbeat {
                miner,
                now_ms,
                check_until_ms,
            } => match &self.stage {
                S::Leased {
                    miner: holder,
                    expires_at_ms,
                } if *holder == miner && *expires_at_ms > now_ms => {
                    self.check_time_ms = Some(check_until_ms);
                }
                _ => return Err(rejected),
            },

            DeviceEvent::Killed { expire } => match self.stage {
                S::Done => {}
                _ if expire => {
                    self.check_time_ms = None;
                    self.stage = S::Expired;
                }
                _ if self.lfcs.is_some() => {
                    self.check_time_ms = None;
                    self.stage = S::Queued;
                }
                _ => return Err(rejected),
            },

            DeviceEvent::ResultSubmitted { movable, ms_data } => {
                self.movable = Some(movable);
                if ms_data.is_some() {
                    self.ms_data = ms_data;
                }
                self.check_time_ms = None;
                self.stage = S::Done;
            }

            DeviceEvent::SoftReclaim => match self.stage {
                S::Leased { .. } => {
                    self.check_time_ms = None;
                    self.stage = S::Queued;
                }
                _ => return Err(rejected),
            },

            DeviceEvent::HardReclaim => match self.stage {
                S::Queued | S::Leased { .. } | S::Expired => self.stage = S::Expired,
                _ => return Err(rejected),
            },
        }

        Ok(())
    }
}

/// Counts pushed to every device with each status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCounters {
    /// Queued devices
    pub user_count: u64,
    /// Leased devices whose lease has not run out
    pub mining_count: u64,
    /// Devices with an LFCS
    pub p1_count: u64,
    /// Devices with a movable.sed
    pub ms_count: u64,
    pub total_count: u64,
}

impl DeviceCounters {
    /// Add one device to the counts
    pub fn record(&mut self, device: &Device, now_ms: i64) {
        self.total_count += 1;
        if device.lfcs.is_some() {
            self.p1_count += 1;
        }
        match &device.stage {
            DeviceStage::Queued => self.user_count += 1,
            DeviceStage::Leased { expires_at_ms, .. } if *expires_at_ms > now_ms => {
                self.mining_count += 1
            }
            DeviceStage::Done => self.ms_count += 1,
            _ => {}
        }
    }
}
