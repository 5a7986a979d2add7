//! Value Objects

pub mod miner_id;
pub mod miner_name;

pub use miner_id::MinerId;
pub use miner_name::{MINER_NAME_MAX_LENGTH, MinerName, MinerNameError};
