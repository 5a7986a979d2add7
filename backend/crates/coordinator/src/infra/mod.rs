//! Infrastructure Layer
//!
//! Device registry implementations and the in-process state shared by
//! connections: push-channel sessions and miner activity windows.

pub mod activity;
pub mod memory;
pub mod postgres;
pub mod session;
