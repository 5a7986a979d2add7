//! Presentation Layer
//!
//! HTTP handlers for miners and the bot, the device push channel, DTOs and
//! the router.

pub mod dto;
pub mod handlers;
pub mod router;
pub mod socket;
