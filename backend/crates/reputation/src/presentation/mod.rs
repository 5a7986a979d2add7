//! Presentation Layer
//!
//! HTTP handlers, DTOs and the admission filter.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
