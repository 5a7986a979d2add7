//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Hashing and encoding helpers (SHA-1, SHA-256, Base64, hex)
//! - Client identity extraction from request headers
//! - The msed archive (filesystem collaborator for uploaded msed parts)

pub mod archive;
pub mod client;
pub mod crypto;
