//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (HMAC-SHA256, constant-time compare, Base64)
//! - Bearer credential extraction from HTTP headers

pub mod bearer;
pub mod crypto;
