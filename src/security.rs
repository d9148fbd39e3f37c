//! Security primitives.
//!
//! Provides signed session tokens and per-session credential files.

pub mod credentials;
pub mod crypto;
