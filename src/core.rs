//! Core system components.
//!
//! Contains the wall clock abstraction and per-key rate limiting.

pub mod clock;
pub mod ratelimit;
