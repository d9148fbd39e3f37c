//! Library definitions.
//!
//! Security primitives shared by queue-manager services: signed session
//! tokens, per-key rate limiting, and owner-only credential env files.

pub mod config;
pub mod core;
pub mod security;
pub mod telemetry;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub use config::{Config, EnvFileSettings, GateError, LogFormat, Result};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::ratelimit::{RateLimitConfig, RateLimitDecision, RateLimiter};
pub use security::credentials::{
    Credentials, EnvFileManager, SessionEnvFile, SessionEnvFileRequest, create_session_env_file,
};
pub use security::crypto::{
    SessionClaims, TokenAge, TokenRejection, check_token_age, check_token_age_at,
    generate_session_id, generate_session_token, generate_session_token_at,
    validate_session_token,
};
pub use telemetry::init_tracing;
