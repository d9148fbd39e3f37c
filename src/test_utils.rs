//! Test utilities and shared fixtures.
//!
//! Common helpers for unit tests, reducing duplication across the codebase.

#[cfg(any(test, feature = "testing"))]
use crate::config::{Config, EnvFileSettings, LogFormat};
#[cfg(any(test, feature = "testing"))]
use crate::core::ratelimit::RateLimitConfig;
#[cfg(any(test, feature = "testing"))]
use crate::security::credentials::Credentials;
#[cfg(any(test, feature = "testing"))]
use std::path::Path;
#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;

/// Creates a configuration for testing purposes.
///
/// This configuration has:
/// - A fixed session secret
/// - Default connection and invite limits
/// - Credential files under `dir`
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_test_config(dir: &Path) -> Arc<Config> {
    Arc::new(Config {
        session_secret: "0000000000000000000000000000000000000000000000000000000000000000"
            .to_string(),
        session_token_max_age_ms: 3_600_000,
        connection_limit: RateLimitConfig::connection(),
        invite_limit: RateLimitConfig::invite(),
        env_files: EnvFileSettings::new(dir.join("container"), dir.join("host")),
        cleanup_interval_secs: 300,
        log_format: LogFormat::Pretty,
    })
}

/// Two non-empty credentials plus one empty and one absent entry.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn sample_credentials() -> Credentials {
    let mut credentials = Credentials::new()
        .with("QUEUE_USER", "player1")
        .with("QUEUE_EMPTY", "")
        .with("QUEUE_PASSWORD", "p4ss");
    credentials.set_optional("QUEUE_TOKEN", None);
    credentials
}
