//! Configuration settings.
//!
//! Defines the main `Config` struct and environment variable loading logic.

use super::error::{GateError, Result};
use crate::core::ratelimit::RateLimitConfig;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_TOKEN_MAX_AGE_MS: u64 = 24 * 60 * 60 * 1000;
const DEFAULT_ENV_FILE_DIR: &str = "/tmp/queue-sessions";
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("pretty") {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Directories used for per-session credential files.
///
/// `container_dir` is where files are written by this process; `host_dir` is
/// the same directory as seen by whatever mounts it (e.g. a container runtime).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFileSettings {
    pub container_dir: PathBuf,
    pub host_dir: PathBuf,
}

impl EnvFileSettings {
    #[must_use]
    pub fn new(container_dir: impl Into<PathBuf>, host_dir: impl Into<PathBuf>) -> Self {
        Self {
            container_dir: container_dir.into(),
            host_dir: host_dir.into(),
        }
    }
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn get_env(key: &str) -> Result<String> {
    get_env_opt(key).ok_or_else(|| GateError::Config(format!("{key} must be set in environment")))
}

fn get_env_or(key: &str, default: &str) -> String {
    get_env_opt(key).unwrap_or_else(|| default.to_string())
}

fn get_env_parsed_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match get_env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| GateError::Config(format!("{key} must be a valid number, got {raw:?}"))),
        None => Ok(default),
    }
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret key for session token signing.
    pub session_secret: String,
    /// Maximum accepted session token age in milliseconds.
    pub session_token_max_age_ms: u64,
    /// Per-IP connection limiting.
    pub connection_limit: RateLimitConfig,
    /// Per-IP invite brute-force protection.
    pub invite_limit: RateLimitConfig,
    /// Credential file locations.
    pub env_files: EnvFileSettings,
    /// How often the host should sweep limiters and stale files.
    pub cleanup_interval_secs: u64,
    /// Logging format.
    pub log_format: LogFormat,
}

impl Config {
    /// Loads `.env` (if present) and then the configuration from the environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn load() -> Result<Arc<Self>> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Config` if `SESSION_SECRET` is missing, if a numeric
    /// variable cannot be parsed, or if a rate limit setting is zero.
    pub fn from_env() -> Result<Arc<Self>> {
        let session_secret = get_env("SESSION_SECRET")?;
        let session_token_max_age_ms =
            get_env_parsed_or("SESSION_TOKEN_MAX_AGE_MS", DEFAULT_TOKEN_MAX_AGE_MS)?;

        let connection_defaults = RateLimitConfig::connection();
        let connection_limit = connection_defaults
            .with_window_ms(get_env_parsed_or(
                "CONNECTION_WINDOW_MS",
                connection_defaults.window_ms,
            )?)
            .with_max_attempts(get_env_parsed_or(
                "MAX_CONNECTIONS",
                connection_defaults.max_attempts,
            )?)
            .with_cleanup_threshold(get_env_parsed_or(
                "CONNECTION_CLEANUP_THRESHOLD",
                connection_defaults.cleanup_threshold,
            )?);

        let invite_defaults = RateLimitConfig::invite();
        let invite_limit = invite_defaults
            .with_window_ms(get_env_parsed_or(
                "INVITE_WINDOW_MS",
                invite_defaults.window_ms,
            )?)
            .with_max_attempts(get_env_parsed_or(
                "INVITE_MAX_ATTEMPTS",
                invite_defaults.max_attempts,
            )?)
            .with_cleanup_threshold(get_env_parsed_or(
                "INVITE_CLEANUP_THRESHOLD",
                invite_defaults.cleanup_threshold,
            )?);

        for (name, limit) in [("connection", &connection_limit), ("invite", &invite_limit)] {
            limit
                .validate()
                .map_err(|e| GateError::Config(format!("{name} limit: {e}")))?;
        }

        let container_dir = get_env_or("ENV_FILE_CONTAINER_DIR", DEFAULT_ENV_FILE_DIR);
        let host_dir = get_env_or("ENV_FILE_HOST_DIR", &container_dir);

        Ok(Arc::new(Self {
            session_secret,
            session_token_max_age_ms,
            connection_limit,
            invite_limit,
            env_files: EnvFileSettings::new(container_dir, host_dir),
            cleanup_interval_secs: get_env_parsed_or(
                "CLEANUP_INTERVAL_SECS",
                DEFAULT_CLEANUP_INTERVAL_SECS,
            )?,
            log_format: LogFormat::from_str(&get_env_or("LOG_FORMAT", "json")),
        }))
    }
}
