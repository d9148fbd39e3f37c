//! Fixed-window rate limiting keyed by arbitrary strings (usually client IPs).
//!
//! Each key gets a counter that starts on first use and resets entirely once
//! its window has elapsed. Expired records are dropped lazily on access, in an
//! eager sweep once the map grows past `cleanup_threshold`, and by explicit
//! [`RateLimiter::cleanup`] calls from the host.

use crate::config::{GateError, Result};
use crate::core::clock::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Window, threshold and sweep settings for a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Window length in milliseconds, counted from the first hit.
    pub window_ms: u64,
    /// Hits allowed per window.
    pub max_attempts: u32,
    /// Map size above which a full expiry sweep runs before a check.
    pub cleanup_threshold: usize,
}

impl RateLimitConfig {
    /// Per-IP connection limiting: 10 connections per minute.
    #[must_use]
    pub const fn connection() -> Self {
        Self {
            window_ms: 60_000,
            max_attempts: 10,
            cleanup_threshold: 1000,
        }
    }

    /// Invite brute-force protection: 10 failures per hour.
    ///
    /// Pair `check(key, false)` with [`RateLimiter::record_failure`] so that
    /// successful attempts do not consume the budget.
    #[must_use]
    pub const fn invite() -> Self {
        Self {
            window_ms: 3_600_000,
            max_attempts: 10,
            cleanup_threshold: 500,
        }
    }

    /// Replaces the window length in milliseconds.
    #[must_use]
    pub const fn with_window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Replaces the number of hits allowed per window.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Replaces the map size that triggers an eager sweep.
    #[must_use]
    pub const fn with_cleanup_threshold(mut self, cleanup_threshold: usize) -> Self {
        self.cleanup_threshold = cleanup_threshold;
        self
    }

    /// Checks that every setting is positive.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidArgument` naming the first zero setting.
    pub fn validate(&self) -> Result<()> {
        if self.window_ms == 0 {
            return Err(GateError::invalid("windowMs must be a positive integer"));
        }
        if self.max_attempts == 0 {
            return Err(GateError::invalid("maxAttempts must be a positive integer"));
        }
        if self.cleanup_threshold == 0 {
            return Err(GateError::invalid(
                "cleanupThreshold must be a positive integer",
            ));
        }
        Ok(())
    }
}

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Seconds until the window resets, only set when blocked.
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    reset_at_ms: u64,
}

impl RateLimitRecord {
    fn start(now: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            reset_at_ms: now.saturating_add(window_ms),
        }
    }

    fn is_expired(&self, now: u64) -> bool {
        now >= self.reset_at_ms
    }
}

type Records = HashMap<String, RateLimitRecord>;

fn sweep(records: &mut Records, now: u64) -> usize {
    let before = records.len();
    records.retain(|_, record| !record.is_expired(now));
    before - records.len()
}

/// Per-key fixed-window counter.
///
/// Clones share the same records, so one limiter can be handed to several
/// connection handlers.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    records: Arc<Mutex<Records>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Creates a new `RateLimiter` backed by the system clock.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidArgument` if any setting is zero.
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a new `RateLimiter` reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidArgument` if any setting is zero.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            records: Arc::new(Mutex::new(HashMap::new())),
            clock,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks `key` against its window, counting this hit when `increment` is set.
    ///
    /// With `increment == false` nothing is recorded. A key with no record then
    /// reports `max_attempts - 1` remaining, the same as a first counted hit.
    pub fn check(&self, key: &str, increment: bool) -> RateLimitDecision {
        let now = self.clock.now_ms();
        let max = self.config.max_attempts;
        let mut records = self.lock();

        if records.len() > self.config.cleanup_threshold {
            let swept = sweep(&mut records, now);
            debug!(swept, remaining = records.len(), "Eager rate limit sweep");
        }

        if records.get(key).is_some_and(|r| r.is_expired(now)) {
            records.remove(key);
        }

        if let Some(record) = records.get_mut(key) {
            if record.count >= max {
                let retry_after = (record.reset_at_ms - now).div_ceil(1000);
                warn!(
                    key = key,
                    count = record.count,
                    retry_after_secs = retry_after,
                    "Rate limit exceeded"
                );
                return RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    retry_after_secs: Some(retry_after),
                };
            }
            if increment {
                record.count += 1;
            }
            return RateLimitDecision {
                allowed: true,
                remaining: max - record.count,
                retry_after_secs: None,
            };
        }

        if increment {
            records.insert(
                key.to_string(),
                RateLimitRecord::start(now, self.config.window_ms),
            );
        }
        RateLimitDecision {
            allowed: true,
            remaining: max - 1,
            retry_after_secs: None,
        }
    }

    /// Counts a failed attempt for `key`, starting a new window if needed.
    pub fn record_failure(&self, key: &str) {
        let now = self.clock.now_ms();
        let mut records = self.lock();

        if records.len() > self.config.cleanup_threshold {
            sweep(&mut records, now);
        }

        if let Some(record) = records.get_mut(key).filter(|r| !r.is_expired(now)) {
            record.count = record.count.saturating_add(1);
            return;
        }
        records.insert(
            key.to_string(),
            RateLimitRecord::start(now, self.config.window_ms),
        );
    }

    /// Drops every expired record and returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now_ms();
        let mut records = self.lock();
        let swept = sweep(&mut records, now);
        if swept > 0 {
            debug!(swept, remaining = records.len(), "Rate limit cleanup");
        }
        swept
    }

    /// Forgets `key` entirely.
    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Number of tracked keys, including expired ones not yet swept.
    #[must_use]
    pub fn size(&self) -> usize {
        self.lock().len()
    }
}
