//! Logging setup for host processes.
//!
//! The library itself only emits `tracing` events; a host calls
//! [`init_tracing`] once at startup to install a subscriber.

use crate::config::{GateError, LogFormat, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber writing to stdout through a non-blocking worker.
///
/// Filtering follows `RUST_LOG`. Keep the returned guard alive for the life of
/// the process; dropping it flushes and stops the writer.
///
/// # Errors
///
/// Returns `GateError::Config` if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> Result<WorkerGuard> {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking);

    let installed = match format {
        LogFormat::Pretty => subscriber.try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };
    installed.map_err(|e| GateError::Config(format!("failed to install logger: {e}")))?;

    Ok(guard)
}
