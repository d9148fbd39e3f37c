//! Configuration management.
//!
//! Loads configuration from environment variables using dotenvy.
//! Settings are read once at startup and shared behind an `Arc`.

mod error;
mod settings;

pub use error::{GateError, Result};
pub use settings::{Config, EnvFileSettings, LogFormat};
