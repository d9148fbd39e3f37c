//! Per-session credential hand-off.
//!
//! Writes `KEY=VALUE` env files readable only by the owner, and tracks them so
//! the host can remove them when a session ends.

mod env_file;
mod manager;

pub use env_file::{Credentials, SessionEnvFile, SessionEnvFileRequest, create_session_env_file};
pub use manager::EnvFileManager;
