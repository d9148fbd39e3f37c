//! Tracking of live session env files.

use super::env_file::{Credentials, SessionEnvFile, SessionEnvFileRequest, create_session_env_file};
use crate::config::{EnvFileSettings, Result};
use std::collections::HashMap;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Creates env files under fixed base directories and remembers them per session.
#[derive(Debug)]
pub struct EnvFileManager {
    settings: EnvFileSettings,
    files: Mutex<HashMap<String, SessionEnvFile>>,
}

impl EnvFileManager {
    /// Creates a manager and tries to create the base directory.
    ///
    /// A failure here is only logged; each later `create` retries the directory.
    #[must_use]
    pub fn new(settings: EnvFileSettings) -> Self {
        if let Err(e) = fs::create_dir_all(&settings.container_dir) {
            warn!(
                path = %settings.container_dir.display(),
                error = %e,
                "Failed to create env file directory"
            );
        }
        Self {
            settings,
            files: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EnvFileSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEnvFile>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes the env file for `session_id`, replacing any file already tracked for it.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`create_session_env_file`]. The previous file
    /// for the session has already been removed when an error is returned.
    pub fn create(&self, session_id: &str, credentials: &Credentials) -> Result<SessionEnvFile> {
        let mut files = self.lock();
        if let Some(stale) = files.remove(session_id) {
            debug!(session_id, "Replacing session env file");
            stale.cleanup();
        }

        let file = create_session_env_file(&SessionEnvFileRequest {
            session_id,
            container_dir: &self.settings.container_dir,
            host_dir: &self.settings.host_dir,
            credentials,
        })?;
        files.insert(session_id.to_string(), file.clone());
        Ok(file)
    }

    /// Removes and forgets the file for `session_id`. Returns whether one was tracked.
    pub fn cleanup(&self, session_id: &str) -> bool {
        let Some(file) = self.lock().remove(session_id) else {
            return false;
        };
        file.cleanup();
        true
    }

    /// Removes every tracked file and returns how many there were.
    pub fn cleanup_all(&self) -> usize {
        let files: Vec<SessionEnvFile> = self.lock().drain().map(|(_, file)| file).collect();
        for file in &files {
            file.cleanup();
        }
        if !files.is_empty() {
            debug!(count = files.len(), "Cleaned up all session env files");
        }
        files.len()
    }

    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<SessionEnvFile> {
        self.lock().get(session_id).cloned()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.lock().len()
    }
}
