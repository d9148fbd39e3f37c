//! Session env files.

use crate::config::{GateError, Result};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Ordered credential set. Entries with an absent or empty value are skipped
/// when the file is written.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    entries: Vec<(String, Option<String>)>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, _)| key))
            .finish()
    }
}

impl Credentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, keeping its original position if already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set_optional(key, Some(value.into()));
    }

    pub fn set_optional(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the non-empty entries as `KEY=VALUE` lines with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidArgument` for an empty key, a key containing
    /// `=`, or a key or value containing a line break.
    pub fn render(&self) -> Result<String> {
        let mut lines = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            let Some(value) = value.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };
            if key.is_empty() || key.contains(['=', '\n', '\r']) {
                return Err(GateError::invalid(format!(
                    "credential key {key:?} is not a valid env name"
                )));
            }
            if value.contains(['\n', '\r']) {
                return Err(GateError::invalid(format!(
                    "credential {key} contains a line break"
                )));
            }
            lines.push(format!("{key}={value}"));
        }
        Ok(lines.join("\n") + "\n")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut credentials = Self::new();
        for (key, value) in iter {
            credentials.set(key, value);
        }
        credentials
    }
}

/// Inputs for [`create_session_env_file`].
#[derive(Debug, Clone, Copy)]
pub struct SessionEnvFileRequest<'a> {
    pub session_id: &'a str,
    /// Directory this process writes into.
    pub container_dir: &'a Path,
    /// The same directory as seen from the host side of a mount.
    pub host_dir: &'a Path,
    pub credentials: &'a Credentials,
}

/// Handle to a written env file. Call [`SessionEnvFile::cleanup`] to remove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnvFile {
    session_id: String,
    container_path: PathBuf,
    host_path: PathBuf,
}

impl SessionEnvFile {
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn container_path(&self) -> &Path {
        &self.container_path
    }

    #[must_use]
    pub fn host_path(&self) -> &Path {
        &self.host_path
    }

    /// Deletes the file. A file that is already gone is not an error; other
    /// failures are logged and swallowed.
    pub fn cleanup(&self) {
        match fs::remove_file(&self.container_path) {
            Ok(()) => debug!(
                session_id = %self.session_id,
                path = %self.container_path.display(),
                "Session env file removed"
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                session_id = %self.session_id,
                path = %self.container_path.display(),
                error = %e,
                "Failed to remove session env file"
            ),
        }
    }
}

fn check_session_id(session_id: &str) -> Result<()> {
    if session_id.is_empty() {
        return Err(GateError::invalid("sessionId must be a non-empty string"));
    }
    if session_id == "."
        || session_id == ".."
        || session_id.contains(['/', '\\', '\0'])
    {
        return Err(GateError::invalid(format!(
            "sessionId {session_id:?} cannot be used in a file name"
        )));
    }
    Ok(())
}

/// Unlinks a regular file or symlink already at `path`. The link itself is
/// removed, never its target. Directories are left for the open to reject.
fn remove_stale(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() || meta.is_file() => {
            debug!(path = %path.display(), "Removing stale session env file");
            fs::remove_file(path)
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

// create_new maps to O_CREAT|O_EXCL, which fails on any existing entry,
// including a symlink planted between remove_stale and the open.
#[cfg(unix)]
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    remove_stale(path)?;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    remove_stale(path)?;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

/// Writes `{container_dir}/session-{session_id}.env` with owner-only permissions.
///
/// # Errors
///
/// - `GateError::InvalidArgument` for an empty session id or directory, a
///   session id that is not a plain file name component, or malformed credentials.
/// - `GateError::DirectoryCreateFailed` if `container_dir` cannot be created.
/// - `GateError::FileWriteFailed` if the file cannot be written.
pub fn create_session_env_file(request: &SessionEnvFileRequest<'_>) -> Result<SessionEnvFile> {
    check_session_id(request.session_id)?;
    if request.container_dir.as_os_str().is_empty() {
        return Err(GateError::invalid("containerPath must be a non-empty path"));
    }
    if request.host_dir.as_os_str().is_empty() {
        return Err(GateError::invalid("hostPath must be a non-empty path"));
    }
    let content = request.credentials.render()?;

    fs::create_dir_all(request.container_dir).map_err(|source| {
        GateError::DirectoryCreateFailed {
            path: request.container_dir.to_path_buf(),
            source,
        }
    })?;

    let file_name = format!("session-{}.env", request.session_id);
    let container_path = request.container_dir.join(&file_name);
    let host_path = request.host_dir.join(&file_name);

    write_private(&container_path, &content).map_err(|source| GateError::FileWriteFailed {
        path: container_path.clone(),
        source,
    })?;

    debug!(
        session_id = request.session_id,
        path = %container_path.display(),
        "Session env file created"
    );

    Ok(SessionEnvFile {
        session_id: request.session_id.to_string(),
        container_path,
        host_path,
    })
}
