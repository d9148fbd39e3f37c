use crate::common::game_credentials;
use queuegate::{
    EnvFileManager, EnvFileSettings, GateError, SessionEnvFileRequest, create_session_env_file,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_single_file_lifecycle() {
    let dir = TempDir::new().unwrap();
    let credentials = game_credentials();

    let file = create_session_env_file(&SessionEnvFileRequest {
        session_id: "q-17",
        container_dir: dir.path(),
        host_dir: Path::new("/var/lib/queue/sessions"),
        credentials: &credentials,
    })
    .unwrap();

    let content = fs::read_to_string(file.container_path()).unwrap();
    assert_eq!(
        content,
        "GAME_SERVER_HOST=play.example.net\nINVITE_CODE=XK-42\n"
    );
    assert!(!content.contains("GAME_SERVER_PASSWORD"));
    assert!(!content.contains("ADMIN_TOKEN"));
    assert_eq!(
        file.host_path(),
        Path::new("/var/lib/queue/sessions/session-q-17.env")
    );

    file.cleanup();
    file.cleanup();
    assert!(!file.container_path().exists());
}

#[cfg(unix)]
#[test]
fn test_file_has_no_group_or_other_bits() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let manager = EnvFileManager::new(EnvFileSettings::new(dir.path(), "/host"));
    let file = manager.create("perm", &game_credentials()).unwrap();

    let mode = fs::metadata(file.container_path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o077, 0, "mode {mode:o} grants group/other access");
    assert_eq!(mode & 0o600, 0o600);
}

#[test]
fn test_manager_session_lifecycle() {
    let dir = TempDir::new().unwrap();
    let container_dir = dir.path().join("sessions");
    let manager = EnvFileManager::new(EnvFileSettings::new(&container_dir, "/host/sessions"));
    assert!(container_dir.is_dir());

    let first = manager.create("alpha", &game_credentials()).unwrap();
    let second = manager.create("beta", &game_credentials()).unwrap();
    assert_eq!(manager.size(), 2);

    let replaced = manager
        .create("alpha", &queuegate::Credentials::new().with("ONLY", "this"))
        .unwrap();
    assert_eq!(replaced.container_path(), first.container_path());
    assert_eq!(
        fs::read_to_string(replaced.container_path()).unwrap(),
        "ONLY=this\n"
    );
    assert_eq!(manager.size(), 2);

    assert!(manager.cleanup("beta"));
    assert!(!second.container_path().exists());
    assert!(!manager.cleanup("beta"));

    assert_eq!(manager.cleanup_all(), 1);
    assert!(!replaced.container_path().exists());
    assert_eq!(manager.size(), 0);
    assert!(manager.get("alpha").is_none());
}

#[test]
fn test_path_traversal_rejected() {
    let dir = TempDir::new().unwrap();
    let manager = EnvFileManager::new(EnvFileSettings::new(dir.path(), "/host"));

    let err = manager.create("../../etc/cron.d/x", &game_credentials()).unwrap_err();
    assert!(matches!(err, GateError::InvalidArgument(_)));
    assert_eq!(manager.size(), 0);
}
