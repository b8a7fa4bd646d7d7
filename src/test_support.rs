//! Shared fixtures for unit tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::OnceLock;
use tempfile::TempDir;

const FAKE_ELM: &str = include_str!("../tests/fixtures/fake-elm.sh");

/// Path to an executable stand-in for the toolchain.
///
/// Written once per test binary, before anything is spawned, so no forked
/// child can hold the script open for writing when it is exec'd.
pub fn fake_toolchain() -> PathBuf {
    static DIR: OnceLock<TempDir> = OnceLock::new();
    let dir = DIR.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elm");
        fs::write(&path, FAKE_ELM).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        dir
    });
    dir.path().join("elm")
}

/// A readable project manifest in its own directory.
pub fn project_manifest() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("elm.json");
    fs::write(&path, r#"{"type":"application"}"#).unwrap();
    (dir, path)
}
