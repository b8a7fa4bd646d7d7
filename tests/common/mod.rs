#![allow(dead_code)]

use axum::http::HeaderValue;
use buildbox::toolchain::Toolchain;
use buildbox::{AppState, Compiler, ProjectConfig};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

const FAKE_ELM: &str = include_str!("../fixtures/fake-elm.sh");

pub const MANIFEST: &str = r#"{"type":"application","source-directories":["src"]}"#;

/// Executable stand-in for the toolchain, written once per test binary.
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

/// Scratch root, shared manifest and a compiler wired to both.
pub struct Harness {
    pub scratch: TempDir,
    pub shared: TempDir,
    pub compiler: Compiler,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let scratch = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        fs::write(shared.path().join("elm.json"), MANIFEST).unwrap();

        let compiler = Compiler::new(
            scratch.path().to_path_buf(),
            ProjectConfig::load(&shared.path().join("elm.json")).unwrap(),
            Toolchain::new(fake_toolchain(), timeout, 64 * 1024),
        );
        Self {
            scratch,
            shared,
            compiler,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.shared.path().join("elm.json")
    }

    pub fn into_state(self) -> (TempDir, TempDir, AppState) {
        let state = AppState::new(
            self.compiler,
            HeaderValue::from_static("application/javascript"),
        );
        (self.scratch, self.shared, state)
    }
}

pub fn is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}
