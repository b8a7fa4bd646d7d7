//! Infrastructure failures raised while preparing or running a build.
//!
//! Anything in here is caused by the host, never by the submitted source.
//! Toolchain diagnostics are not errors and live in [`crate::outcome`].

use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum InfraError {
    #[error("create workspace under {root}: {source}")]
    CreateWorkspace { root: PathBuf, source: io::Error },

    #[error("create source directory: {0}")]
    CreateSourceDir(#[source] io::Error),

    #[error("project configuration {path} is unreadable: {source}")]
    ConfigUnreadable { path: PathBuf, source: io::Error },

    #[error("link project configuration {target}: {source}")]
    LinkConfig { target: PathBuf, source: io::Error },

    #[error("write source file: {0}")]
    WriteSource(#[source] io::Error),

    #[error("spawn toolchain {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("capture toolchain output: {0}")]
    CaptureOutput(#[source] io::Error),

    #[error("wait for toolchain: {0}")]
    Wait(#[source] io::Error),

    #[error("toolchain exceeded {0:?}")]
    Timeout(Duration),

    #[error("toolchain terminated by signal {0}")]
    Signaled(i32),

    #[error("toolchain succeeded but produced no artifact at {0}")]
    ArtifactMissing(PathBuf),

    #[error("read artifact {path}: {source}")]
    ReadArtifact { path: PathBuf, source: io::Error },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl InfraError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InfraError::Timeout(_))
    }
}
