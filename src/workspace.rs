//! Per-request build workspaces.
//!
//! A workspace is a uniquely named directory under the scratch root holding
//! a link to the shared project manifest, a `src/` tree with the submitted
//! entry point, and whatever the toolchain emits. It is removed when the
//! request finishes, including when the handler future is dropped midway.

use crate::config::{ProjectConfig, ARTIFACT, ENTRY_POINT};
use crate::error::InfraError;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, warn};

const WORKSPACE_PREFIX: &str = "build-";
const SOURCE_DIR: &str = "src";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    created_at: Instant,
}

impl Workspace {
    /// Create a fresh workspace with its source directory.
    pub fn create(scratch_root: &Path) -> Result<Self, InfraError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(scratch_root)
            .map_err(|source| InfraError::CreateWorkspace {
                root: scratch_root.to_path_buf(),
                source,
            })?;

        // On failure `dir` is dropped here, which removes it.
        fs::create_dir(dir.path().join(SOURCE_DIR)).map_err(InfraError::CreateSourceDir)?;

        debug!(root = %dir.path().display(), "workspace created");
        Ok(Self {
            dir,
            created_at: Instant::now(),
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root().join(SOURCE_DIR)
    }

    pub fn entry_point(&self) -> PathBuf {
        self.root().join(ENTRY_POINT)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.root().join(ARTIFACT)
    }

    /// Link the shared manifest into the workspace root.
    ///
    /// The manifest is opened first so an unreadable original fails here
    /// instead of surfacing later as a toolchain diagnostic.
    pub fn link_config(&self, config: &ProjectConfig) -> Result<(), InfraError> {
        let target = config.path();
        fs::File::open(target).map_err(|source| InfraError::ConfigUnreadable {
            path: target.to_path_buf(),
            source,
        })?;

        symlink(target, self.root().join(config.file_name())).map_err(|source| {
            InfraError::LinkConfig {
                target: target.to_path_buf(),
                source,
            }
        })
    }

    /// Write the submitted bytes, unmodified, to the entry point.
    pub fn write_source(&self, source: &[u8]) -> Result<(), InfraError> {
        fs::write(self.entry_point(), source).map_err(InfraError::WriteSource)
    }

    /// Remove the workspace tree. Failures are logged, never returned.
    pub fn destroy(self) {
        let root = self.root().to_path_buf();
        let age = self.created_at.elapsed();
        match self.dir.close() {
            Ok(()) => debug!(root = %root.display(), ?age, "workspace removed"),
            Err(e) => warn!(root = %root.display(), error = %e, "failed to remove workspace"),
        }
    }
}
