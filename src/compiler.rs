//! The per-request compile pipeline.

use crate::config::{Config, ProjectConfig};
use crate::error::InfraError;
use crate::outcome::{self, CompileOutcome};
use crate::toolchain::Toolchain;
use crate::workspace::Workspace;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

/// Owns everything a compile needs that outlives a single request. All of
/// it is read-only, so one instance is shared by every request.
#[derive(Debug)]
pub struct Compiler {
    scratch_root: PathBuf,
    project: ProjectConfig,
    toolchain: Toolchain,
}

impl Compiler {
    pub fn new(scratch_root: PathBuf, project: ProjectConfig, toolchain: Toolchain) -> Self {
        Self {
            scratch_root,
            project,
            toolchain,
        }
    }

    /// Load the project manifest and prepare the scratch root.
    pub fn from_config(config: &Config) -> io::Result<Self> {
        let project = ProjectConfig::load(&config.project_config)?;
        fs::create_dir_all(&config.scratch_root)?;
        Ok(Self::new(
            config.scratch_root.clone(),
            project,
            Toolchain::from_config(config),
        ))
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Compile `source` in a fresh workspace that is gone again by the
    /// time this returns.
    pub async fn compile(&self, source: Vec<u8>) -> CompileOutcome {
        let span = info_span!("compile", id = %Uuid::new_v4(), source_bytes = source.len());
        self.run(source).instrument(span).await
    }

    async fn run(&self, source: Vec<u8>) -> CompileOutcome {
        let workspace = match self.prepare(source).await {
            Ok(workspace) => workspace,
            Err(e) => return e.into(),
        };

        let outcome = match self.toolchain.invoke(workspace.root()).await {
            Ok(invocation) => outcome::translate(invocation, &workspace.artifact_path()).await,
            Err(e) => e.into(),
        };

        if let Err(e) = tokio::task::spawn_blocking(move || workspace.destroy()).await {
            warn!(error = %e, "workspace teardown task failed");
        }
        outcome
    }

    /// Create the workspace, link the manifest and write the source.
    async fn prepare(&self, source: Vec<u8>) -> Result<Workspace, InfraError> {
        let scratch_root = self.scratch_root.clone();
        let project = self.project.clone();

        tokio::task::spawn_blocking(move || {
            let workspace = Workspace::create(&scratch_root)?;
            let linked = workspace
                .link_config(&project)
                .and_then(|()| workspace.write_source(&source));
            match linked {
                Ok(()) => Ok(workspace),
                Err(e) => {
                    workspace.destroy();
                    Err(e)
                }
            }
        })
        .await?
    }
}
