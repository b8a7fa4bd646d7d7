//! Mapping a finished toolchain run to the result a caller sees.

use crate::error::InfraError;
use crate::toolchain::Invocation;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;

/// Result of one compile request.
#[derive(Debug)]
pub enum CompileOutcome {
    /// The toolchain succeeded; the artifact bytes, as written.
    Success { artifact: Vec<u8> },
    /// The toolchain rejected the source; its output bytes, verbatim.
    Diagnostics { output: Vec<u8> },
    /// Something on the host went wrong.
    Infrastructure(InfraError),
}

impl CompileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CompileOutcome::Success { .. } => "success",
            CompileOutcome::Diagnostics { .. } => "diagnostics",
            CompileOutcome::Infrastructure(e) if e.is_timeout() => "timeout",
            CompileOutcome::Infrastructure(_) => "infrastructure",
        }
    }
}

impl From<InfraError> for CompileOutcome {
    fn from(e: InfraError) -> Self {
        CompileOutcome::Infrastructure(e)
    }
}

/// Interpret a finished run.
///
/// Zero exit requires an artifact at `artifact_path`; any other exit code
/// is a diagnostic; termination by signal is a host problem.
pub async fn translate(invocation: Invocation, artifact_path: &Path) -> CompileOutcome {
    match invocation.status.code() {
        Some(0) => match tokio::fs::read(artifact_path).await {
            Ok(artifact) => CompileOutcome::Success { artifact },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                InfraError::ArtifactMissing(artifact_path.to_path_buf()).into()
            }
            Err(source) => InfraError::ReadArtifact {
                path: artifact_path.to_path_buf(),
                source,
            }
            .into(),
        },
        Some(_) => CompileOutcome::Diagnostics {
            output: invocation.output,
        },
        None => InfraError::Signaled(invocation.status.signal().unwrap_or_default()).into(),
    }
}
