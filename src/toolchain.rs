//! Running the external toolchain inside a workspace.

use crate::config::{Config, ARTIFACT, ENTRY_POINT};
use crate::error::InfraError;
use nix::fcntl::OFlag;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{pipe2, Pid};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const TRUNCATED_MARKER: &[u8] = b"\n[output truncated]\n";

/// How the toolchain is located and bounded.
#[derive(Debug, Clone)]
pub struct Toolchain {
    program: PathBuf,
    timeout: Duration,
    max_output: usize,
}

/// A toolchain run that started and terminated on its own.
#[derive(Debug)]
pub struct Invocation {
    pub status: ExitStatus,
    /// stdout and stderr, interleaved as emitted, byte for byte.
    pub output: Vec<u8>,
}

impl Toolchain {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration, max_output: usize) -> Self {
        Self {
            program: program.into(),
            timeout,
            max_output,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.toolchain.clone(),
            config.compile_timeout(),
            config.max_output_bytes,
        )
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Compile the workspace entry point.
    ///
    /// A non-zero exit is returned as a normal [`Invocation`]; only failing
    /// to start, losing the output pipe, a signal kill or the timeout are
    /// errors.
    ///
    /// Once the toolchain itself exits, anything still running in its
    /// process group is killed. Background helpers would otherwise keep the
    /// output pipe open and the run would be reported as a timeout even
    /// though its exit status is known.
    pub async fn invoke(&self, workspace_root: &Path) -> Result<Invocation, InfraError> {
        let (reader, writer) = pipe2(OFlag::O_CLOEXEC)
            .map_err(|e| InfraError::CaptureOutput(io::Error::from(e)))?;
        let writer_err = writer.try_clone().map_err(InfraError::CaptureOutput)?;

        let mut command = Command::new(&self.program);
        command
            .arg("make")
            .arg(ENTRY_POINT)
            .arg(format!("--output={ARTIFACT}"))
            .current_dir(workspace_root)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(writer_err)
            .process_group(0)
            .kill_on_drop(true);

        debug!(program = %self.program.display(), "spawning toolchain");
        let started = Instant::now();
        let spawned = command.spawn();
        // The command owns the parent's copies of the write end; EOF on the
        // reader depends on releasing them.
        drop(command);
        let mut child = spawned.map_err(|source| InfraError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        let mut group = GroupGuard::new(child.id());

        let limit = self.max_output;
        let capture = tokio::task::spawn_blocking(move || read_capped(File::from(reader), limit));

        let run = async {
            let status = child.wait().await.map_err(InfraError::Wait)?;
            group.kill();
            let captured = capture.await?.map_err(InfraError::CaptureOutput)?;
            Ok::<_, InfraError>((status, captured))
        };
        let result = timeout(self.timeout, run).await;

        let (status, (mut output, truncated)) = match result {
            Ok(finished) => finished?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "toolchain timed out, killing process group");
                group.kill();
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "reaping timed out toolchain");
                }
                return Err(InfraError::Timeout(self.timeout));
            }
        };
        info!(
            status = %status,
            elapsed = ?started.elapsed(),
            output_bytes = output.len(),
            truncated,
            "toolchain finished"
        );

        if truncated {
            output.extend_from_slice(TRUNCATED_MARKER);
        }
        Ok(Invocation { status, output })
    }
}

/// Keep the first `limit` bytes of the pipe and drain the rest so the
/// child never blocks on a full pipe.
fn read_capped(mut pipe: File, limit: usize) -> io::Result<(Vec<u8>, bool)> {
    let mut kept = Vec::new();
    (&mut pipe).take(limit as u64).read_to_end(&mut kept)?;
    let dropped = io::copy(&mut pipe, &mut io::sink())?;
    Ok((kept, dropped > 0))
}

/// Kills the toolchain's process group at most once, and on drop if that
/// has not happened yet, so helpers it forked do not outlive the run.
struct GroupGuard(Option<Pid>);

impl GroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self(pid.and_then(|pid| i32::try_from(pid).ok()).map(Pid::from_raw))
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.0.take() {
            if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                debug!(%pgid, error = %e, "killpg");
            }
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}
