//! Service configuration, resolved once at startup.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Entry point the toolchain compiles, relative to the workspace root.
pub const ENTRY_POINT: &str = "src/Main.elm";

/// Artifact the toolchain is told to emit, relative to the workspace root.
pub const ARTIFACT: &str = "main.js";

/// Settings shared by the `serve` and `compile` subcommands.
#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    /// Toolchain executable (name on PATH or explicit path)
    #[arg(long = "toolchain", env = "ELM_BIN", default_value = "elm")]
    pub toolchain: PathBuf,

    /// Shared project manifest linked into every workspace
    #[arg(long, env = "PROJECT_CONFIG", default_value = "./elm.json")]
    pub project_config: PathBuf,

    /// Directory that holds the per-request workspaces
    #[arg(long = "scratch-dir", env = "SCRATCH_DIR", default_value = "./temp")]
    pub scratch_root: PathBuf,

    /// Wall-clock limit for one toolchain run, in seconds
    #[arg(long = "compile-timeout", env = "COMPILE_TIMEOUT", default_value = "60")]
    pub compile_timeout_secs: u64,

    /// Maximum bytes of toolchain output kept per run
    #[arg(long = "max-output", env = "MAX_OUTPUT_BYTES", default_value = "1048576")]
    pub max_output_bytes: usize,

    /// Media type of a successful response
    #[arg(long = "artifact-type", env = "ARTIFACT_CONTENT_TYPE", default_value = "application/javascript")]
    pub artifact_content_type: String,
}

impl Config {
    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }
}

/// The shared project manifest.
///
/// Loaded once; every workspace links to the same absolute path so all
/// concurrent builds resolve dependencies from byte-identical configuration.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    path: PathBuf,
    file_name: OsString,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> io::Result<Self> {
        let path = fs::canonicalize(path)?;
        if !fs::metadata(&path)?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        fs::File::open(&path)?;

        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "manifest has no file name"))?;

        Ok(Self { path, file_name })
    }

    /// Absolute, resolved path of the manifest.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the link gets inside a workspace.
    pub fn file_name(&self) -> &OsStr {
        &self.file_name
    }
}
