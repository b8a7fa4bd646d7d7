//! Buildbox - compile service with throwaway build workspaces.
//!
//! Usage:
//!   buildbox serve [--port 8080]        # Start HTTP server
//!   buildbox compile src/Main.elm       # Compile one file, artifact on stdout

use axum::http::HeaderValue;
use buildbox::{http_server, keepalive, AppState, CompileOutcome, Compiler, Config};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::exit;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "buildbox")]
#[command(about = "Compile service with throwaway build workspaces")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,

        /// Largest accepted request body in bytes
        #[arg(long = "max-body", env = "MAX_BODY_BYTES", default_value = "1048576")]
        max_body_bytes: usize,

        /// Directory holding the sample exercises
        #[arg(long, env = "EXERCISES_DIR", default_value = "./exercises")]
        exercises_dir: PathBuf,

        /// Directory served for all other paths
        #[arg(long, env = "STATIC_DIR", default_value = "./static")]
        static_dir: PathBuf,

        /// Public base URL to ping periodically so the host stays awake
        #[arg(long, env = "KEEP_ALIVE_URL")]
        keep_alive_url: Option<String>,

        #[command(flatten)]
        config: Config,
    },
    /// Compile a single file and write the artifact to stdout
    Compile {
        /// Source file to compile
        file: PathBuf,

        #[command(flatten)]
        config: Config,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Serve {
            port,
            max_body_bytes,
            exercises_dir,
            static_dir,
            keep_alive_url,
            config,
        } => {
            let compiler = load_compiler(&config);
            let content_type = match HeaderValue::from_str(&config.artifact_content_type) {
                Ok(value) => value,
                Err(e) => {
                    eprintln!("Error: invalid artifact content type: {}", e);
                    exit(1);
                }
            };
            let state = AppState::new(compiler, content_type)
                .with_max_body_bytes(max_body_bytes)
                .with_exercises_dir(exercises_dir)
                .with_static_dir(static_dir);

            if let Some(url) = keep_alive_url {
                keepalive::spawn(&url);
            }

            if let Err(e) = http_server::run_server(port, state).await {
                eprintln!("Error: server failed: {}", e);
                exit(1);
            }
        }
        Commands::Compile { file, config } => {
            let source = match tokio::fs::read(&file).await {
                Ok(source) => source,
                Err(e) => {
                    eprintln!("Error: read {}: {}", file.display(), e);
                    exit(2);
                }
            };
            let compiler = load_compiler(&config);

            match compiler.compile(source).await {
                CompileOutcome::Success { artifact } => {
                    let mut stdout = std::io::stdout().lock();
                    if let Err(e) = stdout.write_all(&artifact).and_then(|()| stdout.flush()) {
                        eprintln!("Error: write artifact: {}", e);
                        exit(2);
                    }
                }
                CompileOutcome::Diagnostics { output } => {
                    let mut stderr = std::io::stderr().lock();
                    if let Err(e) = stderr.write_all(&output).and_then(|()| stderr.flush()) {
                        error!(error = %e, "write diagnostics");
                    }
                    exit(1);
                }
                CompileOutcome::Infrastructure(e) => {
                    error!(error = %e, "compile failed on host");
                    exit(2);
                }
            }
        }
    }
}

fn load_compiler(config: &Config) -> Compiler {
    match Compiler::from_config(config) {
        Ok(compiler) => {
            tracing::info!(
                toolchain = %compiler.toolchain().program().display(),
                project_config = %compiler.project().path().display(),
                scratch_root = %compiler.scratch_root().display(),
                timeout = ?config.compile_timeout(),
                "compiler ready"
            );
            compiler
        }
        Err(e) => {
            eprintln!(
                "Error: setup failed (project config {}, scratch dir {}): {}",
                config.project_config.display(),
                config.scratch_root.display(),
                e
            );
            exit(1);
        }
    }
}
