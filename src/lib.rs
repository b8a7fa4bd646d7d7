//! Buildbox - compiles submitted sources in throwaway workspaces.
//!
//! Each request gets its own directory under the scratch root with the
//! shared project manifest linked in. The external toolchain runs there,
//! and the directory is removed however the request ends. The toolchain is
//! trusted to compile, not execute, what it is given; nothing here
//! sandboxes it against malicious input.

#[cfg(not(target_os = "linux"))]
compile_error!("buildbox only works on Linux.");

pub mod compiler;
pub mod config;
pub mod error;
pub mod exercises;
pub mod http_server;
pub mod keepalive;
pub mod outcome;
pub mod state;
pub mod toolchain;
pub mod workspace;

#[cfg(test)]
mod test_support;

pub use compiler::Compiler;
pub use config::{Config, ProjectConfig};
pub use error::InfraError;
pub use outcome::CompileOutcome;
pub use state::AppState;
