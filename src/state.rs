//! Shared application state.

use crate::compiler::Compiler;
use axum::http::HeaderValue;
use std::path::PathBuf;
use std::sync::Arc;

/// Default cap on a submitted source body (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub compiler: Arc<Compiler>,
    pub artifact_content_type: HeaderValue,
    pub max_body_bytes: usize,
    pub exercises_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(compiler: Compiler, artifact_content_type: HeaderValue) -> Self {
        Self {
            compiler: Arc::new(compiler),
            artifact_content_type,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            exercises_dir: PathBuf::from("./exercises"),
            static_dir: PathBuf::from("./static"),
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_exercises_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exercises_dir = dir.into();
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }
}
