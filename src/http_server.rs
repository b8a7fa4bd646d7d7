//! HTTP server implementation using Axum.

use crate::exercises::{self, Exercise};
use crate::outcome::CompileOutcome;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::io;
use std::net::SocketAddr;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Compilation failed due to a server error";
const TIMEOUT_MESSAGE: &str = "Compilation timed out";
const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Build the router. Exposed separately from [`run_server`] for tests.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    let max_body = state.max_body_bytes;

    Router::new()
        .route("/compile", post(compile))
        .route("/health", get(health))
        .route("/exercises", get(list_exercises))
        .route("/:id", get(get_exercise))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server on the given port with the provided state.
pub async fn run_server(port: u16, state: AppState) -> io::Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> &'static str {
    "OK"
}

async fn compile(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = state.compiler.compile(body.to_vec()).await;

    match outcome {
        CompileOutcome::Success { artifact } => {
            info!(artifact_bytes = artifact.len(), "compiled");
            (
                [(header::CONTENT_TYPE, state.artifact_content_type.clone())],
                artifact,
            )
                .into_response()
        }
        CompileOutcome::Diagnostics { output } => {
            warn!(output_bytes = output.len(), "compilation rejected by toolchain");
            (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, PLAIN_TEXT)],
                output,
            )
                .into_response()
        }
        CompileOutcome::Infrastructure(e) if e.is_timeout() => {
            error!(error = %e, "compile timed out");
            (StatusCode::GATEWAY_TIMEOUT, TIMEOUT_MESSAGE).into_response()
        }
        CompileOutcome::Infrastructure(e) => {
            error!(error = %e, "compile failed on host");
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
        }
    }
}

async fn list_exercises(
    State(state): State<AppState>,
) -> Result<Json<Vec<Exercise>>, (StatusCode, &'static str)> {
    exercises::list(&state.exercises_dir).await.map(Json).map_err(|e| {
        error!(error = %e, "failed to list exercises");
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list exercises")
    })
}

/// Single-segment paths name an exercise first; anything that is not one
/// is served from the static directory.
async fn get_exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    let found = match exercises::find(&state.exercises_dir, &id).await {
        Ok(found) => found,
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            error!(error = %e, "failed to read exercises");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read exercise").into_response();
        }
    };

    match found {
        Some(source) => ([(header::CONTENT_TYPE, PLAIN_TEXT)], source).into_response(),
        None => match ServeDir::new(&state.static_dir).oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        },
    }
}
