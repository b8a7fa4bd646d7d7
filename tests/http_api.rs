//! Router-level checks for the compile endpoint and its neighbours.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use buildbox::http_server::router;
use common::{is_empty, Harness};
use std::fs;
use std::time::Duration;
use tower::ServiceExt;

async fn send(app: &axum::Router, method: Method, uri: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn compile_success_returns_script() {
    let (scratch, _shared, state) = Harness::new().into_state();
    let app = router(state);

    let response = send(&app, Method::POST, "/compile", "main = 1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/javascript");
    assert_eq!(body_bytes(response).await, b"// compiled\nmain = 1");
    assert!(is_empty(scratch.path()));
}

#[tokio::test]
async fn compile_failure_returns_diagnostics_as_client_error() {
    let (scratch, _shared, state) = Harness::new().into_state();
    let app = router(state);

    let response = send(&app, Method::POST, "/compile", "@fail").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.starts_with("Compiling ...\n-- TYPE MISMATCH"));
    assert!(is_empty(scratch.path()));
}

#[tokio::test]
async fn diagnostics_body_is_the_exact_toolchain_output() {
    let (scratch, _shared, state) = Harness::new().into_state();
    let app = router(state);

    let response = send(&app, Method::POST, "/compile", "@binary").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content_type(&response), "text/plain; charset=utf-8");
    assert_eq!(body_bytes(response).await, b"bad byte: \xff\xfe in source\n");
    assert!(is_empty(scratch.path()));
}

#[tokio::test]
async fn empty_body_is_a_client_error() {
    let (_scratch, _shared, state) = Harness::new().into_state();
    let app = router(state);

    let response = send(&app, Method::POST, "/compile", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("NO MAIN MODULE"));
}

#[tokio::test]
async fn infrastructure_failure_hides_host_details() {
    let harness = Harness::new();
    fs::remove_file(harness.manifest_path()).unwrap();
    let (scratch, shared, state) = harness.into_state();
    let app = router(state);

    let response = send(&app, Method::POST, "/compile", "main = 1").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(body, "Compilation failed due to a server error");
    assert!(!body.contains(&*shared.path().to_string_lossy()));
    assert!(is_empty(scratch.path()));
}

#[tokio::test]
async fn timeout_maps_to_gateway_timeout() {
    let (scratch, _shared, state) = Harness::with_timeout(Duration::from_millis(300)).into_state();
    let app = router(state);

    let response = send(&app, Method::POST, "/compile", "@sleep").await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(is_empty(scratch.path()));
}

#[tokio::test]
async fn oversized_body_is_rejected_before_compiling() {
    let (scratch, _shared, state) = Harness::new().into_state();
    let app = router(state.with_max_body_bytes(16));

    let response = send(&app, Method::POST, "/compile", "x".repeat(64)).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(is_empty(scratch.path()));
}

#[tokio::test]
async fn concurrent_http_requests_are_paired_correctly() {
    let (scratch, _shared, state) = Harness::new().into_state();
    let app = router(state);

    let (ok, failed) = tokio::join!(
        send(&app, Method::POST, "/compile", "main = ok"),
        send(&app, Method::POST, "/compile", "@fail"),
    );

    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_bytes(ok).await, b"// compiled\nmain = ok");
    assert_eq!(failed.status(), StatusCode::BAD_REQUEST);
    assert!(is_empty(scratch.path()));
}

#[tokio::test]
async fn health_is_ok() {
    let (_scratch, _shared, state) = Harness::new().into_state();
    let app = router(state);

    let response = send(&app, Method::GET, "/health", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn exercises_are_listed_and_fetched() {
    let site = tempfile::TempDir::new().unwrap();
    let exercises = site.path().join("exercises");
    fs::create_dir(&exercises).unwrap();
    fs::write(exercises.join("Exercise01Hello.elm"), "-- hello").unwrap();
    fs::write(exercises.join("Exercise02Records.elm"), "-- records").unwrap();

    let (_scratch, _shared, state) = Harness::new().into_state();
    let app = router(state.with_exercises_dir(&exercises));

    let response = send(&app, Method::GET, "/exercises", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        listed,
        serde_json::json!([
            {"id": "01", "title": "Hello", "filename": "Exercise01Hello.elm"},
            {"id": "02", "title": "Records", "filename": "Exercise02Records.elm"}
        ])
    );

    let response = send(&app, Method::GET, "/02", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"-- records");
}

#[tokio::test]
async fn exercise_with_non_utf8_bytes_is_served_as_stored() {
    let site = tempfile::TempDir::new().unwrap();
    let exercises = site.path().join("exercises");
    fs::create_dir(&exercises).unwrap();
    fs::write(exercises.join("Exercise03Latin1.elm"), b"-- caf\xe9\n").unwrap();

    let (_scratch, _shared, state) = Harness::new().into_state();
    let app = router(state.with_exercises_dir(&exercises));

    let response = send(&app, Method::GET, "/03", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"-- caf\xe9\n");
}

#[tokio::test]
async fn unknown_paths_fall_through_to_static_files() {
    let site = tempfile::TempDir::new().unwrap();
    let static_dir = site.path().join("static");
    fs::create_dir(&static_dir).unwrap();
    fs::write(static_dir.join("index.html"), "<h1>playground</h1>").unwrap();
    fs::write(static_dir.join("app.css"), "body {}").unwrap();

    let (_scratch, _shared, state) = Harness::new().into_state();
    let app = router(
        state
            .with_exercises_dir(site.path().join("exercises"))
            .with_static_dir(&static_dir),
    );

    let response = send(&app, Method::GET, "/", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"<h1>playground</h1>");

    let response = send(&app, Method::GET, "/app.css", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"body {}");

    let response = send(&app, Method::GET, "/missing.js", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
