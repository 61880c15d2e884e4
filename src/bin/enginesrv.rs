//! `enginesrv` — a thin HTTP front for recognition (spec.md §1 treats any
//! HTTP/CLI harness as an out-of-scope collaborator). `POST /recognize`
//! takes raw audio bytes, writes them to a temp file, runs them through
//! `echofp::Engine::recognize_file`, and returns the match as JSON. No
//! business logic beyond that lives here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use echofp::config::Config;
use echofp::matcher::MatchResult;
use echofp::Engine;
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

struct AppState {
    engine: Mutex<Engine>,
}

#[derive(Serialize)]
struct RecognizeResponse {
    #[serde(rename = "match")]
    match_result: Option<MatchResult>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn recognize(State(state): State<Arc<AppState>>, body: axum::body::Bytes) -> Response {
    let tmp = match tempfile::NamedTempFile::new() {
        Ok(f) => f,
        Err(e) => return internal_error(e.to_string()),
    };

    if let Err(e) = tmp.as_file().write_all(&body) {
        return internal_error(e.to_string());
    }

    let mut engine = state.engine.lock().unwrap();
    match engine.recognize_file(tmp.path()) {
        Ok(match_result) => Json(RecognizeResponse { match_result }).into_response(),
        Err(e) => internal_error(e.to_string()),
    }
}

fn internal_error(message: String) -> Response {
    tracing::error!(%message, "recognize request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
        .into_response()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let engine = Engine::new(&config)?;
    let state = Arc::new(AppState {
        engine: Mutex::new(engine),
    });

    let app = Router::new()
        .route("/recognize", post(recognize))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!(addr = "0.0.0.0:8080", "enginesrv listening");
    axum::serve(listener, app).await?;

    Ok(())
}
