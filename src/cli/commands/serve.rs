//! HTTP API server.
//!
//! Exposes the summarizer as `POST /api/summarize`, plus the generated audio
//! files under `/audio/{name}`.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::RecapError;
use crate::orchestrator::{Orchestrator, SummaryResult};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    audio_dir: PathBuf,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'recap doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let audio_dir = settings.audio_dir();

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(settings)?,
        audio_dir,
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("recap API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Welcome", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Summarize", "POST /api/summarize");
    Output::kv("Audio", "GET  /audio/{name}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/api/summarize", post(summarize))
        .route("/audio/{name}", get(audio))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SummarizeRequest {
    query: String,
    /// Return the summary as speech.
    #[serde(default)]
    tts: bool,
}

#[derive(Serialize)]
struct SummarizeResponse {
    title: Option<String>,
    summary: String,
    video_link: Option<String>,
    audio_url: Option<String>,
}

impl From<SummaryResult> for SummarizeResponse {
    fn from(result: SummaryResult) -> Self {
        Self {
            audio_url: result
                .audio_path
                .as_deref()
                .and_then(|p| p.file_name())
                .map(|name| format!("/audio/{}", name.to_string_lossy())),
            title: result.title,
            summary: result.summary,
            video_link: result.video_link,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

fn mp3_response(name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Whether `name` is a bare mp3 file name (no directories).
fn is_audio_file_name(name: &str) -> bool {
    name.ends_with(".mp3")
        && name.len() > ".mp3".len()
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}

// === Handlers ===

async fn welcome() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Welcome to the recap video summarization API!" }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> Response {
    info!("Summarize request (tts = {})", req.tts);

    let result = match state.orchestrator.run(&req.query, req.tts).await {
        Ok(result) => result,
        Err(e @ RecapError::InvalidInput(_)) => {
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
        Err(e) => {
            error!("Summarization failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    if req.tts {
        if let Some(path) = &result.audio_path {
            match tokio::fs::read(path).await {
                Ok(bytes) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "summary.mp3".to_string());
                    return mp3_response(&name, bytes);
                }
                Err(e) => warn!("Could not read generated audio {}: {}", path.display(), e),
            }
        }
    }

    Json(SummarizeResponse::from(result)).into_response()
}

async fn audio(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    if !is_audio_file_name(&name) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid audio file name");
    }

    match tokio::fs::read(state.audio_dir.join(&name)).await {
        Ok(bytes) => mp3_response(&name, bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error_response(StatusCode::NOT_FOUND, format!("Audio not found: {}", name))
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
