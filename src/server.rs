// HTTP surface for the translation workflow
//
// Thin wrappers over the pipeline: validation faults are rejected here
// before any pipeline stage runs, everything else is status-code mapping.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};
use uuid::Uuid;

use crate::core::types::TranslateResponse;
use crate::core::{Config, DocumentOutcome, ErrorResponse, TranslateRequest, UploadResponse};
use crate::orchestration::TranslationPipeline;
use crate::utils::Metrics;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<TranslationPipeline>,
    pub metrics: Metrics,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/stats", get(stats_endpoint))
        .route("/upload", post(upload_document))
        .route("/translate", post(translate_text))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
}

async fn root() -> &'static str {
    "Sanskrit Document Translation Service"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Prometheus metrics endpoint
async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

/// Detailed statistics endpoint (JSON)
async fn stats_endpoint(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let snapshot = state.metrics.snapshot();
    serde_json::to_value(snapshot).map(Json).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to serialize metrics: {}", e),
        )
    })
}

/// Process an uploaded document image
///
/// Multipart field `file` carries the image bytes. "Nothing detected" is a
/// 200 with an informational message; only decode and translation faults
/// are 500s.
async fn upload_document(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    state.metrics.record_request("/upload");

    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("Multipart error: {e}"))
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return error_response(StatusCode::BAD_REQUEST, "No selected file");
        }

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("Read error: {e}"))
            }
        };

        upload = Some((filename, data.to_vec()));
        break;
    }

    let Some((filename, data)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file part");
    };

    stage_upload(&state.config.upload.upload_dir, &filename, &data).await;

    match state.pipeline.process_document(data).await {
        Ok(DocumentOutcome::Translated { text, translation }) => (
            StatusCode::OK,
            Json(UploadResponse::translated(text, translation)),
        )
            .into_response(),
        Ok(DocumentOutcome::NoScriptDetected) => {
            (StatusCode::OK, Json(UploadResponse::no_script_detected())).into_response()
        }
        Err(e) => {
            error!("document pipeline failed for {filename}: {e:?}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("OCR/Translation failed: {e}"),
            )
        }
    }
}

/// Translate caller-supplied text
async fn translate_text(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Response {
    state.metrics.record_request("/translate");

    if request.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No text provided");
    }

    match state.pipeline.process_text(&request.text).await {
        Ok(translation) => (StatusCode::OK, Json(TranslateResponse { translation })).into_response(),
        Err(e) => {
            error!("text pipeline failed: {e:?}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Stage the upload under a per-request unique key. The pipeline consumes
/// the in-memory bytes, so the staged copy is scratch only and a write
/// failure is not fatal to the request.
async fn stage_upload(dir: &str, filename: &str, data: &[u8]) {
    let safe_name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let path = Path::new(dir).join(format!("{}_{safe_name}", Uuid::new_v4()));

    if let Err(e) = tokio::fs::write(&path, data).await {
        warn!("failed to stage upload at {}: {e}", path.display());
    }
}
