// IEEPA Claims Pipeline - Web Server
// Upload the ACE reports, get back the enriched table as JSON or CSV.
//
// Every request builds its own ClaimsPipeline; nothing is shared between
// requests and uploads never touch the disk.

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use ieepa_claims::logging::init_logging;
use ieepa_claims::mock::MockFiles;
use ieepa_claims::{AppConfig, ClaimsError, ClaimsPipeline, ReportSources, SourceInput};

/// Shared application state (read-only)
#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

enum ApiError {
    BadUpload(String),
    NotFound(String),
    Pipeline(ClaimsError),
    Internal(String),
}

impl From<ClaimsError> for ApiError {
    fn from(e: ClaimsError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => {
                warn!("Not found: {}", msg);
                return (StatusCode::NOT_FOUND, Json(ApiResponse::err(msg))).into_response();
            }
            ApiError::BadUpload(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Pipeline(e) if e.is_input_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Pipeline(ClaimsError::Unprocessed) => {
                (StatusCode::CONFLICT, ClaimsError::Unprocessed.to_string())
            }
            ApiError::Pipeline(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            error!("Request failed: {}", message);
        } else {
            warn!("Rejected request: {}", message);
        }

        (status, Json(ApiResponse::err(format!("Processing error: {}", message)))).into_response()
    }
}

// ============================================================================
// Upload handling
// ============================================================================

/// Collect the multipart fields into in-memory report sources.
async fn read_sources(mut multipart: Multipart) -> Result<ReportSources, ApiError> {
    let mut sources = ReportSources::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadUpload(e.to_string()))?;

        // Browsers send an empty part for an unselected optional file
        if data.is_empty() {
            continue;
        }

        let input = SourceInput::bytes(file_name, data.to_vec());
        match name.as_str() {
            "entry_summary" => sources.entry_summary = Some(input),
            "liquidation_status" => sources.liquidation_status = Some(input),
            "importer_statement" => sources.importer_statement = Some(input),
            other => warn!("Ignoring unexpected upload field '{}'", other),
        }
    }

    Ok(sources)
}

/// Run a fresh pipeline off the async runtime.
async fn run_pipeline<T, F>(state: &AppState, sources: ReportSources, finish: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ClaimsPipeline) -> Result<T, ClaimsError> + Send + 'static,
{
    let clock = state.config.pipeline.clock();

    tokio::task::spawn_blocking(move || {
        let mut pipeline = ClaimsPipeline::with_clock(clock);
        pipeline.process(&sources)?;
        finish(&pipeline)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(ApiError::from)
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// `{success, data, summary, total_records}` body for a processed pipeline.
fn process_body(pipeline: &ClaimsPipeline) -> Result<serde_json::Value, ClaimsError> {
    let table = pipeline.result().ok_or(ClaimsError::Unprocessed)?;
    let summary = pipeline.summary()?;
    Ok(serde_json::json!({
        "success": true,
        "data": serde_json::to_value(table)?,
        "summary": summary,
        "total_records": table.len(),
    }))
}

/// POST /api/process - Upload reports, get enriched rows + risk summary
async fn process_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let sources = read_sources(multipart).await?;
    let body = run_pipeline(&state, sources, process_body).await?;

    info!("Processed upload: {} records", body["total_records"]);
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// POST /api/process-mock - Run the pipeline over previously generated demo reports
async fn process_mock(State(state): State<AppState>) -> Result<Response, ApiError> {
    let dir = &state.config.pipeline.mock_dir;
    let files = MockFiles::locate(dir).ok_or_else(|| {
        ApiError::NotFound(format!(
            "Mock data files not found in {}. Please generate them first.",
            dir.display()
        ))
    })?;

    let body = run_pipeline(&state, files.sources(), process_body).await?;

    info!("Processed mock data: {} records", body["total_records"]);
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// POST /api/export - Upload reports, download the enriched table as CSV
async fn export_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let sources = read_sources(multipart).await?;

    let csv_bytes = run_pipeline(&state, sources, |pipeline| {
        let mut out = Vec::new();
        pipeline.export_to_writer(&mut out)?;
        Ok(out)
    })
    .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"ieepa_claims_results.csv\"",
            ),
        ],
        csv_bytes,
    )
        .into_response())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(None).context("Failed to load configuration")?;
    init_logging(&config.logging.filter);

    info!("IEEPA Claims Pipeline - Web Server");

    let addr = config.server.bind_addr.clone();
    let max_upload = config.server.max_upload_bytes;

    let state = AppState {
        config: Arc::new(config),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/process", post(process_upload))
        .route("/process-mock", post(process_mock))
        .route("/export", post(export_upload))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("   API: POST /api/process, POST /api/process-mock, POST /api/export");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
