//! HTTP surface around the engine: upload a workbook payload, get the
//! artifacts back, either as stored files with a download route or inline
//! as base64 data URLs.

use crate::config::ServerConfig;
use crate::error::EngineError;
use crate::model::{
    BULK_UPLOAD_FILE, HealthResponse, IMPACT_REPORT_FILE, InlineArtifacts, OPTIMIZATION_LOG_FILE,
    OptimizeResponse, RunArtifacts,
};
use crate::{pipeline, utils};
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const MARKDOWN_CONTENT_TYPE: &str = "text/markdown";

pub fn router(config: Arc<ServerConfig>) -> Router {
    Router::new()
        .route("/optimize", post(optimize_handler))
        .route("/runs/{run_id}/{file}", get(download_handler))
        .route("/health", get(health_handler))
        .with_state(config)
}

#[derive(Debug, Default, Deserialize)]
struct OptimizeQuery {
    /// Return the artifacts as data URLs in the response body.
    #[serde(default)]
    inline: bool,
}

async fn optimize_handler(
    State(config): State<Arc<ServerConfig>>,
    Query(query): Query<OptimizeQuery>,
    body: Bytes,
) -> Result<axum::Json<OptimizeResponse>, ApiError> {
    if body.len() as u64 > config.max_upload_bytes {
        return Err(ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "payload of {} bytes exceeds the {} byte limit",
                body.len(),
                config.max_upload_bytes
            ),
        ));
    }

    let payload = body.to_vec();
    let run_id = utils::run_id(&payload);
    let settings = config.engine_settings();
    let run_dir = config.run_dir(&run_id);
    info!(run_id = %run_id, bytes = payload.len(), "optimization run accepted");

    let task = tokio::task::spawn_blocking(move || -> Result<RunArtifacts, EngineError> {
        let artifacts = pipeline::optimize(payload, &settings)?;
        persist_artifacts(&run_dir, &artifacts)?;
        Ok(artifacts)
    });

    let artifacts = tokio::time::timeout(
        Duration::from_secs(config.processing_timeout_secs),
        task,
    )
    .await
    .map_err(|_| {
        warn!(run_id = %run_id, "optimization run timed out");
        ApiError::new(StatusCode::REQUEST_TIMEOUT, "processing timeout".to_string())
    })?
    .map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("worker task failed: {e}"),
        )
    })??;

    let mut files = vec![
        OPTIMIZATION_LOG_FILE.to_string(),
        BULK_UPLOAD_FILE.to_string(),
    ];
    if artifacts.impact_report.is_some() {
        files.push(IMPACT_REPORT_FILE.to_string());
    }

    let inline = query.inline.then(|| InlineArtifacts {
        optimization_log: data_url(XLSX_CONTENT_TYPE, &artifacts.optimization_log),
        bulk_upload: data_url(XLSX_CONTENT_TYPE, &artifacts.bulk_upload),
        impact_report: artifacts
            .impact_report
            .as_deref()
            .map(|bytes| data_url(MARKDOWN_CONTENT_TYPE, bytes)),
    });

    info!(run_id = %run_id, files = files.len(), "optimization run complete");
    Ok(axum::Json(OptimizeResponse {
        run_id,
        message: "Processing Complete".to_string(),
        files,
        inline,
    }))
}

async fn download_handler(
    State(config): State<Arc<ServerConfig>>,
    Path((run_id, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    if !is_valid_run_id(&run_id) {
        return Err(ApiError::not_found("unknown run"));
    }
    let content_type = match file.as_str() {
        OPTIMIZATION_LOG_FILE | BULK_UPLOAD_FILE => XLSX_CONTENT_TYPE,
        IMPACT_REPORT_FILE => MARKDOWN_CONTENT_TYPE,
        _ => return Err(ApiError::not_found("unknown artifact")),
    };

    let path = config.run_dir(&run_id).join(&file);
    let bytes = tokio::task::spawn_blocking(move || fs::read(path))
        .await
        .map_err(|e| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("worker task failed: {e}"),
            )
        })?
        .map_err(|_| ApiError::not_found("artifact not found"))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn health_handler() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn persist_artifacts(run_dir: &std::path::Path, artifacts: &RunArtifacts) -> Result<(), EngineError> {
    fs::create_dir_all(run_dir)?;
    fs::write(run_dir.join(OPTIMIZATION_LOG_FILE), &artifacts.optimization_log)?;
    fs::write(run_dir.join(BULK_UPLOAD_FILE), &artifacts.bulk_upload)?;
    if let Some(impact) = &artifacts.impact_report {
        fs::write(run_dir.join(IMPACT_REPORT_FILE), impact)?;
    }
    Ok(())
}

fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", BASE64.encode(bytes))
}

/// Run ids are generated server-side from the short-id alphabet; anything
/// else in the path is not a run directory we own.
fn is_valid_run_id(run_id: &str) -> bool {
    !run_id.is_empty()
        && run_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }

    fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(category = err.category(), error = %err, "optimization run failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = axum::Json(serde_json::json!({
            "success": false,
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}
