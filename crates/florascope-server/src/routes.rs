//! HTTP routes and handlers

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use florascope_core::Prediction;
use florascope_model::decode_image;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// Body of a successful `/analyze` call
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let start = Instant::now();

    let outcome = classify_upload(&state, multipart).await;
    let outcome_label = match &outcome {
        Ok(_) => "ok",
        Err(AppError::Internal(_)) => "error",
        Err(_) => "rejected",
    };
    metrics::counter!("florascope_requests_total", "outcome" => outcome_label).increment(1);

    let prediction = outcome?;
    metrics::histogram!("florascope_inference_latency_us").record(prediction.latency_us as f64);

    info!(
        "Classified upload as '{}' ({:.3}) in {:?}",
        prediction.label,
        prediction.confidence,
        start.elapsed()
    );

    Ok(Json(AnalyzeResponse {
        result: prediction.label,
    }))
}

async fn classify_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Prediction, AppError> {
    let mut multipart = multipart?;
    let bytes = read_file_field(&mut multipart).await?;
    debug!("Received upload of {} bytes", bytes.len());

    // Decoding is CPU-bound.
    let image = tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Decode task failed: {}", e)))??;
    let prediction = state.predictor.predict(image).await?;
    Ok(prediction)
}

/// Pull the bytes of the `file` field, ignoring any other fields
async fn read_file_field(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }

    Err(AppError::InvalidRequest(format!(
        "multipart form has no '{}' field",
        FILE_FIELD
    )))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": state.predictor.name(),
        "classes": state.predictor.labels().len(),
    }))
}

pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics recorder not installed").into_response(),
    }
}

pub async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    PayloadTooLarge(String),
    Decode(String),
    Internal(String),
}

impl From<florascope_core::Error> for AppError {
    fn from(err: florascope_core::Error) -> Self {
        match err {
            florascope_core::Error::Decode(msg) => AppError::Decode(msg),
            other if other.is_client_error() => AppError::InvalidRequest(other.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(err.body_text()),
            status if status.is_server_error() => AppError::Internal(err.body_text()),
            _ => AppError::InvalidRequest(err.body_text()),
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request_error", msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg),
            AppError::Decode(msg) => (StatusCode::BAD_REQUEST, "decode_error", msg),
            AppError::Internal(msg) => {
                warn!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
