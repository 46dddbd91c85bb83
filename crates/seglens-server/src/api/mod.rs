mod jobs;
mod mappings;
mod uploads;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use seglens_core::CoreError;
use seglens_engine::{EngineClient, EngineError};
use seglens_store::{SessionStore, StoreError, UploadStore};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, session_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub uploads: UploadStore,
    /// `None` means no remote engine is configured; every job runs in demo
    /// mode and history comes from the local record set.
    pub engine: Option<Arc<EngineClient>>,
    pub max_upload_bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    engine: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Map store failures onto the wire taxonomy. Unknown jobs and absent
/// uploads/mappings are 404s, distinct from input errors.
pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    match error {
        StoreError::JobNotFound => ApiError::new(request_id, "not_found", "job not found"),
        StoreError::NoCurrentUpload => {
            ApiError::new(request_id, "not_found", "no upload in progress")
        }
        StoreError::NoMappingSaved => {
            ApiError::new(request_id, "not_found", "no column mapping saved")
        }
        StoreError::Domain(core) => map_core_error(request_id, core),
        StoreError::Io(e) => {
            tracing::error!(error = %e, "upload storage failed");
            ApiError::new(request_id, "internal_error", "upload storage failed")
        }
    }
}

pub(super) fn map_core_error(request_id: String, error: &CoreError) -> ApiError {
    match error {
        CoreError::IllegalTransition { .. } => {
            ApiError::new(request_id, "conflict", error.to_string())
        }
        _ => ApiError::new(request_id, "validation_error", error.to_string()),
    }
}

/// Map engine failures. Connectivity problems and engine-side crashes are
/// upstream errors; an engine rejection of the caller's data comes back as a
/// plain bad request.
pub(super) fn map_engine_error(request_id: String, error: &EngineError) -> ApiError {
    match error {
        EngineError::Api { status, message } if *status < 500 => {
            ApiError::new(request_id, "bad_request", message.clone())
        }
        EngineError::Unreachable(_) | EngineError::Api { .. } => {
            tracing::warn!(error = %error, "analysis engine failure");
            ApiError::new(request_id, "upstream_error", "analysis engine unavailable")
        }
        EngineError::Deserialize { .. } | EngineError::Config(_) => {
            tracing::error!(error = %error, "unexpected engine response");
            ApiError::new(
                request_id,
                "upstream_error",
                "unexpected analysis engine response",
            )
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-session-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    // Uploaded files may approach the validator's cap; leave headroom for
    // multipart framing before the validator produces its own 400.
    let body_limit = usize::try_from(state.max_upload_bytes.saturating_add(64 * 1024))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/uploads",
            axum::routing::post(uploads::create_upload),
        )
        .route("/api/v1/uploads/current", get(uploads::current_upload))
        .route(
            "/api/v1/mappings/current",
            get(mappings::get_mapping).put(mappings::save_mapping),
        )
        .route(
            "/api/v1/jobs",
            get(jobs::list_history).post(jobs::create_job),
        )
        .route(
            "/api/v1/jobs/{job_id}",
            get(jobs::job_status).delete(jobs::delete_job),
        )
        .route("/api/v1/jobs/{job_id}/results", get(jobs::job_results))
        .route(
            "/api/v1/jobs/{job_id}/cancel",
            axum::routing::post(jobs::cancel_job),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn(session_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let engine = if state.engine.is_some() {
        "configured"
    } else {
        "demo-only"
    };
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                engine,
            },
            meta,
        }),
    )
}
