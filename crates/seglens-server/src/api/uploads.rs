//! Upload endpoints: receive a file, preview its columns, and expose the
//! session's current upload.

use std::collections::HashMap;

use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use seglens_core::mapping::ColumnMapping;
use seglens_core::upload::UploadRecord;
use serde::Serialize;

use crate::middleware::{RequestId, SessionKey};

use super::{map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Wire shape of an upload record. The storage path stays server-side.
#[derive(Debug, Serialize)]
pub struct UploadView {
    pub id: String,
    pub filename: String,
    pub size_bytes: u64,
    pub columns: Vec<String>,
    pub sample_rows: Vec<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_mapping: Option<ColumnMapping>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<UploadRecord> for UploadView {
    fn from(record: UploadRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            size_bytes: record.size_bytes,
            columns: record.columns,
            sample_rows: record.sample_rows,
            suggested_mapping: record.suggested_mapping,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// `POST /api/v1/uploads`
///
/// Accepts a multipart form with a single `file` part, stores it, and makes
/// it the session's current upload. Spreadsheet files cannot be previewed
/// locally; when an engine is configured its preview endpoint fills the gap,
/// and when that fails the upload is still accepted without a preview.
pub async fn create_upload(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadView>>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("malformed multipart body: {e}"),
        )
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.csv").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                ApiError::new(
                    req_id.0.clone(),
                    "bad_request",
                    format!("failed to read file part: {e}"),
                )
            })?;
            file = Some((filename, bytes.to_vec()));
        }
    }
    let Some((filename, bytes)) = file else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "multipart form must contain a 'file' part",
        ));
    };

    let mut record = state
        .uploads
        .receive(&filename, &bytes)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    if record.columns.is_empty() {
        if let Some(engine) = &state.engine {
            match engine.preview(&filename, bytes).await {
                Ok(preview) => {
                    record.columns = preview.columns;
                    record.sample_rows = preview.sample_rows;
                    record.suggested_mapping = preview.suggested_mapping;
                }
                Err(e) => {
                    tracing::warn!(error = %e, filename = %filename, "engine preview unavailable");
                }
            }
        }
    }

    state
        .sessions
        .set_current_upload(&session.0, record.clone())
        .await;

    tracing::info!(upload_id = %record.id, filename = %record.filename, "upload accepted");
    Ok(Json(ApiResponse {
        data: record.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/uploads/current`
pub async fn current_upload(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
) -> Result<Json<ApiResponse<UploadView>>, ApiError> {
    let record = state
        .sessions
        .current_upload(&session.0)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: record.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
