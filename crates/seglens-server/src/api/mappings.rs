//! Column mapping endpoints: read and replace the session's saved mapping.

use axum::extract::State;
use axum::{Extension, Json};
use seglens_core::mapping::ColumnMapping;

use crate::middleware::{RequestId, SessionKey};

use super::{map_core_error, map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// `GET /api/v1/mappings/current`
pub async fn get_mapping(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
) -> Result<Json<ApiResponse<ColumnMapping>>, ApiError> {
    let mapping = state
        .sessions
        .current_mapping(&session.0)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: mapping,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `PUT /api/v1/mappings/current`
///
/// Replaces the saved mapping wholesale. The mapping must be complete and
/// free of duplicate column assignments; a rejected mapping leaves any
/// previously saved one untouched.
pub async fn save_mapping(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
    Json(mapping): Json<ColumnMapping>,
) -> Result<Json<ApiResponse<ColumnMapping>>, ApiError> {
    mapping
        .validate()
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    state
        .sessions
        .set_current_mapping(&session.0, mapping.clone())
        .await;

    Ok(Json(ApiResponse {
        data: mapping,
        meta: ResponseMeta::new(req_id.0),
    }))
}
