//! Job lifecycle endpoints: creation with remote/demo dispatch, status
//! polling, results, cancellation, deletion, and history listing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use seglens_core::job::{HistoryQuery, Job, JobStatus, JobSummary, SourceMode};
use seglens_core::mapping::ColumnMapping;
use seglens_core::result::AnalysisResult;
use seglens_engine::SubmitOptions;
use seglens_store::{history, DemoSource};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{RequestId, SessionKey};

use super::{
    map_core_error, map_engine_error, map_store_error, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct CreateJobRequest {
    /// Inline mapping; falls back to the session's saved mapping when absent.
    #[serde(default)]
    pub mapping: Option<ColumnMapping>,
    #[serde(default)]
    pub clustering_method: Option<String>,
    #[serde(default)]
    pub include_comparison: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub jobs: Vec<JobSummary>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Serialize)]
pub struct DeleteAck {
    pub job_id: String,
    pub deleted: bool,
}

/// `POST /api/v1/jobs`
///
/// Creates an analysis job from the session's current upload. With an engine
/// configured the file is submitted remotely; a connectivity failure at this
/// point falls back to a local demo job so the caller still gets a working
/// flow. An engine that answered but rejected the submission is surfaced as
/// an error instead, since falling back would mask real input problems.
pub async fn create_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Job>>), ApiError> {
    let upload = state
        .sessions
        .current_upload(&session.0)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let mapping = match request.mapping {
        Some(m) => m,
        None => state
            .sessions
            .current_mapping(&session.0)
            .await
            .map_err(|e| map_store_error(req_id.0.clone(), &e))?,
    };
    mapping
        .validate()
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    let mut options = SubmitOptions::default();
    if let Some(method) = request.clustering_method {
        options.clustering_method = method;
    }
    if let Some(include) = request.include_comparison {
        options.include_comparison = include;
    }

    if let Some(engine) = &state.engine {
        let bytes = state
            .uploads
            .read_stored(&upload)
            .await
            .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

        match engine
            .submit_job(&upload.filename, bytes, &mapping, &options)
            .await
        {
            Ok(ack) => {
                let job = Job::new(
                    ack.job_id,
                    SourceMode::Remote,
                    upload.filename.clone(),
                    ack.created_at,
                );
                let cell = state.sessions.insert_job(&session.0, job, None).await;
                let job = cell.snapshot().await;
                tracing::info!(job_id = %job.job_id, "remote job created");
                return Ok((
                    StatusCode::CREATED,
                    Json(ApiResponse {
                        data: job,
                        meta: ResponseMeta::new(req_id.0),
                    }),
                ));
            }
            Err(e) if e.is_connectivity() => {
                tracing::warn!(error = %e, "engine unreachable, falling back to demo mode");
            }
            Err(e) => return Err(map_engine_error(req_id.0, &e)),
        }
    }

    let job_id = format!("demo_{}", Uuid::new_v4().simple());
    let job = Job::new(
        job_id,
        SourceMode::Demo,
        upload.filename.clone(),
        Utc::now(),
    );
    let demo = DemoSource {
        sample_rows: upload.sample_rows,
        mapping,
    };
    let cell = state.sessions.insert_job(&session.0, job, Some(demo)).await;
    let job = cell.snapshot().await;
    tracing::info!(job_id = %job.job_id, "demo job created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: job,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// `GET /api/v1/jobs/{job_id}`
///
/// Demo jobs derive their state from elapsed time on each poll; remote jobs
/// are refreshed from the engine. A connectivity failure during a remote
/// refresh is surfaced as an upstream error, not a fallback.
pub async fn job_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let cell = state
        .sessions
        .job(&session.0, &job_id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let snapshot = cell.snapshot().await;
    let job = match snapshot.source_mode {
        SourceMode::Demo => cell.poll(Utc::now()).await,
        SourceMode::Remote => match &state.engine {
            Some(engine) if !snapshot.status.is_terminal() => {
                let remote = engine
                    .job_status(&job_id)
                    .await
                    .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
                cell.apply_remote(
                    remote.status,
                    remote.error_message,
                    remote.completed_at,
                    remote.progress,
                )
                .await
            }
            _ => snapshot,
        },
    };

    Ok(Json(ApiResponse {
        data: job,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/jobs/{job_id}/results`
///
/// Results exist only for completed jobs. The demo path polls first so a job
/// whose completion threshold has passed yields results on the same request.
pub async fn job_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisResult>>, ApiError> {
    let cell = state
        .sessions
        .job(&session.0, &job_id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let snapshot = cell.snapshot().await;
    match snapshot.source_mode {
        SourceMode::Demo => {
            let job = cell.poll(Utc::now()).await;
            match cell.result().await {
                Some(result) => Ok(Json(ApiResponse {
                    data: result.as_ref().clone(),
                    meta: ResponseMeta::new(req_id.0),
                })),
                None => Err(ApiError::new(
                    req_id.0,
                    "conflict",
                    format!("job is {}, results are not available", job.status),
                )),
            }
        }
        SourceMode::Remote => {
            let Some(engine) = &state.engine else {
                return Err(ApiError::new(
                    req_id.0,
                    "upstream_error",
                    "no analysis engine configured for this job",
                ));
            };
            let result = engine
                .job_results(&job_id)
                .await
                .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
            Ok(Json(ApiResponse {
                data: result,
                meta: ResponseMeta::new(req_id.0),
            }))
        }
    }
}

/// `POST /api/v1/jobs/{job_id}/cancel`
///
/// Cancellation is local-first: the remote side is told best-effort, but the
/// job's local state is the source of truth for the caller.
pub async fn cancel_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let cell = state
        .sessions
        .job(&session.0, &job_id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let snapshot = cell.snapshot().await;
    if snapshot.source_mode == SourceMode::Remote {
        if let Some(engine) = &state.engine {
            if let Err(e) = engine.cancel_job(&job_id).await {
                tracing::warn!(error = %e, job_id = %job_id, "remote cancel failed, cancelling locally");
            }
        }
    } else {
        // A demo job may have crossed its completion threshold since the
        // caller last polled; advance before judging the transition.
        cell.poll(Utc::now()).await;
    }

    let job = cell
        .cancel()
        .await
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    tracing::info!(job_id = %job.job_id, "job cancelled");
    Ok(Json(ApiResponse {
        data: job,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `DELETE /api/v1/jobs/{job_id}`
///
/// Permitted in any state. After deletion the id is unknown, so a repeated
/// delete or a status poll both answer 404.
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionKey>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<DeleteAck>>, ApiError> {
    let cell = state
        .sessions
        .job(&session.0, &job_id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let snapshot = cell.snapshot().await;
    if snapshot.source_mode == SourceMode::Remote {
        if let Some(engine) = &state.engine {
            if let Err(e) = engine.delete_job(&job_id).await {
                tracing::warn!(error = %e, job_id = %job_id, "remote delete failed, removing locally");
            }
        }
    }

    state
        .sessions
        .remove_job(&session.0, &job_id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    tracing::info!(job_id = %job_id, "job deleted");
    Ok(Json(ApiResponse {
        data: DeleteAck {
            job_id,
            deleted: true,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/jobs`
///
/// With an engine configured the filters are forwarded verbatim and its
/// listing is returned as-is; otherwise the local demo record set is
/// filtered with the same semantics.
pub async fn list_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ApiResponse<HistoryPage>>, ApiError> {
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<JobStatus>().map_err(|e| {
            ApiError::new(req_id.0.clone(), "validation_error", e)
        })?),
        None => None,
    };

    let query = HistoryQuery {
        page: params.page.unwrap_or(1).max(1),
        per_page: params
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE),
        status,
        search: params.search.filter(|s| !s.trim().is_empty()),
    };

    let (jobs, total) = match &state.engine {
        Some(engine) => {
            let page = engine
                .list_jobs(&query)
                .await
                .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
            (page.jobs, page.total)
        }
        None => history::list_jobs(history::demo_history(), &query),
    };

    Ok(Json(ApiResponse {
        data: HistoryPage {
            jobs,
            total,
            page: query.page,
            per_page: query.per_page,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
