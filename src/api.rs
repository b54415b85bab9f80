use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::jobs::manager::{JobError, JobManager, NewJob};
use crate::jobs::JobId;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<JobManager>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/jobs", post(create_job))
        .route("/jobs/cancel-all", post(cancel_all))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/cancel", post(cancel_job))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct CreateJobReq {
    keywords: Vec<String>,
    sources: Vec<String>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    concurrency: Option<usize>,
}

#[derive(serde::Serialize)]
struct CreateJobResp {
    job_id: JobId,
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

struct ApiError(JobError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            JobError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            JobError::NotFound => StatusCode::NOT_FOUND,
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        Self(err)
    }
}

async fn create_job(
    State(state): State<AppState>,
    Json(body): Json<CreateJobReq>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = state.manager.create_job(NewJob {
        keywords: body.keywords,
        sources: body.sources,
        limit: body.limit,
        concurrency: body.concurrency,
    })?;
    Ok((StatusCode::ACCEPTED, Json(CreateJobResp { job_id })))
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.manager.get_job(id)?;
    Ok(Json(view))
}

async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.manager.cancel_job(id)?;
    Ok(Json(view))
}

#[derive(serde::Serialize)]
struct CancelAllResp {
    cancelled: usize,
}

async fn cancel_all(State(state): State<AppState>) -> Json<CancelAllResp> {
    Json(CancelAllResp {
        cancelled: state.manager.cancel_all(),
    })
}
