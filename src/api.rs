// src/api.rs
//! Oracle external-adapter shell.
//!
//! `POST /` takes a job request:
//! ```json
//! { "id": "job-1", "data": { "hashtag": "#rust", "referenced_tweet_id": "123" } }
//! ```
//! and answers with `{ jobRunID, statusCode, data, result }` (or `error` on failure).

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::analyze::{CredibilityEngine, CredibilityReport, TargetOutcome};
use crate::error::CredibilityError;

pub const NOT_FOUND_ERROR: &str = "retweet_id_not_found";
const DEFAULT_JOB_ID: &str = "1";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CredibilityEngine>,
}

impl AppState {
    pub fn new(engine: CredibilityEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_request))
        .route("/health", get(|| async { "OK" }))
        .route("/report", get(report))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct JobRequest {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    data: JobParams,
}

#[derive(Debug, Default, Deserialize)]
struct JobParams {
    #[serde(default)]
    hashtag: Option<String>,
    #[serde(default)]
    referenced_tweet_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct JobResult {
    bm25f_average: f64,
    retweet_id_bm25f_rate: f64,
}

#[derive(Debug, Serialize)]
struct JobData {
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bm25f_average: Option<f64>,
}

#[derive(Debug, Serialize)]
struct JobError {
    name: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct JobEnvelope {
    #[serde(rename = "jobRunID")]
    job_run_id: String,
    #[serde(rename = "statusCode")]
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<JobData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JobError>,
}

impl JobEnvelope {
    fn success(job_run_id: String, status: StatusCode, data: JobData) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                job_run_id,
                status_code: status.as_u16(),
                status: None,
                data: Some(data),
                error: None,
            }),
        )
    }

    fn errored(
        job_run_id: String,
        status: StatusCode,
        name: &'static str,
        message: String,
    ) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                job_run_id,
                status_code: status.as_u16(),
                status: Some("errored"),
                data: None,
                error: Some(JobError { name, message }),
            }),
        )
    }
}

fn job_run_id(id: Option<serde_json::Value>) -> String {
    match id {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => DEFAULT_JOB_ID.to_string(),
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("Required parameter not supplied: {name}"))
}

fn error_status(err: &CredibilityError) -> StatusCode {
    match err {
        CredibilityError::Fetch(_) | CredibilityError::MalformedRecord { .. } => {
            StatusCode::BAD_GATEWAY
        }
        CredibilityError::EmptyCollection(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CredibilityError::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

async fn create_request(
    State(state): State<AppState>,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> (StatusCode, Json<JobEnvelope>) {
    // Unreadable bodies still get an envelope so the node can match the job.
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return JobEnvelope::errored(
                DEFAULT_JOB_ID.to_string(),
                StatusCode::BAD_REQUEST,
                "ValidationError",
                rejection.body_text(),
            )
        }
    };
    let job_run_id = job_run_id(req.id);

    let params = required(req.data.hashtag, "hashtag").and_then(|tag| {
        required(req.data.referenced_tweet_id, "referenced_tweet_id").map(|target| (tag, target))
    });
    let (hashtag, target_id) = match params {
        Ok(p) => p,
        Err(message) => {
            return JobEnvelope::errored(
                job_run_id,
                StatusCode::BAD_REQUEST,
                "ValidationError",
                message,
            )
        }
    };

    match state.engine.score_for_target(&hashtag, &target_id).await {
        Ok(TargetOutcome::Found(score)) => JobEnvelope::success(
            job_run_id,
            StatusCode::OK,
            JobData {
                result: Some(JobResult {
                    bm25f_average: score.average_score,
                    retweet_id_bm25f_rate: score.target_score,
                }),
                error: None,
                bm25f_average: None,
            },
        ),
        Ok(TargetOutcome::NotFound { average_score, .. }) => JobEnvelope::success(
            job_run_id,
            StatusCode::NOT_FOUND,
            JobData {
                result: None,
                error: Some(NOT_FOUND_ERROR),
                bm25f_average: Some(average_score),
            },
        ),
        Err(e) => {
            tracing::warn!(target: "credibility", error = %e, job = %job_run_id, "job failed");
            JobEnvelope::errored(job_run_id, error_status(&e), e.kind(), e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    hashtag: String,
}

async fn report(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<Json<CredibilityReport>, (StatusCode, String)> {
    state
        .engine
        .report(&q.hashtag)
        .await
        .map(Json)
        .map_err(|e| (error_status(&e), e.to_string()))
}
