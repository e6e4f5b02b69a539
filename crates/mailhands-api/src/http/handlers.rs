//! Email task handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use mailhands_core::{DomAnalysis, ProviderSummary, TaskRecord};
use mailhands_protocols::SessionOptions;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Request to send an email.
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    /// Natural language instruction, e.g.
    /// "Send an email to john@example.com about project update saying 'Phase 1 completed'".
    pub instruction: String,

    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// Falls back to the server default when absent.
    pub headless: Option<bool>,
}

fn default_providers() -> Vec<String> {
    vec!["gmail".to_string()]
}

/// Accepted send task.
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub task_id: String,
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub active_tasks: usize,
    pub uptime_secs: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderSummary>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearTasksResponse {
    pub message: String,
    pub evicted: usize,
    pub remaining: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub provider: String,
    pub headless: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub provider: String,
    pub analysis: DomAnalysis,
    pub timestamp: DateTime<Utc>,
}

/// Health banner.
///
/// GET /
pub async fn root(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "MailHands API".to_string(),
        status: "active".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_tasks: state.registry.active(),
        uptime_secs: state.uptime().as_secs(),
        timestamp: Utc::now(),
    })
}

/// GET /providers
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.coordinator().catalog().summaries(),
    })
}

/// Validate, parse and queue a send task. Returns before any browser work.
///
/// POST /email/send
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendEmailRequest>,
) -> Result<(StatusCode, Json<SendEmailResponse>), ApiError> {
    if request.instruction.trim().is_empty() {
        return Err(ApiError::InvalidRequest("instruction is empty".to_string()));
    }

    state.coordinator().resolve_providers(&request.providers)?;
    let intent = state.parser.parse(&request.instruction)?;

    let options = SessionOptions::headless(request.headless.unwrap_or(state.default_headless));
    let task_id = state
        .registry
        .submit(intent, request.providers, options)?;
    info!("Queued email task {}", task_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(SendEmailResponse {
            task_id,
            status: "pending".to_string(),
            message: "Email task queued successfully".to_string(),
            timestamp: Utc::now(),
        }),
    ))
}

/// GET /email/status/{task_id}
pub async fn task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskRecord>, ApiError> {
    Ok(Json(state.registry.status(&task_id)?))
}

/// GET /email/tasks
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<TaskListResponse> {
    let tasks = state.registry.list();
    let total = tasks.len();
    Json(TaskListResponse { tasks, total })
}

/// Evict finished tasks. Pending and running tasks stay.
///
/// DELETE /email/tasks
pub async fn clear_tasks(State(state): State<Arc<AppState>>) -> Json<ClearTasksResponse> {
    let evicted = state.registry.evict_terminal();
    Json(ClearTasksResponse {
        message: format!("Cleared {} tasks", evicted),
        evicted,
        remaining: state.registry.len(),
    })
}

/// POST /email/analyze?provider=gmail
pub async fn analyze_provider(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let options = SessionOptions::headless(query.headless.unwrap_or(state.default_headless));
    let analysis = state
        .coordinator()
        .analyze(&query.provider, &options)
        .await
        .inspect_err(|e| warn!("DOM analysis failed: {}", e))?;

    Ok(Json(AnalyzeResponse {
        provider: analysis.provider.clone(),
        analysis,
        timestamp: Utc::now(),
    }))
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
