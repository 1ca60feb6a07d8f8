//! API route handlers for the gateway.

use axum::http::StatusCode;
use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;
use taskpilot_core::error::PilotError;

use super::server::AppState;

type ApiResponse = (StatusCode, Json<Value>);

const ENDPOINTS: &[&str] = &[
    "GET /health",
    "GET /status",
    "POST /api/v1/tasks",
    "POST /api/v1/nlp",
    "POST /schedule",
    "POST /email",
    "POST /nlp",
];

fn error_response(e: &PilotError) -> ApiResponse {
    let status = match e {
        PilotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"ok": false, "error": e.to_string()})))
}

fn require_field<'a>(body: &'a Value, field: &str) -> Result<&'a str, ApiResponse> {
    match body[field].as_str().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error": format!("'{field}' is required")})),
        )),
    }
}

/// Health check endpoint.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "taskpilot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Service status: endpoints, uptime, scheduler state.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "running",
        "service": "taskpilot",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "scheduler": state.scheduler.state(),
        "timezone": state.agent.timezone().name(),
        "generator": state.agent.generator_name(),
        "endpoints": ENDPOINTS,
    }))
}

/// Classify and route one task: `{"task": "..."}`.
pub async fn process_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let task = match require_field(&body, "task") {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match state.agent.process_task(task).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "task": task,
                "type": outcome.task.task_type,
                "action": outcome.action,
                "advisory": outcome.advisory,
            })),
        ),
        Err(e) => {
            tracing::warn!("Task failed: {e}");
            error_response(&e)
        }
    }
}

/// Free-text command to the text generator: `{"command": "..."}`.
pub async fn process_command(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let command = match require_field(&body, "command") {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match state.agent.process_command(command).await {
        Ok(response) => (
            StatusCode::OK,
            Json(json!({"ok": true, "command": command, "response": response})),
        ),
        Err(e) => {
            tracing::warn!("Command failed: {e}");
            error_response(&e)
        }
    }
}
