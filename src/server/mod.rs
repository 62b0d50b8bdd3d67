//! HTTP session transport.
//!
//! - `POST /plan` advances a session by one message.
//! - `DELETE /session/{session_id}` drops a session.
//! - `GET /health` reports liveness.
//!
//! Any failure inside the planning graph is returned as a 500 with a
//! `detail` message; the session keeps whatever state the graph reached.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::agent::TripPlanner;
use crate::core::{Phase, ResearchBundle};
use crate::session::SessionStore;

/// Shared state for all handlers.
#[derive(Debug, Clone)]
pub struct ServerState {
    planner: Arc<TripPlanner>,
    sessions: Arc<SessionStore>,
}

impl ServerState {
    /// Creates handler state.
    #[must_use]
    pub const fn new(planner: Arc<TripPlanner>, sessions: Arc<SessionStore>) -> Self {
        Self { planner, sessions }
    }
}

/// Body of `POST /plan`.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    /// The user's message.
    pub message: String,
    /// Session to advance.
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default".to_string()
}

/// Response of `POST /plan`.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// Text to show the user.
    pub response_text: String,
    /// Final plan, once done.
    pub final_plan: Option<String>,
    /// Research records, once dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<ResearchBundle>,
    /// Per-person budget lines, once synthesized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_breakdown: Option<BTreeMap<String, f64>>,
    /// Whether the session is finished.
    pub done: bool,
}

/// Handler failure rendered as `{"detail": ...}`.
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Builds the router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/plan", post(plan_handler))
        .route("/session/{session_id}", delete(clear_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn plan_handler(
    State(state): State<ServerState>,
    Json(body): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            detail: "message must not be empty".to_string(),
        });
    }

    let session = state.sessions.acquire(&body.session_id);
    let mut trip = session.lock().await;

    let reply = state
        .planner
        .advance(&mut trip, &body.message)
        .await
        .map_err(|e| {
            error!(session = %body.session_id, error = %e, "planning graph failed");
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: e.to_string(),
            }
        })?;

    let researched = matches!(trip.phase, Phase::Synthesizing | Phase::Done);
    Ok(Json(PlanResponse {
        response_text: reply.response_text,
        final_plan: reply.final_plan,
        research: researched.then(|| trip.research.clone()),
        budget_breakdown: (!trip.budget_breakdown.is_empty())
            .then(|| trip.budget_breakdown.clone()),
        done: reply.done,
    }))
}

async fn clear_handler(
    State(state): State<ServerState>,
    Path(session_id): Path<String>,
) -> Json<serde_json::Value> {
    let existed = state.sessions.clear(&session_id);
    info!(session = %session_id, existed, "session cleared");
    Json(json!({ "status": "cleared", "session_id": session_id }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Serves the API on `host:port` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(
    state: ServerState,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "trip planner listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("server stopped");
    Ok(())
}
