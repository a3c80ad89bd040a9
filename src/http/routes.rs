//! Agent control routes.
//!
//! ```text
//! GET  /test                         → {"response":"AOK","error":null}
//! GET  /manualRegister?host=&port=   → "ok", register in background
//! GET  /manualUnregister?host=&port= → "ok", unregister in background
//! POST /terminate                    → {"msg": "<shutdown reason>"}
//! ```

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;

use crate::agent::Agent;
use crate::config::DirectoryCoordinates;
use crate::lifecycle::GracefulServer;
use crate::registration::RuntimeData;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Agent,
    pub server: Arc<dyn GracefulServer>,
    /// Notified once `/terminate` has produced its reason.
    pub terminated: Arc<Notify>,
}

impl AppState {
    pub fn new(agent: Agent, server: Arc<dyn GracefulServer>) -> Self {
        Self {
            agent,
            server,
            terminated: Arc::new(Notify::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/test", get(test_handler))
        .route("/manualRegister", get(manual_register))
        .route("/manualUnregister", get(manual_unregister))
        .route("/terminate", post(terminate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Default, Deserialize)]
pub struct ManualParams {
    pub host: Option<String>,
    pub port: Option<String>,
}

async fn test_handler() -> Json<serde_json::Value> {
    Json(json!({ "response": "AOK", "error": null }))
}

async fn manual_register(
    State(state): State<AppState>,
    Query(params): Query<ManualParams>,
) -> Response {
    let data = match manual_runtime_data(&state.agent, &params) {
        Ok(data) => data,
        Err(response) => return response,
    };
    let agent = state.agent.clone();
    tokio::spawn(async move {
        let _ = agent.register(data).await;
    });
    Json("ok").into_response()
}

async fn manual_unregister(
    State(state): State<AppState>,
    Query(params): Query<ManualParams>,
) -> Response {
    let data = match manual_runtime_data(&state.agent, &params) {
        Ok(data) => data,
        Err(response) => return response,
    };
    let agent = state.agent.clone();
    tokio::spawn(async move {
        let _ = agent.unregister(Some(data)).await;
    });
    Json("ok").into_response()
}

async fn terminate(State(state): State<AppState>) -> Json<serde_json::Value> {
    tracing::info!("Terminate requested");
    let reason = state.agent.terminate(state.server.clone(), None).await;
    state.terminated.notify_one();
    Json(json!({ "msg": reason.as_str() }))
}

/// `{port: last.port}`, plus an `lcManagerRegister` override when both host and port are given.
fn manual_runtime_data(agent: &Agent, params: &ManualParams) -> Result<RuntimeData, Response> {
    let mut data = RuntimeData::new();
    if let Some(port) = agent.last_runtime_data().and_then(|d| d.port()) {
        data.insert("port", port);
    }

    let port = match params.port.as_deref() {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                let body = Json(json!({ "error": format!("invalid port: {raw}") }));
                return Err((StatusCode::BAD_REQUEST, body).into_response());
            }
        },
        None => None,
    };

    if let (Some(host), Some(port)) = (params.host.as_deref(), port) {
        data = data.with_register_coordinates(&DirectoryCoordinates::new(host, port));
    }
    Ok(data)
}
