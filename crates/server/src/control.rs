//! HTTP control API for the local platform.
//!
//! Delivers the platform's inbound callbacks over HTTP so the server can be
//! driven without the managed service:
//!
//! * `POST /session` with a [`GameSessionDescriptor`] body: start a session
//! * `GET /health`: health check
//! * `POST /terminate`: terminate the process
//! * `GET /status`: lifecycle state and counters

use std::sync::Arc;

use axum::{Json, Router};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::json;
use tokio::net::TcpListener;

use crate::lifecycle::{LifecycleController, StatusSnapshot};
use crate::platform::{GameSessionDescriptor, PlatformCallbacks};

pub fn router(controller: Arc<LifecycleController>) -> Router {
    Router::new()
        .route("/session", post(start_session))
        .route("/health", get(health))
        .route("/terminate", post(terminate))
        .route("/status", get(status))
        .with_state(controller)
}

/// Serve the control API until the controller shuts down.
pub async fn serve(
    controller: Arc<LifecycleController>,
    listener: TcpListener,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Control API listening on http://{}", addr);
    }
    let stop = Arc::clone(&controller);
    axum::serve(listener, router(controller))
        .with_graceful_shutdown(async move { stop.wait_for_shutdown().await })
        .await?;
    Ok(())
}

async fn start_session(
    State(controller): State<Arc<LifecycleController>>,
    Json(descriptor): Json<GameSessionDescriptor>,
) -> impl IntoResponse {
    let session_id = descriptor.session_id.clone();
    let activated = controller.on_start_game_session(descriptor);
    let code = if activated {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    (code, Json(json!({ "activated": activated, "sessionId": session_id })))
}

async fn health(State(controller): State<Arc<LifecycleController>>) -> impl IntoResponse {
    let healthy = controller.on_health_check();
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(json!({ "healthy": healthy })))
}

async fn terminate(State(controller): State<Arc<LifecycleController>>) -> impl IntoResponse {
    let ended = controller.on_process_terminate();
    (StatusCode::OK, Json(json!({ "terminated": true, "processEnding": ended })))
}

async fn status(State(controller): State<Arc<LifecycleController>>) -> Json<StatusSnapshot> {
    Json(controller.status())
}
