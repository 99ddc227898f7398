use super::state::AppState;
use crate::call::CallSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CallActionResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /call/start
/// Place a new call
pub async fn start_call(State(state): State<AppState>) -> impl IntoResponse {
    info!("Start call requested");

    if let Err(e) = state.call.start_call() {
        warn!("Failed to start call: {}", e);

        let status = if state.call.snapshot().is_active {
            StatusCode::CONFLICT
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        return (
            status,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response();
    }

    (
        StatusCode::ACCEPTED,
        Json(CallActionResponse {
            status: "connecting".to_string(),
            message: "Call starting".to_string(),
        }),
    )
        .into_response()
}

/// POST /call/stop
/// Tear down the current call
pub async fn stop_call(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stop call requested");

    match state.call.stop_call() {
        Ok(()) => (
            StatusCode::OK,
            Json(CallActionResponse {
                status: "stopping".to_string(),
                message: "Call stopping".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to stop call: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /call
/// Current call snapshot
pub async fn get_call(State(state): State<AppState>) -> Json<CallSnapshot> {
    Json(state.call.snapshot())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
