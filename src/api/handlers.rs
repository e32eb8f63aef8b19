//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tracing::{error, info, warn};

use super::responses::{ApiResponse, HealthResponse, SessionView, SettingsRequest, StatusResponse};
use crate::{
    error::TimerError,
    state::{session::interval_from_json, AppState},
};

type Rejection = (StatusCode, Json<ApiResponse>);

fn status_code(error: &TimerError) -> StatusCode {
    match error {
        TimerError::Unsupported => StatusCode::SERVICE_UNAVAILABLE,
        TimerError::PermissionRequired(_) => StatusCode::FORBIDDEN,
        TimerError::Locked | TimerError::AlreadyRunning => StatusCode::CONFLICT,
        TimerError::Capability(_) => StatusCode::BAD_GATEWAY,
        TimerError::Poisoned(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn a session error into a response carrying the current session
fn reject(state: &AppState, e: TimerError) -> Rejection {
    let code = status_code(&e);
    if code.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (
        code,
        Json(ApiResponse::error(e.to_string(), state.snapshot().ok())),
    )
}

/// Handle POST /permission - Ask the user for notification permission
pub async fn permission_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, Rejection> {
    let permission = state
        .request_permission()
        .await
        .map_err(|e| reject(&state, e))?;
    let session = state.snapshot().map_err(|e| reject(&state, e))?;

    info!(permission = %permission, "Permission endpoint called");
    Ok(Json(ApiResponse::ok(
        format!("Notification permission is {}", permission),
        session,
    )))
}

/// Handle PUT /settings - Change interval and message while idle
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<ApiResponse>, Rejection> {
    let interval = request.interval.as_ref().map(interval_from_json);
    let session = state
        .configure(interval, request.message)
        .map_err(|e| reject(&state, e))?;

    Ok(Json(ApiResponse::ok("Settings updated".to_string(), session)))
}

/// Handle POST /timer/start - Start periodic notifications
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, Rejection> {
    let session = state.start().await.map_err(|e| reject(&state, e))?;

    Ok(Json(ApiResponse::ok(
        format!(
            "Timer started, notifying every {}s",
            session.interval_seconds
        ),
        session,
    )))
}

/// Handle POST /timer/stop - Stop periodic notifications
pub async fn stop_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, Rejection> {
    let session = state.stop().await.map_err(|e| reject(&state, e))?;

    Ok(Json(ApiResponse::ok("Timer stopped".to_string(), session)))
}

/// Handle POST /notify - Send one notification now
pub async fn notify_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, Rejection> {
    let count = state.dispatch_now().await.map_err(|e| reject(&state, e))?;
    let session = state.snapshot().map_err(|e| reject(&state, e))?;

    Ok(Json(ApiResponse::ok(
        format!("Notification sent ({} total)", count),
        session,
    )))
}

/// Handle POST /count/reset - Zero the dispatch counter
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, Rejection> {
    let session = state.reset_count().map_err(|e| reject(&state, e))?;

    Ok(Json(ApiResponse::ok("Dispatch count reset".to_string(), session)))
}

/// Handle GET /status - Return current session status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let session = match state.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get session state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(StatusResponse {
        session: SessionView::from(session),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /status/stream - Push a session snapshot on every change
pub async fn status_stream_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = state.subscribe();

    let events = stream::unfold((updates, true), |(mut updates, first)| async move {
        if !first && updates.changed().await.is_err() {
            return None;
        }

        let view = SessionView::from(updates.borrow_and_update().clone());
        let event = Event::default()
            .event("session")
            .json_data(&view)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Some((Ok(event), (updates, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
