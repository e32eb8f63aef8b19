//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    state::{SchedulerState, TimerSession},
    utils::format_time,
};

/// Session snapshot as rendered to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: TimerSession,
    pub state: SchedulerState,
    /// Countdown formatted as `m:ss`
    pub remaining_display: String,
}

impl From<TimerSession> for SessionView {
    fn from(session: TimerSession) -> Self {
        Self {
            state: session.state(),
            remaining_display: format_time(session.remaining_seconds),
            session,
        }
    }
}

/// API response structure for session-changing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: Option<SessionView>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, session: Option<TimerSession>) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            session: session.map(SessionView::from),
        }
    }

    pub fn ok(message: String, session: TimerSession) -> Self {
        Self::new("ok", message, Some(session))
    }

    pub fn error(message: String, session: Option<TimerSession>) -> Self {
        Self::new("error", message, session)
    }
}

/// Body of `PUT /settings`. The interval accepts numbers or text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsRequest {
    pub interval: Option<Value>,
    pub message: Option<String>,
}

/// Status response with session and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session: SessionView,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
