//! Error types shared by the session, the capability backends and the API

use crate::services::PermissionState;

/// Failures reported by a notification capability backend
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("notification could not be shown: {0}")]
    Show(String),
    #[error("permission prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
    #[error("notification worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    #[error("failed to lock {0}")]
    Poisoned(&'static str),
}

/// Errors returned by timer session operations
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    #[error("notifications are not supported in this environment")]
    Unsupported,
    #[error("notification permission is {0}; request permission and try again")]
    PermissionRequired(PermissionState),
    #[error("settings cannot change while the timer is running")]
    Locked,
    #[error("timer is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error("failed to lock {0}")]
    Poisoned(&'static str),
}
