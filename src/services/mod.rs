//! Notification capability and the services built on top of it
//!
//! The platform's notification surface is reached only through the
//! [`NotificationCapability`] trait so the session logic runs the same way
//! against desktop notifications, the log, or an in-memory recorder.

pub mod desktop;
pub mod dispatcher;
pub mod log_only;
pub mod memory;
pub mod permission;

use std::fmt;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

pub use desktop::DesktopCapability;
pub use dispatcher::{Dispatcher, NotificationTemplate};
pub use log_only::LogCapability;
pub use memory::MemoryCapability;
pub use permission::PermissionGate;

/// Grant state of the notification permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Default,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionState::Default => "default",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a backend answers an interactive permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionPolicy {
    /// Ask on the terminal
    Ask,
    /// Grant without asking
    Allow,
    /// Refuse without asking
    Deny,
}

/// One user-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Notifications sharing a tag replace each other instead of stacking
    pub tag: String,
    pub require_interaction: bool,
    pub silent: bool,
}

/// Platform notification surface
#[async_trait]
pub trait NotificationCapability: Send + Sync {
    /// Whether notifications can be shown at all. Absence is not an error.
    async fn probe_support(&self) -> bool;

    /// Current grant state, without prompting
    fn query_permission(&self) -> PermissionState;

    /// Interactive prompt; resolves once the user has answered
    async fn request_permission(&self) -> Result<PermissionState, CapabilityError>;

    async fn show(&self, request: &NotificationRequest) -> Result<(), CapabilityError>;
}

/// Backend selection for the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Desktop notifications through the platform notification server
    Desktop,
    /// Write notifications to the log only
    Log,
}
