//! Log-only notification backend

use async_trait::async_trait;
use tracing::info;

use super::{
    permission::PolicyPermission, NotificationCapability, NotificationRequest, PermissionPolicy,
    PermissionState,
};
use crate::error::CapabilityError;

/// Writes notifications to the log instead of the desktop
#[derive(Debug)]
pub struct LogCapability {
    permission: PolicyPermission,
}

impl LogCapability {
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            permission: PolicyPermission::new(policy),
        }
    }
}

#[async_trait]
impl NotificationCapability for LogCapability {
    async fn probe_support(&self) -> bool {
        true
    }

    fn query_permission(&self) -> PermissionState {
        self.permission.current()
    }

    async fn request_permission(&self) -> Result<PermissionState, CapabilityError> {
        self.permission
            .request("Allow notification-timer to log notifications?")
            .await
    }

    async fn show(&self, request: &NotificationRequest) -> Result<(), CapabilityError> {
        info!(tag = %request.tag, "[NOTIFY] {}: {}", request.title, request.body);
        Ok(())
    }
}
