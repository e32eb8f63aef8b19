//! In-memory notification backend for headless runs and tests

use std::sync::Mutex;

use async_trait::async_trait;

use super::{NotificationCapability, NotificationRequest, PermissionState};
use crate::error::CapabilityError;

/// Records every notification instead of showing it.
///
/// The prompt answers with the configured state. A grant or denial is
/// remembered; a dismissed prompt (`Default`) is asked again next time.
#[derive(Debug)]
pub struct MemoryCapability {
    supported: bool,
    answer: PermissionState,
    permission: Mutex<PermissionState>,
    prompts: Mutex<u32>,
    shown: Mutex<Vec<NotificationRequest>>,
    fail_show: Mutex<bool>,
}

impl MemoryCapability {
    /// Supported backend whose prompt answers `answer`
    pub fn answering(answer: PermissionState) -> Self {
        Self {
            supported: true,
            answer,
            permission: Mutex::new(PermissionState::Default),
            prompts: Mutex::new(0),
            shown: Mutex::new(Vec::new()),
            fail_show: Mutex::new(false),
        }
    }

    /// Supported backend with permission already granted
    pub fn granted() -> Self {
        let capability = Self::answering(PermissionState::Granted);
        capability.set_permission(PermissionState::Granted);
        capability
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::answering(PermissionState::Denied)
        }
    }

    pub fn set_permission(&self, state: PermissionState) {
        if let Ok(mut permission) = self.permission.lock() {
            *permission = state;
        }
    }

    /// Make subsequent `show` calls fail
    pub fn fail_show(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_show.lock() {
            *flag = fail;
        }
    }

    pub fn prompt_count(&self) -> u32 {
        self.prompts.lock().map(|count| *count).unwrap_or(0)
    }

    pub fn shown(&self) -> Vec<NotificationRequest> {
        self.shown.lock().map(|shown| shown.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationCapability for MemoryCapability {
    async fn probe_support(&self) -> bool {
        self.supported
    }

    fn query_permission(&self) -> PermissionState {
        self.permission
            .lock()
            .map(|state| *state)
            .unwrap_or(PermissionState::Default)
    }

    async fn request_permission(&self) -> Result<PermissionState, CapabilityError> {
        let current = self.query_permission();
        if current != PermissionState::Default {
            return Ok(current);
        }

        if let Ok(mut prompts) = self.prompts.lock() {
            *prompts += 1;
        }
        self.set_permission(self.answer);
        Ok(self.answer)
    }

    async fn show(&self, request: &NotificationRequest) -> Result<(), CapabilityError> {
        if self.fail_show.lock().map(|flag| *flag).unwrap_or(false) {
            return Err(CapabilityError::Show("memory backend set to fail".to_string()));
        }

        if let Ok(mut shown) = self.shown.lock() {
            shown.push(request.clone());
        }
        Ok(())
    }
}
