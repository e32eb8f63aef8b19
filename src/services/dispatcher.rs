//! Notification dispatch

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::{NotificationCapability, NotificationRequest};
use crate::{error::TimerError, state::SessionCell};

/// Fixed parts of every notification the timer sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub title: String,
    pub icon: String,
    pub tag: String,
}

impl NotificationTemplate {
    pub fn render(&self, message: &str) -> NotificationRequest {
        NotificationRequest {
            title: self.title.clone(),
            body: message.to_string(),
            icon: self.icon.clone(),
            tag: self.tag.clone(),
            require_interaction: false,
            silent: false,
        }
    }
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self {
            title: "Notification Timer".to_string(),
            icon: "dialog-information".to_string(),
            tag: "notification-timer".to_string(),
        }
    }
}

/// Emits notifications and keeps the dispatch counter.
///
/// Callers must only dispatch while permission is granted.
#[derive(Clone)]
pub struct Dispatcher {
    capability: Arc<dyn NotificationCapability>,
    template: NotificationTemplate,
    session: Arc<SessionCell>,
}

impl Dispatcher {
    pub fn new(
        capability: Arc<dyn NotificationCapability>,
        template: NotificationTemplate,
        session: Arc<SessionCell>,
    ) -> Self {
        Self {
            capability,
            template,
            session,
        }
    }

    /// Show one notification carrying `message` and count it.
    /// Returns the new dispatch count.
    pub async fn dispatch(&self, message: &str) -> Result<u64, TimerError> {
        let request = self.template.render(message);

        if let Err(e) = self.capability.show(&request).await {
            warn!(error = %e, "notification dispatch failed");
            let failure = e.to_string();
            self.session.update(|s| s.record_failure(failure))?;
            return Err(e.into());
        }

        let count = self.session.update(|s| {
            s.record_dispatch(Utc::now());
            s.dispatch_count
        })?;
        debug!(count, "notification dispatched");
        Ok(count)
    }
}
