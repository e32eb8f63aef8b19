//! Notification permission handling

use std::{
    io::{self, BufRead, Write},
    sync::{Arc, Mutex},
    thread,
};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{NotificationCapability, PermissionPolicy, PermissionState};
use crate::error::CapabilityError;

/// Queries and requests the notification permission through a capability
#[derive(Clone)]
pub struct PermissionGate {
    capability: Arc<dyn NotificationCapability>,
}

impl PermissionGate {
    pub fn new(capability: Arc<dyn NotificationCapability>) -> Self {
        Self { capability }
    }

    pub async fn probe_support(&self) -> bool {
        let supported = self.capability.probe_support().await;
        debug!(supported, "probed notification support");
        supported
    }

    pub fn query_permission(&self, supported: bool) -> PermissionState {
        if supported {
            self.capability.query_permission()
        } else {
            PermissionState::Denied
        }
    }

    /// Prompt the user. An unsupported capability answers `Denied` without
    /// prompting, and a failed prompt leaves the current state in place.
    pub async fn request_permission(&self, supported: bool) -> PermissionState {
        if !supported {
            return PermissionState::Denied;
        }

        match self.capability.request_permission().await {
            Ok(state) => {
                info!(permission = %state, "notification permission resolved");
                state
            }
            Err(e) => {
                warn!(error = %e, "permission request failed");
                self.capability.query_permission()
            }
        }
    }
}

/// Remembers the permission decision for backends without a platform
/// permission store. Once granted or denied, the answer sticks for the
/// lifetime of the process and no further prompt is shown.
#[derive(Debug)]
pub struct PolicyPermission {
    policy: PermissionPolicy,
    state: Mutex<PermissionState>,
}

impl PolicyPermission {
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(PermissionState::Default),
        }
    }

    pub fn current(&self) -> PermissionState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(PermissionState::Default)
    }

    pub async fn request(&self, prompt: &str) -> Result<PermissionState, CapabilityError> {
        let current = self.current();
        if current != PermissionState::Default {
            debug!(permission = %current, "permission already decided, not prompting");
            return Ok(current);
        }

        let decided = match self.policy {
            PermissionPolicy::Allow => PermissionState::Granted,
            PermissionPolicy::Deny => PermissionState::Denied,
            PermissionPolicy::Ask => ask_on_terminal(prompt).await?,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| CapabilityError::Poisoned("permission state"))?;
        *state = decided;
        Ok(decided)
    }
}

/// Ask a yes/no question on the controlling terminal. End of input counts as
/// a dismissed prompt and leaves the permission undecided.
///
/// The blocking read runs on its own thread, so dropping the returned future
/// abandons the prompt without holding up runtime shutdown.
async fn ask_on_terminal(prompt: &str) -> Result<PermissionState, CapabilityError> {
    let question = format!("{} [y/N] ", prompt);
    let (answer_tx, answer_rx) = oneshot::channel();

    thread::Builder::new()
        .name("permission-prompt".to_string())
        .spawn(move || {
            let _ = answer_tx.send(read_answer(&question));
        })?;

    let answer = answer_rx
        .await
        .map_err(|_| io::Error::other("permission prompt thread exited without answering"))?;
    Ok(answer?)
}

fn read_answer(question: &str) -> io::Result<PermissionState> {
    let mut stderr = io::stderr();
    stderr.write_all(question.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(PermissionState::Default);
    }

    Ok(parse_answer(&line))
}

fn parse_answer(line: &str) -> PermissionState {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => PermissionState::Granted,
        _ => PermissionState::Denied,
    }
}
