//! Desktop notification backend built on notify-rust

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};
use tracing::{debug, warn};

use super::{
    permission::PolicyPermission, NotificationCapability, NotificationRequest, PermissionPolicy,
    PermissionState,
};
use crate::error::CapabilityError;

const APP_NAME: &str = "notification-timer";

#[derive(Debug)]
pub struct DesktopCapability {
    permission: PolicyPermission,
}

impl DesktopCapability {
    pub fn new(policy: PermissionPolicy) -> Self {
        debug!(?policy, "desktop notification backend created");
        Self {
            permission: PolicyPermission::new(policy),
        }
    }

    fn build(request: &NotificationRequest) -> Notification {
        let mut n = Notification::new();
        n.appname(APP_NAME)
            .summary(&request.title)
            .body(&request.body)
            .icon(&request.icon)
            .timeout(if request.require_interaction {
                Timeout::Never
            } else {
                Timeout::Default
            });

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            n.id(replace_id(&request.tag));
            if request.silent {
                n.hint(notify_rust::Hint::SuppressSound(true));
            }
        }

        n
    }
}

/// Notifications with the same tag share a replace id, so the notification
/// server swaps the previous one out instead of stacking a new one.
#[cfg(all(unix, not(target_os = "macos")))]
fn replace_id(tag: &str) -> u32 {
    // FNV-1a, stable across runs
    let hash = tag.bytes().fold(0x811c_9dc5u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    });
    hash.max(1)
}

#[async_trait]
impl NotificationCapability for DesktopCapability {
    #[cfg(all(unix, not(target_os = "macos")))]
    async fn probe_support(&self) -> bool {
        let probe = tokio::task::spawn_blocking(|| {
            notify_rust::get_server_information().map_err(|e| e.to_string())
        });

        match probe.await {
            Ok(Ok(info)) => {
                debug!(server = %info.name, vendor = %info.vendor, "notification server found");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "no notification server available");
                false
            }
            Err(e) => {
                warn!(error = %e, "notification server probe did not finish");
                false
            }
        }
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    async fn probe_support(&self) -> bool {
        true
    }

    fn query_permission(&self) -> PermissionState {
        self.permission.current()
    }

    async fn request_permission(&self) -> Result<PermissionState, CapabilityError> {
        self.permission
            .request("Allow notification-timer to show desktop notifications?")
            .await
    }

    async fn show(&self, request: &NotificationRequest) -> Result<(), CapabilityError> {
        let notification = Self::build(request);
        debug!(tag = %request.tag, "showing desktop notification");

        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(|_| ())
                .map_err(|e| CapabilityError::Show(e.to_string()))
        })
        .await?
    }
}
