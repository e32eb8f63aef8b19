//! Main application state: the notification timer session

use std::{sync::Arc, time::Duration, time::Instant};

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::{SessionCell, TimerSession};
use crate::{
    error::TimerError,
    services::{
        Dispatcher, NotificationCapability, NotificationTemplate, PermissionGate, PermissionState,
    },
    tasks::RunningTimers,
    utils::format_uptime,
};

/// The timer session and everything it controls.
///
/// State transitions (`start`, `stop`, `teardown`) are serialized through
/// the lock around the running timers, which this object owns exclusively.
pub struct AppState {
    /// Observable session data
    pub session: Arc<SessionCell>,
    pub gate: PermissionGate,
    pub dispatcher: Dispatcher,
    timers: Mutex<Option<RunningTimers>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    /// Create the session, probing support and the current permission once
    pub async fn initialize(
        capability: Arc<dyn NotificationCapability>,
        template: NotificationTemplate,
        session: TimerSession,
        host: String,
        port: u16,
    ) -> Self {
        let gate = PermissionGate::new(Arc::clone(&capability));
        let supported = gate.probe_support().await;
        let permission = gate.query_permission(supported);

        if supported {
            info!(permission = %permission, "Notifications supported");
        } else {
            warn!("Notifications are not supported here; timer controls are disabled");
        }

        let session = Arc::new(SessionCell::new(TimerSession {
            supported,
            permission,
            ..session
        }));
        let dispatcher = Dispatcher::new(capability, template, Arc::clone(&session));

        Self {
            session,
            gate,
            dispatcher,
            timers: Mutex::new(None),
            start_time: Instant::now(),
            port,
            host,
        }
    }

    pub fn snapshot(&self) -> Result<TimerSession, TimerError> {
        self.session.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSession> {
        self.session.subscribe()
    }

    /// Ask the user for notification permission and remember the answer
    pub async fn request_permission(&self) -> Result<PermissionState, TimerError> {
        if !self.snapshot()?.supported {
            return Err(TimerError::Unsupported);
        }

        let permission = self.gate.request_permission(true).await;
        self.session.update(|s| s.permission = permission)?;
        Ok(permission)
    }

    /// Change interval and/or message while idle
    pub fn configure(
        &self,
        interval_seconds: Option<u64>,
        message: Option<String>,
    ) -> Result<TimerSession, TimerError> {
        let session = self
            .session
            .update(|s| s.configure(interval_seconds, message).map(|()| s.clone()))??;

        info!(interval_secs = session.interval_seconds, "Timer settings updated");
        Ok(session)
    }

    /// Idle → Running. Sends the first notification before returning.
    ///
    /// The permission prompt is answered before the timers lock is taken, so
    /// a pending prompt never holds up `stop` or `teardown`.
    pub async fn start(&self) -> Result<TimerSession, TimerError> {
        let current = self.snapshot()?;
        ensure_startable(&current)?;
        if !current.permission.is_granted() {
            let permission = self.request_permission().await?;
            if !permission.is_granted() {
                warn!(permission = %permission, "Timer start blocked: notification permission required");
                return Err(TimerError::PermissionRequired(permission));
            }
        }

        let mut timers = self.timers.lock().await;

        // Another start may have won while the prompt was open
        let current = self.snapshot()?;
        ensure_startable(&current)?;
        if !current.permission.is_granted() {
            return Err(TimerError::PermissionRequired(current.permission));
        }

        let (interval, message) = self.session.update(|s| {
            s.begin();
            (s.interval_seconds, s.message.clone())
        })?;
        info!(interval_secs = interval, "Notification timer started");

        if let Err(e) = self.dispatcher.dispatch(&message).await {
            warn!("Initial notification failed: {}", e);
        }

        *timers = Some(RunningTimers::arm(
            Arc::clone(&self.session),
            self.dispatcher.clone(),
            Duration::from_secs(interval),
            message,
        ));

        self.snapshot()
    }

    /// Running → Idle. Stopping an idle session changes nothing.
    pub async fn stop(&self) -> Result<TimerSession, TimerError> {
        let mut timers = self.timers.lock().await;

        if let Some(running) = timers.take() {
            running.cancel().await;
        }

        let was_active = self.session.update(|s| {
            let was_active = s.active;
            s.end();
            was_active
        })?;

        if was_active {
            info!("Notification timer stopped");
        } else {
            debug!("Stop requested while idle");
        }

        self.snapshot()
    }

    /// Send one notification outside the timer cadence
    pub async fn dispatch_now(&self) -> Result<u64, TimerError> {
        let current = self.snapshot()?;
        if !current.supported {
            return Err(TimerError::Unsupported);
        }
        if !current.permission.is_granted() {
            return Err(TimerError::PermissionRequired(current.permission));
        }

        self.dispatcher.dispatch(&current.message).await
    }

    /// Zero the dispatch counter without touching the timers
    pub fn reset_count(&self) -> Result<TimerSession, TimerError> {
        let session = self.session.update(|s| {
            s.reset_count();
            s.clone()
        })?;
        info!("Dispatch count reset");
        Ok(session)
    }

    /// Cancel both timers regardless of the session state
    pub async fn teardown(&self) {
        let mut timers = self.timers.lock().await;
        if let Some(running) = timers.take() {
            info!("Cancelling notification timers");
            running.cancel().await;
        }

        if let Err(e) = self.session.update(|s| s.end()) {
            warn!("Failed to mark session idle during teardown: {}", e);
        }
    }

    /// Whether timer tasks are currently armed
    pub async fn timers_armed(&self) -> bool {
        self.timers.lock().await.is_some()
    }

    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }
}

fn ensure_startable(session: &TimerSession) -> Result<(), TimerError> {
    if session.active {
        return Err(TimerError::AlreadyRunning);
    }
    if !session.supported {
        return Err(TimerError::Unsupported);
    }
    Ok(())
}
