//! Shared, observable session cell

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::warn;

use super::TimerSession;
use crate::error::TimerError;

/// Session data shared between the control object and the timer tasks.
///
/// Every update publishes a snapshot to watchers. The lock is never held
/// across an `.await`.
#[derive(Debug)]
pub struct SessionCell {
    session: Mutex<TimerSession>,
    updates_tx: watch::Sender<TimerSession>,
    /// Keep the receiver alive to prevent channel closure
    _updates_rx: watch::Receiver<TimerSession>,
}

impl SessionCell {
    pub fn new(session: TimerSession) -> Self {
        let (updates_tx, updates_rx) = watch::channel(session.clone());
        Self {
            session: Mutex::new(session),
            updates_tx,
            _updates_rx: updates_rx,
        }
    }

    pub fn snapshot(&self) -> Result<TimerSession, TimerError> {
        self.session
            .lock()
            .map(|session| session.clone())
            .map_err(|_| TimerError::Poisoned("timer session"))
    }

    /// Apply `updater` and notify watchers
    pub fn update<F, R>(&self, updater: F) -> Result<R, TimerError>
    where
        F: FnOnce(&mut TimerSession) -> R,
    {
        let mut session = self
            .session
            .lock()
            .map_err(|_| TimerError::Poisoned("timer session"))?;

        let result = updater(&mut session);
        let snapshot = session.clone();
        drop(session);

        if let Err(e) = self.updates_tx.send(snapshot) {
            warn!("Failed to publish session update: {}", e);
        }
        Ok(result)
    }

    /// Like [`update`](Self::update), but only while the session is running.
    /// Returns `None` when the session was already stopped.
    pub fn update_if_active<F, R>(&self, updater: F) -> Result<Option<R>, TimerError>
    where
        F: FnOnce(&mut TimerSession) -> R,
    {
        self.update(|session| session.active.then(|| updater(session)))
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSession> {
        self.updates_tx.subscribe()
    }
}
