//! Dispatch and countdown timers
//!
//! A running session owns two independent repeating timers: one sends a
//! notification every interval, the other moves the countdown once per
//! second. Both live in spawned tasks whose handles are held by
//! [`TimerGuard`]s, so dropping [`RunningTimers`] always stops them.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{services::Dispatcher, state::SessionCell};

pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Owns a spawned timer task and aborts it when dropped
#[derive(Debug)]
pub struct TimerGuard {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl TimerGuard {
    pub fn spawn<F>(name: &'static str, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(timer = name, "arming timer");
        Self {
            name,
            handle: Some(tokio::spawn(task)),
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Abort the task and wait until it is gone
    pub async fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            match handle.await {
                Ok(()) => debug!(timer = self.name, "timer had already finished"),
                Err(e) if e.is_cancelled() => debug!(timer = self.name, "timer cancelled"),
                Err(e) => error!(timer = self.name, "timer task failed: {}", e),
            }
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(timer = self.name, "timer dropped, aborting");
            handle.abort();
        }
    }
}

/// The pair of timers behind a running session
#[derive(Debug)]
pub struct RunningTimers {
    dispatch: TimerGuard,
    countdown: TimerGuard,
}

impl RunningTimers {
    /// Arm both timers. Each fires for the first time one period from now.
    pub fn arm(
        session: Arc<SessionCell>,
        dispatcher: Dispatcher,
        interval: Duration,
        message: String,
    ) -> Self {
        info!(
            interval_secs = interval.as_secs(),
            "arming dispatch and countdown timers"
        );
        Self {
            dispatch: TimerGuard::spawn(
                "dispatch",
                dispatch_timer_task(Arc::clone(&session), dispatcher, interval, message),
            ),
            countdown: TimerGuard::spawn("countdown", countdown_timer_task(session)),
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.dispatch.is_finished() && self.countdown.is_finished()
    }

    /// Cancel both timers and wait for them to stop
    pub async fn cancel(self) {
        let Self {
            dispatch,
            countdown,
        } = self;
        dispatch.cancel().await;
        countdown.cancel().await;
    }
}

/// Sends a notification every `period` and rewinds the countdown
pub async fn dispatch_timer_task(
    session: Arc<SessionCell>,
    dispatcher: Dispatcher,
    period: Duration,
    message: String,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match session.snapshot() {
            Ok(current) if !current.active => {
                debug!("session no longer active, dispatch timer exiting");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to read session: {}", e);
                continue;
            }
        }

        match dispatcher.dispatch(&message).await {
            Ok(count) => debug!(count, "periodic notification sent"),
            Err(e) => warn!("Periodic notification failed: {}", e),
        }

        if let Err(e) = session.update_if_active(|s| s.rewind_countdown(Instant::now())) {
            error!("Failed to rewind countdown: {}", e);
        }
    }
}

/// Moves the countdown down by one every second
pub async fn countdown_timer_task(session: Arc<SessionCell>) {
    let mut ticker = interval_at(Instant::now() + COUNTDOWN_PERIOD, COUNTDOWN_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let now = Instant::now();

        match session.update_if_active(|s| {
            s.countdown_tick(now);
            s.remaining_seconds
        }) {
            Ok(Some(remaining)) => debug!(remaining, "countdown tick"),
            Ok(None) => {
                debug!("session no longer active, countdown timer exiting");
                break;
            }
            Err(e) => error!("Failed to update countdown: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{MemoryCapability, NotificationTemplate},
        state::TimerSession,
    };
    use tokio::time::sleep;

    fn running_session(interval: u64) -> (Arc<SessionCell>, Dispatcher, Arc<MemoryCapability>) {
        let capability = Arc::new(MemoryCapability::granted());
        let session = Arc::new(SessionCell::new(TimerSession::new(interval, "tick".into())));
        session.update(|s| s.begin()).unwrap();
        let dispatcher = Dispatcher::new(
            capability.clone(),
            NotificationTemplate::default(),
            session.clone(),
        );
        (session, dispatcher, capability)
    }

    #[tokio::test(start_paused = true)]
    async fn timers_tick_independently() {
        let (session, dispatcher, capability) = running_session(5);
        let timers = RunningTimers::arm(
            session.clone(),
            dispatcher,
            Duration::from_secs(5),
            "tick".into(),
        );

        sleep(Duration::from_millis(2_500)).await;
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.remaining_seconds, 3);
        assert_eq!(snapshot.dispatch_count, 0);

        sleep(Duration::from_secs(3)).await;
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.dispatch_count, 1);
        assert_eq!(snapshot.remaining_seconds, 5);
        assert_eq!(capability.shown()[0].body, "tick");

        sleep(Duration::from_secs(1)).await;
        assert_eq!(session.snapshot().unwrap().remaining_seconds, 4);

        timers.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timers_stops_them() {
        let (session, dispatcher, _capability) = running_session(5);
        let timers = RunningTimers::arm(
            session.clone(),
            dispatcher,
            Duration::from_secs(5),
            "tick".into(),
        );
        drop(timers);

        sleep(Duration::from_secs(30)).await;
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.dispatch_count, 0);
        assert_eq!(snapshot.remaining_seconds, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_exit_once_the_session_ends() {
        let (session, dispatcher, _capability) = running_session(5);
        let timers = RunningTimers::arm(
            session.clone(),
            dispatcher,
            Duration::from_secs(5),
            "tick".into(),
        );

        session.update(|s| s.end()).unwrap();
        sleep(Duration::from_millis(5_500)).await;

        assert!(timers.is_finished());
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.remaining_seconds, 0);
        assert_eq!(snapshot.dispatch_count, 0);
    }
}
