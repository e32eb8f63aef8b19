//! Timer session data and its transition rules

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::{error::TimerError, services::PermissionState};

pub const MIN_INTERVAL_SECONDS: u64 = 5;
pub const MAX_INTERVAL_SECONDS: u64 = 300;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 30;
pub const DEFAULT_MESSAGE: &str = "This is a periodic notification test!";

/// A countdown tick this close to a rewind belongs to the same boundary
pub const REWIND_GRACE: Duration = Duration::from_millis(500);

/// Scheduler state derived from the session's `active` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Everything the UI needs to render the notification timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSession {
    pub supported: bool,
    pub permission: PermissionState,
    pub active: bool,
    pub interval_seconds: u64,
    pub message: String,
    pub dispatch_count: u64,
    pub remaining_seconds: u64,
    pub last_dispatch_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// When a dispatch last rewound the countdown
    #[serde(skip)]
    pub rewound_at: Option<Instant>,
}

impl TimerSession {
    pub fn new(interval_seconds: u64, message: String) -> Self {
        Self {
            supported: false,
            permission: PermissionState::Default,
            active: false,
            interval_seconds: interval_seconds.clamp(MIN_INTERVAL_SECONDS, MAX_INTERVAL_SECONDS),
            message,
            dispatch_count: 0,
            remaining_seconds: 0,
            last_dispatch_at: None,
            last_error: None,
            rewound_at: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.active {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Change interval and/or message. Both are frozen while running.
    pub fn configure(
        &mut self,
        interval_seconds: Option<u64>,
        message: Option<String>,
    ) -> Result<(), TimerError> {
        if self.active {
            return Err(TimerError::Locked);
        }
        if let Some(interval) = interval_seconds {
            self.interval_seconds = interval.clamp(MIN_INTERVAL_SECONDS, MAX_INTERVAL_SECONDS);
        }
        if let Some(message) = message {
            self.message = message;
        }
        Ok(())
    }

    pub fn begin(&mut self) {
        self.active = true;
        self.remaining_seconds = self.interval_seconds;
        self.rewound_at = None;
    }

    pub fn end(&mut self) {
        self.active = false;
        self.remaining_seconds = 0;
        self.rewound_at = None;
    }

    /// One second passed. The countdown wraps back to the full interval
    /// instead of showing zero. A tick landing on the boundary a dispatch
    /// just rewound is already accounted for and changes nothing.
    pub fn countdown_tick(&mut self, now: Instant) {
        if !self.active {
            return;
        }
        let just_rewound = self
            .rewound_at
            .is_some_and(|at| now.saturating_duration_since(at) < REWIND_GRACE);
        if just_rewound {
            return;
        }
        self.remaining_seconds = if self.remaining_seconds <= 1 {
            self.interval_seconds
        } else {
            self.remaining_seconds - 1
        };
    }

    pub fn rewind_countdown(&mut self, now: Instant) {
        if self.active {
            self.remaining_seconds = self.interval_seconds;
            self.rewound_at = Some(now);
        }
    }

    pub fn record_dispatch(&mut self, at: DateTime<Utc>) {
        self.dispatch_count += 1;
        self.last_dispatch_at = Some(at);
        self.last_error = None;
    }

    pub fn record_failure(&mut self, error: String) {
        self.last_error = Some(error);
    }

    pub fn reset_count(&mut self) {
        self.dispatch_count = 0;
    }
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_SECONDS, DEFAULT_MESSAGE.to_string())
    }
}

/// Clamp a whole number of seconds into the accepted interval range
pub fn clamp_interval(seconds: i64) -> u64 {
    seconds.clamp(MIN_INTERVAL_SECONDS as i64, MAX_INTERVAL_SECONDS as i64) as u64
}

/// Interval from free text. Reads a leading integer the way a form field
/// would (`"42s"` is 42); anything without one falls back to the minimum.
pub fn parse_interval(input: &str) -> u64 {
    let trimmed = input.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return MIN_INTERVAL_SECONDS;
    }

    match digits[..end].parse::<i64>() {
        Ok(value) => clamp_interval(sign * value),
        // Too many digits to fit: saturate in the direction of the sign
        Err(_) if sign > 0 => MAX_INTERVAL_SECONDS,
        Err(_) => MIN_INTERVAL_SECONDS,
    }
}

/// Interval from a JSON value: numbers are truncated and clamped, strings
/// go through [`parse_interval`], everything else is the minimum.
pub fn interval_from_json(value: &Value) -> u64 {
    match value {
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(whole), _) => clamp_interval(whole),
            (None, Some(float)) if float.is_finite() => clamp_interval(float.trunc() as i64),
            _ => MIN_INTERVAL_SECONDS,
        },
        Value::String(text) => parse_interval(text),
        _ => MIN_INTERVAL_SECONDS,
    }
}
