//! Background tasks module
//!
//! This module contains the repeating timers that drive a running session.

pub mod scheduler;

// Re-export main types
pub use scheduler::{countdown_timer_task, dispatch_timer_task, RunningTimers, TimerGuard};
