//! State management module
//!
//! This module contains the timer session data and the control object that
//! owns it.

pub mod app_state;
pub mod session;
pub mod shared;

// Re-export main types
pub use app_state::AppState;
pub use session::{SchedulerState, TimerSession};
pub use shared::SessionCell;
