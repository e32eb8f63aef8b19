//! Notification Timer - periodic notifications with a live countdown
//!
//! This library provides a timer session that sends a notification
//! immediately and then every few seconds, keeps a per-second countdown to
//! the next one, and counts what it sent. Notifications go through an
//! injected capability so the same session runs against desktop
//! notifications, the log, or an in-memory recorder.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{CapabilityError, TimerError};
pub use state::{AppState, TimerSession};
pub use utils::signals::shutdown_signal;
