//! Configuration and CLI argument handling

use clap::Parser;

use crate::{
    services::{Backend, NotificationTemplate, PermissionPolicy},
    state::{
        session::{parse_interval, DEFAULT_MESSAGE},
        TimerSession,
    },
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "notification-timer")]
#[command(about = "Send a notification now and then every few seconds, with a live countdown")]
#[command(version)]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Seconds between notifications (5 to 300; anything else is clamped)
    #[arg(short, long, default_value = "30")]
    pub interval: String,

    /// Notification body
    #[arg(short, long, default_value = DEFAULT_MESSAGE)]
    pub message: String,

    /// Notification title
    #[arg(long, default_value = "Notification Timer")]
    pub title: String,

    /// Icon name or path shown with each notification
    #[arg(long, default_value = "dialog-information")]
    pub icon: String,

    /// Where notifications are shown
    #[arg(short, long, value_enum, default_value_t = Backend::Desktop)]
    pub backend: Backend,

    /// How permission requests are answered
    #[arg(long, value_enum, default_value_t = PermissionPolicy::Ask)]
    pub permission: PermissionPolicy,

    /// Start the timer as soon as the server is up
    #[arg(long)]
    pub autostart: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Effective interval after clamping
    pub fn interval_seconds(&self) -> u64 {
        parse_interval(&self.interval)
    }

    pub fn template(&self) -> NotificationTemplate {
        NotificationTemplate {
            title: self.title.clone(),
            icon: self.icon.clone(),
            ..NotificationTemplate::default()
        }
    }

    /// Initial session built from the command line
    pub fn session(&self) -> TimerSession {
        TimerSession::new(self.interval_seconds(), self.message.clone())
    }
}
