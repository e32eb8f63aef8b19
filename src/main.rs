//! Notification Timer - periodic notifications with a live countdown
//!
//! This is the main entry point for the notification-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use notification_timer::{
    api::create_router,
    config::Config,
    services::{Backend, DesktopCapability, LogCapability, NotificationCapability},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "notification_timer={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting notification-timer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, interval={}s, backend={:?}, permission={:?}",
        config.host,
        config.port,
        config.interval_seconds(),
        config.backend,
        config.permission
    );

    let capability: Arc<dyn NotificationCapability> = match config.backend {
        Backend::Desktop => Arc::new(DesktopCapability::new(config.permission)),
        Backend::Log => Arc::new(LogCapability::new(config.permission)),
    };

    // Create the timer session (probes notification support)
    let state = Arc::new(
        AppState::initialize(
            capability,
            config.template(),
            config.session(),
            config.host.clone(),
            config.port,
        )
        .await,
    );

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /permission    - Request notification permission");
    info!("  PUT  /settings      - Set interval and message (idle only)");
    info!("  POST /timer/start   - Start periodic notifications");
    info!("  POST /timer/stop    - Stop periodic notifications");
    info!("  POST /notify        - Send one notification now");
    info!("  POST /count/reset   - Reset the dispatch counter");
    info!("  GET  /status        - Current session and countdown");
    info!("  GET  /status/stream - Session updates as server-sent events");
    info!("  GET  /health        - Health check");

    if config.autostart {
        if let Err(e) = state.start().await {
            warn!("Autostart failed: {}", e);
        }
    }

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to install signal handler: {}", e),
            }
        }
    }

    state.teardown().await;
    info!("Server shutdown complete");
    Ok(())
}
