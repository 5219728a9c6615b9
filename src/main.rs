//! Eventify API server
//!
//! Main application entry point

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use eventify::{
    config::Settings,
    create_router,
    database::{connection::{create_pool, run_migrations, DatabaseConfig}, DatabaseService},
    services::{trigger_channel, ConfirmationWorker, ReminderScheduler, ServiceFactory, SessionStore},
    utils::logging,
    AppState,
};

/// How often idle rate limiter entries are pruned
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", eventify::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from_settings(&settings.database)).await?;
    run_migrations(&db_pool).await?;
    let database_service = DatabaseService::new(db_pool);

    info!("Connecting to Redis...");
    let sessions = SessionStore::new(&settings.redis)?;

    // Initialize services
    info!("Initializing services...");
    let (trigger_tx, trigger_rx) = trigger_channel();
    let services = ServiceFactory::new(&settings, database_service.clone(), sessions, trigger_tx)?;

    // Background workers
    ConfirmationWorker::new(database_service.clone(), services.notification_service.clone())
        .start(trigger_rx);

    if settings.reminders.enabled {
        ReminderScheduler::new(
            database_service.clone(),
            services.notification_service.clone(),
            settings.reminders.clone(),
        )
        .start();
    } else {
        info!("Event reminders disabled");
    }

    spawn_auth_audit(&services);

    let bind_address = settings.bind_address();
    let state = AppState::new(settings, services);
    state.auth_limiter.start_cleanup(LIMITER_CLEANUP_INTERVAL);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    info!(address = %bind_address, "Eventify API listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Eventify API stopped");
    Ok(())
}

/// Log every auth state change published by the auth service
fn spawn_auth_audit(services: &ServiceFactory) {
    let mut changes = services.auth_service.subscribe();

    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    info!(user_id = %change.user_id(), change = ?change, "Auth state changed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Auth audit fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
