//! Logging configuration and setup
//! 
//! This module provides logging initialization and structured logging utilities
//! for the Eventify application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "eventify.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
        .init();
        
    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: Uuid, action: &str, details: Option<&str>) {
    info!(
        user_id = %user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log registration bookkeeping changes
pub fn log_registration_change(event_id: Uuid, user_id: Uuid, action: &str, attendee_count: i32) {
    info!(
        event_id = %event_id,
        user_id = %user_id,
        action = action,
        attendee_count = attendee_count,
        "Registration changed"
    );
}

/// Log event management actions
pub fn log_event_action(event_id: Uuid, action: &str, user_id: Uuid, details: Option<&str>) {
    info!(
        event_id = %event_id,
        action = action,
        user_id = %user_id,
        details = details,
        "Event action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: Uuid, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = %admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log email delivery outcome
pub fn log_email_delivery(template: &str, recipient: &str, success: bool, details: Option<&str>) {
    if success {
        info!(
            template = template,
            recipient = recipient,
            message_id = details,
            "Email delivered"
        );
    } else {
        error!(
            template = template,
            recipient = recipient,
            error = details,
            "Email delivery failed"
        );
    }
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
