//! Error handling for Eventify
//! 
//! This module defines the main error type used throughout the application,
//! its mapping onto HTTP responses, and the unified error handling strategy:
//! every failure is logged where it is turned into a response and none is
//! retried automatically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use uuid::Uuid;

use crate::utils::response::error_response;

/// Main error type for Eventify application
#[derive(Error, Debug)]
pub enum EventifyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    
    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    
    #[error("Configuration error: {0}")]
    Config(String),
    
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    
    #[error("Authentication error: {0}")]
    Authentication(String),
    
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: Uuid },
    
    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("Room not found: {room_id}")]
    RoomNotFound { room_id: Uuid },

    #[error("User {user_id} is not registered for event {event_id}")]
    NotRegistered { event_id: Uuid, user_id: Uuid },

    #[error("Event {event_id} has reached its capacity of {capacity}")]
    CapacityReached { event_id: Uuid, capacity: i32 },

    #[error("An account with email {email} already exists")]
    DuplicateAccount { email: String },

    #[error("Conflict: {0}")]
    Conflict(String),
    
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Email delivery error: {0}")]
    Email(String),
    
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Result type alias for Eventify operations
pub type Result<T> = std::result::Result<T, EventifyError>;

impl EventifyError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            EventifyError::Database(_) => false,
            EventifyError::Migration(_) => false,
            EventifyError::Redis(_) => true,
            EventifyError::Http(_) => true,
            EventifyError::Serialization(_) => false,
            EventifyError::Io(_) => true,
            EventifyError::UrlParse(_) => false,
            EventifyError::Token(_) => false,
            EventifyError::Config(_) => false,
            EventifyError::PermissionDenied(_) => false,
            EventifyError::Authentication(_) => false,
            EventifyError::UserNotFound { .. } => false,
            EventifyError::EventNotFound { .. } => false,
            EventifyError::RoomNotFound { .. } => false,
            EventifyError::NotRegistered { .. } => false,
            EventifyError::CapacityReached { .. } => false,
            EventifyError::DuplicateAccount { .. } => false,
            EventifyError::Conflict(_) => false,
            EventifyError::RateLimitExceeded => true,
            EventifyError::InvalidInput(_) => false,
            EventifyError::Email(_) => true,
            EventifyError::ServiceUnavailable(_) => true,
        }
    }
    
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EventifyError::Database(_) => ErrorSeverity::Critical,
            EventifyError::Migration(_) => ErrorSeverity::Critical,
            EventifyError::Config(_) => ErrorSeverity::Critical,
            EventifyError::PermissionDenied(_) => ErrorSeverity::Warning,
            EventifyError::Authentication(_) => ErrorSeverity::Warning,
            EventifyError::Token(_) => ErrorSeverity::Warning,
            EventifyError::RateLimitExceeded => ErrorSeverity::Warning,
            EventifyError::InvalidInput(_)
            | EventifyError::UserNotFound { .. }
            | EventifyError::EventNotFound { .. }
            | EventifyError::RoomNotFound { .. }
            | EventifyError::NotRegistered { .. }
            | EventifyError::CapacityReached { .. }
            | EventifyError::DuplicateAccount { .. }
            | EventifyError::Conflict(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status returned to the client
    pub fn status_code(&self) -> StatusCode {
        match self {
            EventifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EventifyError::Authentication(_) | EventifyError::Token(_) => StatusCode::UNAUTHORIZED,
            EventifyError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            EventifyError::UserNotFound { .. }
            | EventifyError::EventNotFound { .. }
            | EventifyError::RoomNotFound { .. }
            | EventifyError::NotRegistered { .. } => StatusCode::NOT_FOUND,
            EventifyError::CapacityReached { .. }
            | EventifyError::DuplicateAccount { .. }
            | EventifyError::Conflict(_) => StatusCode::CONFLICT,
            EventifyError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            EventifyError::ServiceUnavailable(_) | EventifyError::Redis(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            EventifyError::Email(_) | EventifyError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            EventifyError::InvalidInput(_) => "VALIDATION_ERROR",
            EventifyError::Authentication(_) | EventifyError::Token(_) => "AUTH_ERROR",
            EventifyError::PermissionDenied(_) => "FORBIDDEN",
            EventifyError::UserNotFound { .. } => "USER_NOT_FOUND",
            EventifyError::EventNotFound { .. } => "EVENT_NOT_FOUND",
            EventifyError::RoomNotFound { .. } => "ROOM_NOT_FOUND",
            EventifyError::NotRegistered { .. } => "NOT_REGISTERED",
            EventifyError::CapacityReached { .. } => "CAPACITY_REACHED",
            EventifyError::DuplicateAccount { .. } => "DUPLICATE_ACCOUNT",
            EventifyError::Conflict(_) => "CONFLICT",
            EventifyError::RateLimitExceeded => "RATE_LIMITED",
            EventifyError::Email(_) | EventifyError::Http(_) => "EXTERNAL_SERVICE_ERROR",
            EventifyError::ServiceUnavailable(_) | EventifyError::Redis(_) => "SERVICE_UNAVAILABLE",
            EventifyError::Database(_) | EventifyError::Migration(_) => "DATABASE_ERROR",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Message safe to show to the client; internal details stay in the logs
    pub fn public_message(&self) -> String {
        match self {
            EventifyError::Database(_) | EventifyError::Migration(_) => {
                "A database error occurred".to_string()
            }
            EventifyError::Redis(_) => "Session store unavailable".to_string(),
            EventifyError::Token(_) => "Invalid or expired session".to_string(),
            EventifyError::Http(_) | EventifyError::Email(_) => {
                "An external service failed".to_string()
            }
            EventifyError::Serialization(_)
            | EventifyError::Io(_)
            | EventifyError::UrlParse(_)
            | EventifyError::Config(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Log the error at the level its severity calls for
    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Info => tracing::info!(error = %self, code = self.code(), "Request rejected"),
            ErrorSeverity::Warning => tracing::warn!(error = %self, code = self.code(), "Request rejected"),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                tracing::error!(error = ?self, severity = %self.severity(), "Request failed")
            }
        }
    }
}

impl IntoResponse for EventifyError {
    fn into_response(self) -> Response {
        self.log();
        error_response(self.code(), self.public_message(), self.status_code())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_maps_to_conflict() {
        let err = EventifyError::CapacityReached { event_id: Uuid::new_v4(), capacity: 2 };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CAPACITY_REACHED");
        assert_eq!(err.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn test_database_error_hides_details() {
        let err = EventifyError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "A database error occurred");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_duplicate_account_message() {
        let err = EventifyError::DuplicateAccount { email: "a@b.edu".to_string() };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.public_message().contains("a@b.edu"));
    }

    #[test]
    fn test_into_response_status() {
        let response = EventifyError::RateLimitExceeded.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
