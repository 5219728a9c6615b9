//! Application settings management
//! 
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub reminders: ReminderConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration (sessions and password reset tokens)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
}

/// Account and session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_hours: u64,
    pub password_reset_ttl_minutes: u64,
    pub pbkdf2_iterations: u32,
    /// Accounts signing up with one of these emails get the admin role
    pub admin_emails: Vec<String>,
}

/// Transactional email API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub enabled: bool,
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    pub from_name: String,
    pub site_url: String,
    pub timeout_seconds: u64,
}

/// Reminder scheduler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub interval_minutes: u64,
    pub lead_minutes: i64,
}

/// Rate limiting for the public auth endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub auth_requests_per_minute: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    ///
    /// Defaults are layered first, then `config.toml`, then `EVENTIFY__*`
    /// variables (e.g. `EVENTIFY__DATABASE__URL`).
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("EVENTIFY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .with_list_parse_key("auth.admin_emails")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::EventifyError> {
        super::validation::validate_settings(self)
    }

    /// Socket address string the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                allowed_origins: vec!["http://localhost:5173".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/eventify".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "eventify:".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                session_ttl_hours: 24,
                password_reset_ttl_minutes: 30,
                pbkdf2_iterations: 200_000,
                admin_emails: Vec::new(),
            },
            email: EmailConfig {
                enabled: false,
                api_url: String::new(),
                api_key: String::new(),
                from_address: "no-reply@eventify.local".to_string(),
                from_name: "Eventify".to_string(),
                site_url: "http://localhost:5173".to_string(),
                timeout_seconds: 10,
            },
            reminders: ReminderConfig {
                enabled: true,
                interval_minutes: 60,
                lead_minutes: 60,
            },
            rate_limit: RateLimitConfig {
                auth_requests_per_minute: 20,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.reminders.interval_minutes, 60);
        assert_eq!(settings.reminders.lead_minutes, 60);
        assert!(!settings.email.enabled);
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }
}
