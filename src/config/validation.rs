//! Configuration validation module
//! 
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{EventifyError, Result};
use crate::utils::helpers::is_valid_email;
use super::Settings;

/// Minimum accepted length of the token signing secret
const MIN_JWT_SECRET_LEN: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_email_config(&settings.email)?;
    validate_reminder_config(&settings.reminders)?;
    validate_logging_config(&settings.logging)?;

    if settings.rate_limit.auth_requests_per_minute == 0 {
        return Err(EventifyError::Config(
            "Auth rate limit must be greater than 0".to_string()
        ));
    }

    Ok(())
}

fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(EventifyError::Config(
            "Server host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(EventifyError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(EventifyError::Config(
            "Database URL is required".to_string()
        ));
    }
    
    if config.max_connections == 0 {
        return Err(EventifyError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }
    
    if config.min_connections > config.max_connections {
        return Err(EventifyError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }
    
    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(EventifyError::Config(
            "Redis URL is required".to_string()
        ));
    }
    
    Ok(())
}

fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < MIN_JWT_SECRET_LEN {
        return Err(EventifyError::Config(format!(
            "JWT secret must be at least {} characters",
            MIN_JWT_SECRET_LEN
        )));
    }

    if config.session_ttl_hours == 0 {
        return Err(EventifyError::Config(
            "Session TTL must be greater than 0".to_string()
        ));
    }

    if config.password_reset_ttl_minutes == 0 {
        return Err(EventifyError::Config(
            "Password reset TTL must be greater than 0".to_string()
        ));
    }

    if config.pbkdf2_iterations < 10_000 {
        return Err(EventifyError::Config(
            "PBKDF2 iterations must be at least 10000".to_string()
        ));
    }

    if let Some(invalid) = config.admin_emails.iter().find(|e| !is_valid_email(e)) {
        return Err(EventifyError::Config(format!(
            "Invalid admin email: {}",
            invalid
        )));
    }

    Ok(())
}

/// Validate email API configuration; skipped entirely when email is disabled
fn validate_email_config(config: &super::EmailConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    url::Url::parse(&config.api_url)?;

    if config.api_key.is_empty() {
        return Err(EventifyError::Config(
            "Email API key is required when email is enabled".to_string()
        ));
    }

    if !is_valid_email(&config.from_address) {
        return Err(EventifyError::Config(
            format!("Invalid sender address: {}", config.from_address)
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(EventifyError::Config(
            "Email timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

fn validate_reminder_config(config: &super::ReminderConfig) -> Result<()> {
    if config.enabled && config.interval_minutes == 0 {
        return Err(EventifyError::Config(
            "Reminder interval must be greater than 0".to_string()
        ));
    }

    if config.lead_minutes <= 0 {
        return Err(EventifyError::Config(
            "Reminder lead time must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventifyError::Config(
            "Log level is required".to_string()
        ));
    }
    
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventifyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }
    
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "x".repeat(48);
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut settings = valid_settings();
        settings.auth.jwt_secret = "short".to_string();
        assert_matches!(validate_settings(&settings), Err(EventifyError::Config(_)));
    }

    #[test]
    fn test_enabled_email_requires_key_and_url() {
        let mut settings = valid_settings();
        settings.email.enabled = true;
        settings.email.api_url = "https://mail.example.com/send".to_string();
        assert_matches!(validate_settings(&settings), Err(EventifyError::Config(_)));

        settings.email.api_key = "key".to_string();
        assert!(validate_settings(&settings).is_ok());

        settings.email.api_url = "not a url".to_string();
        assert_matches!(validate_settings(&settings), Err(EventifyError::UrlParse(_)));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert_matches!(validate_settings(&settings), Err(EventifyError::Config(_)));
    }

    #[test]
    fn test_min_connections_above_max_rejected() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        assert_matches!(validate_settings(&settings), Err(EventifyError::Config(_)));
    }

    #[test]
    fn test_malformed_admin_email_rejected() {
        let mut settings = valid_settings();
        settings.auth.admin_emails = vec!["office@uni.edu".to_string()];
        assert!(validate_settings(&settings).is_ok());

        settings.auth.admin_emails.push("office".to_string());
        assert_matches!(validate_settings(&settings), Err(EventifyError::Config(_)));
    }
}
