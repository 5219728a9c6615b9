//! Helper functions and utilities
//! 
//! This module contains common helper functions used throughout the application:
//! input validation shared by sign-up and profile edits, timestamp formatting
//! for emails, and random token generation.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound for any requested page size
pub const MAX_PAGE_SIZE: i64 = 100;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn password_regex() -> &'static Regex {
    static PASSWORD: OnceLock<Regex> = OnceLock::new();
    PASSWORD.get_or_init(|| Regex::new(r"^[A-Za-z\d@$!%*#?&]{8,}$").expect("valid password regex"))
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Validate phone number format: digits with optional leading `+`,
/// spaces, dashes and parentheses, 10 to 15 digits in total
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let allowed = trimmed
        .char_indices()
        .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || c == '(' || c == ')' || (c == '+' && i == 0));
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();

    allowed && (10..=15).contains(&digits)
}

/// Password rule: at least 8 characters drawn from letters, digits and
/// `@$!%*#?&`, containing at least one letter and one digit
pub fn is_valid_password(password: &str) -> bool {
    password_regex().is_match(password)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Trim a required text field; `None` when it is missing or blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lowercase and trim an email for storage and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`
pub fn clamp_page_size(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Format only the date part of a timestamp
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// Format only the time part of a timestamp
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%H:%M UTC").to_string()
}

/// Escape text for inclusion in HTML email bodies
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Generate a random alphanumeric string
pub fn generate_random_string(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";
    let mut rng = rand::thread_rng();
    
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
