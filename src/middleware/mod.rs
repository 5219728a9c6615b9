//! Middleware module
//!
//! This module contains middleware for request processing

pub mod auth;
pub mod cors;
pub mod logging;
pub mod rate_limit;

// Re-export commonly used middleware
pub use auth::{CurrentUser, AdminUser, StudentUser};
pub use rate_limit::AuthRateLimiter;
