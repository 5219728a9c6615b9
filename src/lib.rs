//! Eventify
//!
//! University event registration service. Students browse and register for
//! events, admins manage events and rooms, and registrations trigger
//! confirmation emails. Seat counts are kept consistent by row-locked
//! transactions in the registration repository.

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod state;
pub mod utils;
pub mod middleware;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{EventifyError, Result};

pub use database::DatabaseService;
pub use handlers::create_router;
pub use services::ServiceFactory;
pub use state::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
