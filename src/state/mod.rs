//! Shared application state
//!
//! Built once in `main` and handed to every handler through axum's state.

use std::sync::Arc;

use crate::config::Settings;
use crate::middleware::rate_limit::AuthRateLimiter;
use crate::services::ServiceFactory;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub services: ServiceFactory,
    pub auth_limiter: AuthRateLimiter,
}

impl AppState {
    pub fn new(settings: Settings, services: ServiceFactory) -> Self {
        let auth_limiter = AuthRateLimiter::new(settings.rate_limit.auth_requests_per_minute);

        Self {
            settings: Arc::new(settings),
            services,
            auth_limiter,
        }
    }
}
