//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod event;
pub mod notification;
pub mod registration;
pub mod room;
pub mod sessions;
pub mod user;

// Re-export commonly used services
pub use auth::{AuthService, AuthContext, AuthStateChange, Claims};
pub use event::EventService;
pub use notification::{
    NotificationService, EmailClient, EmailTemplate, EmailMessage, NotificationStats,
    ConfirmationWorker, ReminderScheduler, ReminderRunReport, RegistrationCreated, TriggerSender,
    trigger_channel,
};
pub use registration::RegistrationService;
pub use room::RoomService;
pub use sessions::{SessionStore, SessionRecord};
pub use user::UserService;

use serde::Serialize;
use crate::config::settings::Settings;
use crate::database::{self, DatabaseService};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub room_service: RoomService,
    pub notification_service: NotificationService,
    db: DatabaseService,
    sessions: SessionStore,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        settings: &Settings,
        db: DatabaseService,
        sessions: SessionStore,
        triggers: TriggerSender,
    ) -> Result<Self> {
        let notification_service = NotificationService::new(settings.email.clone())?;
        let auth_service = AuthService::new(
            db.users.clone(),
            sessions.clone(),
            notification_service.clone(),
            settings.auth.clone(),
        );
        let user_service = UserService::new(db.clone());
        let event_service = EventService::new(db.clone());
        let registration_service = RegistrationService::new(db.registrations.clone(), triggers);
        let room_service = RoomService::new(db.rooms.clone());

        Ok(Self {
            auth_service,
            user_service,
            event_service,
            registration_service,
            room_service,
            notification_service,
            db,
            sessions,
        })
    }

    pub fn database(&self) -> &DatabaseService {
        &self.db
    }

    /// Health check for the backing stores
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = database::health_check(self.db.pool()).await.is_ok();
        let redis_healthy = self.sessions.health_check().await.unwrap_or(false);

        ServiceHealthStatus {
            database_healthy,
            redis_healthy,
            email_enabled: self.notification_service.is_enabled(),
            email: self.notification_service.stats(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub redis_healthy: bool,
    pub email_enabled: bool,
    pub email: NotificationStats,
}

impl ServiceHealthStatus {
    /// Database and session store are both required to serve requests
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.redis_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }
        if !self.email_enabled {
            issues.push("Email delivery disabled".to_string());
        }

        issues
    }
}
