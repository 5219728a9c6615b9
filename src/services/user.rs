//! User service implementation
//!
//! This service handles profile reads and edits, account deletion, and the
//! student-facing views built from a user's registrations.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::registration::{Certificate, RegistrationWithEvent, StudentDashboard};
use crate::models::user::{UpdateProfileRequest, User, UserRole};
use crate::utils::errors::{EventifyError, Result};
use crate::utils::helpers::is_valid_phone;
use crate::utils::logging::log_user_action;

const MIN_NAME_LEN: usize = 2;
const MIN_STUDENT_ID_LEN: usize = 3;

/// Validate the fields shared by sign-up and profile edits
///
/// Students must carry a student id and an academic session.
pub fn validate_profile_fields(
    display_name: &str,
    student_id: Option<&str>,
    session: Option<&str>,
    phone: Option<&str>,
    role: UserRole,
) -> Result<()> {
    if display_name.trim().chars().count() < MIN_NAME_LEN {
        return Err(EventifyError::InvalidInput(format!(
            "Name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }

    if role == UserRole::Student {
        let student_id = student_id.map(str::trim).unwrap_or_default();
        if student_id.chars().count() < MIN_STUDENT_ID_LEN {
            return Err(EventifyError::InvalidInput(format!(
                "Student ID must be at least {} characters",
                MIN_STUDENT_ID_LEN
            )));
        }
        if session.map(str::trim).unwrap_or_default().is_empty() {
            return Err(EventifyError::InvalidInput("Session is required".to_string()));
        }
    }

    if let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) {
        if !is_valid_phone(phone) {
            return Err(EventifyError::InvalidInput("Please enter a valid phone number".to_string()));
        }
    }

    Ok(())
}

/// Apply a profile edit to `user`; empty strings clear optional fields
pub fn apply_profile_update(mut user: User, request: UpdateProfileRequest) -> User {
    fn optional(value: String) -> Option<String> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    if let Some(name) = request.display_name {
        user.display_name = name.trim().to_string();
    }
    if let Some(student_id) = request.student_id {
        user.student_id = optional(student_id);
    }
    if let Some(session) = request.session {
        user.session = optional(session);
    }
    if let Some(department) = request.department {
        user.department = optional(department);
    }
    if let Some(phone) = request.phone {
        user.phone = optional(phone);
    }
    if let Some(bio) = request.bio {
        user.bio = optional(bio);
    }
    if let Some(avatar_url) = request.avatar_url {
        user.avatar_url = optional(avatar_url);
    }

    user.profile_complete = user.compute_profile_complete();
    user
}

/// User service for managing user operations
#[derive(Clone)]
#[derive(Debug)]
pub struct UserService {
    db: DatabaseService,
}

impl UserService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<User> {
        debug!(user_id = %user_id, "Getting user profile");
        self.db.users.find_by_id(user_id).await?
            .ok_or(EventifyError::UserNotFound { user_id })
    }

    pub async fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> Result<User> {
        let existing = self.get_profile(user_id).await?;
        let role: UserRole = existing.role.parse().map_err(EventifyError::InvalidInput)?;

        let updated = apply_profile_update(existing, request);
        validate_profile_fields(
            &updated.display_name,
            updated.student_id.as_deref(),
            updated.session.as_deref(),
            updated.phone.as_deref(),
            role,
        )?;

        let user = self.db.users.update_profile(&updated).await?;
        info!(user_id = %user_id, profile_complete = user.profile_complete, "Profile updated");
        log_user_action(user_id, "update_profile", None);

        Ok(user)
    }

    /// Delete the account and release every seat it held
    pub async fn delete_account(&self, user_id: Uuid) -> Result<()> {
        let released = self.db.users.delete(user_id).await?;

        info!(user_id = %user_id, released_seats = released, "Account deleted");
        log_user_action(user_id, "delete_account", Some(&format!("released {} seats", released)));
        Ok(())
    }

    pub async fn registrations(&self, user_id: Uuid) -> Result<Vec<RegistrationWithEvent>> {
        self.db.registrations.list_for_user(user_id).await
    }

    pub async fn dashboard(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<StudentDashboard> {
        let registrations = self.registrations(user_id).await?;
        Ok(build_student_dashboard(registrations, now))
    }

    pub async fn certificates(&self, user_id: Uuid) -> Result<Vec<Certificate>> {
        self.db.registrations.certificates_for_user(user_id).await
    }
}

/// Summarize a user's registrations as of `now`
pub fn build_student_dashboard(registrations: Vec<RegistrationWithEvent>, now: DateTime<Utc>) -> StudentDashboard {
    let upcoming = registrations.iter().filter(|r| r.event.start_at > now).count();
    let attended = registrations.iter().filter(|r| r.registration.attended).count();

    StudentDashboard {
        total_registered: registrations.len(),
        upcoming,
        attended,
        registrations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use crate::models::{Event, Registration};

    fn student() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            display_name: "Ada Lovelace".to_string(),
            email: "ada@uni.edu".to_string(),
            role: "student".to_string(),
            student_id: Some("CS-1815".to_string()),
            session: Some("2024-2025".to_string()),
            department: None,
            phone: None,
            bio: None,
            avatar_url: None,
            profile_complete: true,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn registration_for(start_at: DateTime<Utc>, attended: bool) -> RegistrationWithEvent {
        let event = Event {
            id: Uuid::new_v4(),
            title: "Talk".to_string(),
            description: None,
            start_at,
            end_at: start_at + Duration::hours(1),
            location: None,
            category: None,
            visibility: "public".to_string(),
            capacity: None,
            attendee_count: 1,
            status: "published".to_string(),
            room_id: None,
            image_url: None,
            created_by: None,
            created_at: start_at,
            updated_at: start_at,
        };
        RegistrationWithEvent {
            registration: Registration {
                user_id: Uuid::new_v4(),
                event_id: event.id,
                status: "registered".to_string(),
                attended,
                registered_at: start_at,
                email_sent: None,
                email_sent_at: None,
                email_message_id: None,
                email_error: None,
            },
            event,
        }
    }

    #[test]
    fn test_student_requires_id_and_session() {
        assert!(validate_profile_fields("Ada", Some("CS-1"), Some("2024-2025"), None, UserRole::Student).is_ok());
        assert_matches!(
            validate_profile_fields("Ada", Some("CS"), Some("2024-2025"), None, UserRole::Student),
            Err(EventifyError::InvalidInput(_))
        );
        assert_matches!(
            validate_profile_fields("Ada", Some("CS-1"), Some("  "), None, UserRole::Student),
            Err(EventifyError::InvalidInput(_))
        );
        assert!(validate_profile_fields("Ada", None, None, None, UserRole::Admin).is_ok());
    }

    #[test]
    fn test_short_name_and_bad_phone_rejected() {
        assert_matches!(
            validate_profile_fields("A", None, None, None, UserRole::Admin),
            Err(EventifyError::InvalidInput(_))
        );
        assert_matches!(
            validate_profile_fields("Ada", None, None, Some("12ab"), UserRole::Admin),
            Err(EventifyError::InvalidInput(_))
        );
        assert!(validate_profile_fields("Ada", None, None, Some("+1 555-123-4567"), UserRole::Admin).is_ok());
    }

    #[test]
    fn test_apply_update_recomputes_completeness() {
        let update = UpdateProfileRequest {
            session: Some(String::new()),
            bio: Some("  Loves compilers ".to_string()),
            ..Default::default()
        };
        let user = apply_profile_update(student(), update);
        assert_eq!(user.session, None);
        assert_eq!(user.bio.as_deref(), Some("Loves compilers"));
        assert!(!user.profile_complete);
    }

    #[test]
    fn test_dashboard_counts() {
        let now = Utc::now();
        let dashboard = build_student_dashboard(
            vec![
                registration_for(now + Duration::days(2), false),
                registration_for(now - Duration::days(2), true),
                registration_for(now - Duration::days(9), false),
            ],
            now,
        );
        assert_eq!(dashboard.total_registered, 3);
        assert_eq!(dashboard.upcoming, 1);
        assert_eq!(dashboard.attended, 1);
    }
}
