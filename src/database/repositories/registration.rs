//! Registration repository implementation
//!
//! Registering and unregistering are the only writes that touch
//! `events.attendee_count`. Each runs in one transaction holding the event
//! row lock, so the counter, the registration row and the attendee row move
//! together.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use crate::models::event::{Event, EventStatus};
use crate::models::registration::{
    Registration, RegistrationOutcome, UnregistrationOutcome, RegistrationWithEvent,
    Certificate, ParticipantStatus,
};
use crate::models::user::User;
use crate::utils::errors::EventifyError;
use super::event::EVENT_COLUMNS;

const REGISTRATION_COLUMNS: &str = "user_id, event_id, status, attended, registered_at, email_sent, email_sent_at, email_message_id, email_error";

#[derive(Clone)]
#[derive(Debug)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_event(tx: &mut Transaction<'_, Postgres>, event_id: Uuid) -> Result<Event, EventifyError> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(EventifyError::EventNotFound { event_id })
    }

    /// Register `user_id` for `event_id`
    ///
    /// An existing registration is returned unchanged with `created = false`.
    pub async fn register(&self, event_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Result<RegistrationOutcome, EventifyError> {
        let mut tx = self.pool.begin().await?;

        let event = Self::lock_event(&mut tx, event_id).await?;

        if !event.accepts_registrations(now) {
            return Err(EventifyError::InvalidInput(format!(
                "Event '{}' is not open for registration",
                event.title
            )));
        }

        let existing = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE user_id = $1 AND event_id = $2",
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(registration) = existing {
            tx.rollback().await?;
            return Ok(RegistrationOutcome {
                registration,
                attendee_count: event.attendee_count,
                created: false,
            });
        }

        if let Some(capacity) = event.capacity.filter(|_| event.is_full()) {
            return Err(EventifyError::CapacityReached { event_id, capacity });
        }

        let user = sqlx::query_as::<_, User>(
            "SELECT id, display_name, email, role, student_id, session, department, phone, bio, avatar_url, profile_complete, password_hash, created_at, updated_at FROM users WHERE id = $1"
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(EventifyError::UserNotFound { user_id })?;

        let status = ParticipantStatus::Registered.as_str();

        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            INSERT INTO registrations (user_id, event_id, status, attended, registered_at)
            VALUES ($1, $2, $3, FALSE, $4)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .bind(event_id)
        .bind(status)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO attendees (event_id, user_id, name, email, status, attended, registered_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(status)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let (attendee_count,): (i32,) = sqlx::query_as(
            "UPDATE events SET attendee_count = attendee_count + 1, updated_at = $2 WHERE id = $1 RETURNING attendee_count"
        )
        .bind(event_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RegistrationOutcome {
            registration,
            attendee_count,
            created: true,
        })
    }

    /// Remove the registration and attendee rows and release the seat
    pub async fn unregister(&self, event_id: Uuid, user_id: Uuid) -> Result<UnregistrationOutcome, EventifyError> {
        let mut tx = self.pool.begin().await?;

        Self::lock_event(&mut tx, event_id).await?;

        let deleted = sqlx::query("DELETE FROM registrations WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(EventifyError::NotRegistered { event_id, user_id });
        }

        sqlx::query("DELETE FROM attendees WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let (attendee_count,): (i32,) = sqlx::query_as(
            "UPDATE events SET attendee_count = GREATEST(attendee_count - 1, 0), updated_at = NOW() WHERE id = $1 RETURNING attendee_count"
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UnregistrationOutcome { event_id, user_id, attendee_count })
    }

    /// Set the attended flag on both the registration and attendee rows
    pub async fn mark_attendance(&self, event_id: Uuid, user_id: Uuid, attended: bool) -> Result<Registration, EventifyError> {
        let status = if attended {
            ParticipantStatus::Attended
        } else {
            ParticipantStatus::Registered
        };

        let mut tx = self.pool.begin().await?;

        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            UPDATE registrations SET attended = $3, status = $4
            WHERE user_id = $1 AND event_id = $2
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .bind(event_id)
        .bind(attended)
        .bind(status.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(EventifyError::NotRegistered { event_id, user_id })?;

        sqlx::query("UPDATE attendees SET attended = $3, status = $4 WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .bind(attended)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(registration)
    }

    pub async fn find(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>, EventifyError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE user_id = $1 AND event_id = $2",
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Count registration rows for an event
    pub async fn count_for_event(&self, event_id: Uuid) -> Result<i64, EventifyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// A user's registrations with their events, soonest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RegistrationWithEvent>, EventifyError> {
        let registrations = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE user_id = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let event_ids: Vec<Uuid> = registrations.iter().map(|r| r.event_id).collect();
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = ANY($1)",
            EVENT_COLUMNS
        ))
        .bind(&event_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut joined: Vec<RegistrationWithEvent> = registrations
            .into_iter()
            .filter_map(|registration| {
                events
                    .iter()
                    .find(|e| e.id == registration.event_id)
                    .cloned()
                    .map(|event| RegistrationWithEvent { registration, event })
            })
            .collect();
        joined.sort_by_key(|r| r.event.start_at);

        Ok(joined)
    }

    /// Certificates for completed events the user attended
    pub async fn certificates_for_user(&self, user_id: Uuid) -> Result<Vec<Certificate>, EventifyError> {
        let rows: Vec<(Uuid, String, Option<String>, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT e.id, e.title, e.category, u.display_name, e.end_at
            FROM registrations r
            JOIN events e ON e.id = r.event_id
            JOIN users u ON u.id = r.user_id
            WHERE r.user_id = $1 AND r.attended = TRUE AND e.status = $2
            ORDER BY e.end_at DESC
            "#
        )
        .bind(user_id)
        .bind(EventStatus::Completed.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(event_id, event_title, category, recipient_name, issued_on)| Certificate {
                event_id,
                event_title,
                category: category.unwrap_or_else(|| "General".to_string()),
                recipient_name,
                issued_on,
            })
            .collect())
    }

    /// Record a delivered confirmation email
    pub async fn record_email_sent(&self, event_id: Uuid, user_id: Uuid, message_id: Option<&str>) -> Result<(), EventifyError> {
        sqlx::query(
            r#"
            UPDATE registrations
            SET email_sent = TRUE, email_sent_at = $3, email_message_id = $4, email_error = NULL
            WHERE user_id = $1 AND event_id = $2
            "#
        )
        .bind(user_id)
        .bind(event_id)
        .bind(Utc::now())
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a failed confirmation email
    pub async fn record_email_failure(&self, event_id: Uuid, user_id: Uuid, error: &str) -> Result<(), EventifyError> {
        sqlx::query(
            "UPDATE registrations SET email_sent = FALSE, email_error = $3 WHERE user_id = $1 AND event_id = $2"
        )
        .bind(user_id)
        .bind(event_id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
