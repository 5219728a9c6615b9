//! Event repository implementation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use crate::database::connection::is_exclusion_violation;
use crate::models::event::{Event, EventFilters, EventStatus, Visibility};
use crate::models::registration::Attendee;
use crate::utils::errors::EventifyError;
use crate::utils::helpers::clamp_page_size;

pub(crate) const EVENT_COLUMNS: &str = "id, title, description, start_at, end_at, location, category, visibility, capacity, attendee_count, status, room_id, image_url, created_by, created_at, updated_at";

/// Position in the public listing, ordered by `(start_at, id)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCursor {
    pub start_at: DateTime<Utc>,
    pub id: Uuid,
}

impl EventCursor {
    pub fn after(event: &Event) -> Self {
        Self { start_at: event.start_at, id: event.id }
    }

    /// Opaque token handed to clients
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}|{}", self.start_at.to_rfc3339(), self.id))
    }

    pub fn decode(token: &str) -> Result<Self, EventifyError> {
        let invalid = || EventifyError::InvalidInput("Invalid page cursor".to_string());

        let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (start, id) = raw.split_once('|').ok_or_else(invalid)?;

        let start_at = DateTime::parse_from_rfc3339(start)
            .map_err(|_| invalid())?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(id).map_err(|_| invalid())?;

        Ok(Self { start_at, id })
    }
}

/// Overlapping bookings of one room are rejected by the `events_room_no_overlap`
/// exclusion constraint; surface that as a conflict rather than a database error
fn room_conflict(error: sqlx::Error) -> EventifyError {
    if is_exclusion_violation(&error) {
        EventifyError::Conflict("Room is already booked for an overlapping time".to_string())
    } else {
        EventifyError::from(error)
    }
}

#[derive(Clone)]
#[derive(Debug)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a fully built event row
    pub async fn create(&self, event: &Event) -> Result<Event, EventifyError> {
        let created = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (id, title, description, start_at, end_at, location, category, visibility, capacity, attendee_count, status, room_id, image_url, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(&event.location)
        .bind(&event.category)
        .bind(&event.visibility)
        .bind(event.capacity)
        .bind(&event.status)
        .bind(event.room_id)
        .bind(&event.image_url)
        .bind(event.created_by)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(room_conflict)?;

        Ok(created)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, EventifyError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Edit an event under its row lock
    ///
    /// `edit` receives the locked row and returns the row to write back, or an
    /// error that aborts the transaction. Registrations block on the same lock,
    /// so a capacity checked inside `edit` holds until commit.
    /// `attendee_count` is never written here; only the registration
    /// transaction and the recount touch it.
    pub async fn update_with<F>(&self, id: Uuid, edit: F) -> Result<Event, EventifyError>
    where
        F: FnOnce(Event) -> Result<Event, EventifyError>,
    {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(EventifyError::EventNotFound { event_id: id })?;

        let event = edit(current)?;

        let updated = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                start_at = $4,
                end_at = $5,
                location = $6,
                category = $7,
                visibility = $8,
                capacity = $9,
                status = $10,
                room_id = $11,
                image_url = $12,
                updated_at = $13
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(&event.location)
        .bind(&event.category)
        .bind(&event.visibility)
        .bind(event.capacity)
        .bind(&event.status)
        .bind(event.room_id)
        .bind(&event.image_url)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(room_conflict)?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn update_status(&self, id: Uuid, status: EventStatus) -> Result<Event, EventifyError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(room_conflict)?
        .ok_or(EventifyError::EventNotFound { event_id: id })?;

        Ok(event)
    }

    /// Delete event; registrations and attendees cascade
    pub async fn delete(&self, id: Uuid) -> Result<(), EventifyError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EventifyError::EventNotFound { event_id: id });
        }

        Ok(())
    }

    /// One page of public, non-draft events ordered by start time
    ///
    /// Fetches one row past the limit to learn whether a next page exists.
    pub async fn list_public(&self, filters: &EventFilters) -> Result<(Vec<Event>, Option<EventCursor>), EventifyError> {
        let limit = clamp_page_size(filters.limit);
        let cursor = filters.cursor.as_deref().map(EventCursor::decode).transpose()?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM events WHERE visibility = ",
            EVENT_COLUMNS
        ));
        builder.push_bind(Visibility::Public.as_str());
        builder.push(" AND status <> ");
        builder.push_bind(EventStatus::Draft.as_str());

        if let Some(category) = filters.category.as_deref().filter(|c| !c.is_empty()) {
            builder.push(" AND category = ");
            builder.push_bind(category.to_string());
        }
        if let Some(location) = filters.location.as_deref().filter(|l| !l.is_empty()) {
            builder.push(" AND location ILIKE ");
            builder.push_bind(format!("%{}%", location));
        }
        if let Some(search) = filters.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", search);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        if let Some(start_date) = filters.start_date {
            builder.push(" AND start_at >= ");
            builder.push_bind(start_date);
        }
        if let Some(end_date) = filters.end_date {
            builder.push(" AND start_at <= ");
            builder.push_bind(end_date);
        }
        if let Some(cursor) = &cursor {
            builder.push(" AND (start_at, id) > (");
            builder.push_bind(cursor.start_at);
            builder.push(", ");
            builder.push_bind(cursor.id);
            builder.push(")");
        }

        builder.push(" ORDER BY start_at ASC, id ASC LIMIT ");
        builder.push_bind(limit + 1);

        let mut events = builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;

        let next = if events.len() as i64 > limit {
            events.truncate(limit as usize);
            events.last().map(EventCursor::after)
        } else {
            None
        };

        Ok((events, next))
    }

    /// Public published events that have not started yet
    pub async fn upcoming(&self, limit: i64) -> Result<Vec<Event>, EventifyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {} FROM events
            WHERE visibility = $1 AND status = $2 AND start_at > $3
            ORDER BY start_at ASC, id ASC
            LIMIT $4
            "#,
            EVENT_COLUMNS
        ))
        .bind(Visibility::Public.as_str())
        .bind(EventStatus::Published.as_str())
        .bind(Utc::now())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Events created by an admin, newest start first
    pub async fn by_creator(&self, created_by: Uuid) -> Result<Vec<Event>, EventifyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE created_by = $1 ORDER BY start_at DESC",
            EVENT_COLUMNS
        ))
        .bind(created_by)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Non-cancelled events with `from < start_at <= to`
    pub async fn starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Event>, EventifyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {} FROM events
            WHERE start_at > $1 AND start_at <= $2 AND status <> $3
            ORDER BY start_at ASC
            "#,
            EVENT_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .bind(EventStatus::Cancelled.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Ids of other events in `room_id` overlapping `[start_at, end_at)`
    pub async fn find_room_conflicts(
        &self,
        room_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Uuid>, EventifyError> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM events
            WHERE room_id = $1
              AND start_at < $3
              AND end_at > $2
              AND status <> $4
              AND ($5::uuid IS NULL OR id <> $5)
            ORDER BY start_at
            "#
        )
        .bind(room_id)
        .bind(start_at)
        .bind(end_at)
        .bind(EventStatus::Cancelled.as_str())
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Attendees of an event in registration order
    pub async fn list_attendees(&self, event_id: Uuid) -> Result<Vec<Attendee>, EventifyError> {
        let attendees = sqlx::query_as::<_, Attendee>(
            r#"
            SELECT event_id, user_id, name, email, status, attended, registered_at
            FROM attendees
            WHERE event_id = $1
            ORDER BY registered_at ASC
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attendees)
    }

    /// Recompute every `attendee_count` from the attendees table
    ///
    /// Returns the number of events whose stored count was wrong.
    pub async fn recount_attendees(&self) -> Result<u64, EventifyError> {
        let result = sqlx::query(
            r#"
            UPDATE events e
            SET attendee_count = counts.actual, updated_at = NOW()
            FROM (
                SELECT e2.id, COUNT(a.user_id)::int AS actual
                FROM events e2
                LEFT JOIN attendees a ON a.event_id = e2.id
                GROUP BY e2.id
            ) counts
            WHERE e.id = counts.id AND e.attendee_count <> counts.actual
            "#
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Count total events
    pub async fn count(&self) -> Result<i64, EventifyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn test_cursor_token_is_opaque_and_decodes() {
        let cursor = EventCursor {
            start_at: Utc.with_ymd_and_hms(2024, 10, 5, 14, 30, 0).unwrap(),
            id: Uuid::new_v4(),
        };
        let token = cursor.encode();
        assert!(!token.contains('|'));
        assert_eq!(EventCursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert_matches!(EventCursor::decode("not a cursor"), Err(EventifyError::InvalidInput(_)));

        let missing_id = URL_SAFE_NO_PAD.encode("2024-10-05T14:30:00+00:00");
        assert_matches!(EventCursor::decode(&missing_id), Err(EventifyError::InvalidInput(_)));

        let bad_date = URL_SAFE_NO_PAD.encode(format!("yesterday|{}", Uuid::new_v4()));
        assert_matches!(EventCursor::decode(&bad_date), Err(EventifyError::InvalidInput(_)));
    }
}
