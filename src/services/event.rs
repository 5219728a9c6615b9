//! Event service implementation
//!
//! This service handles event CRUD for admins, room scheduling checks,
//! duplication, bulk operations, dashboard statistics and the public
//! listings.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::event::{
    AdminDashboard, BulkResult, CreateEventRequest, Event, EventFilters, EventPage, EventStatus,
    UpdateEventRequest,
};
use crate::models::registration::Attendee;
use crate::utils::errors::{EventifyError, Result};
use crate::utils::helpers::clamp_page_size;
use crate::utils::logging::{log_admin_action, log_event_action};

/// Default number of events on the upcoming strip
pub const DEFAULT_UPCOMING_LIMIT: i64 = 12;

/// Validate the stored shape of an event
pub fn validate_event(event: &Event) -> Result<()> {
    if event.title.trim().is_empty() {
        return Err(EventifyError::InvalidInput("Event title is required".to_string()));
    }
    if event.end_at <= event.start_at {
        return Err(EventifyError::InvalidInput("Event must end after it starts".to_string()));
    }
    if let Some(capacity) = event.capacity {
        if capacity < 1 {
            return Err(EventifyError::InvalidInput("Capacity must be at least 1".to_string()));
        }
        if capacity < event.attendee_count {
            return Err(EventifyError::InvalidInput(format!(
                "Capacity cannot be lower than the {} people already registered",
                event.attendee_count
            )));
        }
    }
    Ok(())
}

/// Apply an edit to `event`; `attendee_count` is never touched
pub fn apply_event_update(mut event: Event, request: UpdateEventRequest) -> Event {
    if let Some(title) = request.title {
        event.title = title.trim().to_string();
    }
    if let Some(description) = request.description {
        event.description = Some(description);
    }
    if let Some(start_at) = request.start_at {
        event.start_at = start_at;
    }
    if let Some(end_at) = request.end_at {
        event.end_at = end_at;
    }
    if let Some(location) = request.location {
        event.location = Some(location);
    }
    if let Some(category) = request.category {
        event.category = Some(category);
    }
    if let Some(visibility) = request.visibility {
        event.visibility = visibility.as_str().to_string();
    }
    if let Some(capacity) = request.capacity {
        event.capacity = Some(capacity);
    }
    if let Some(status) = request.status {
        event.status = status.as_str().to_string();
    }
    if let Some(room_id) = request.room_id {
        event.room_id = Some(room_id);
    }
    if let Some(image_url) = request.image_url {
        event.image_url = Some(image_url);
    }
    event
}

/// Copy of `source` as a draft one week from `now`, keeping its duration
pub fn duplicate_event(source: &Event, created_by: Uuid, now: DateTime<Utc>) -> Event {
    let duration = source.end_at - source.start_at;
    let start_at = now + Duration::weeks(1);

    Event {
        id: Uuid::new_v4(),
        title: format!("{} (Copy)", source.title),
        start_at,
        end_at: start_at + duration,
        attendee_count: 0,
        status: EventStatus::Draft.as_str().to_string(),
        created_by: Some(created_by),
        created_at: now,
        updated_at: now,
        ..source.clone()
    }
}

/// Dashboard statistics over an admin's events as of `now`
pub fn build_admin_dashboard(events: Vec<Event>, now: DateTime<Utc>) -> AdminDashboard {
    let upcoming_events = events.iter().filter(|e| e.start_at > now).count();
    let total_attendees = events.iter().map(|e| e.attendee_count as i64).sum();
    let categories: BTreeSet<String> = events
        .iter()
        .filter_map(|e| e.category.clone())
        .filter(|c| !c.trim().is_empty())
        .collect();

    AdminDashboard {
        total_events: events.len(),
        upcoming_events,
        total_attendees,
        categories: categories.into_iter().collect(),
        events,
    }
}

#[derive(Clone)]
#[derive(Debug)]
pub struct EventService {
    db: DatabaseService,
}

impl EventService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn get(&self, event_id: Uuid) -> Result<Event> {
        self.db.events.find_by_id(event_id).await?
            .ok_or(EventifyError::EventNotFound { event_id })
    }

    /// Event as seen by anyone; drafts stay hidden
    pub async fn get_public(&self, event_id: Uuid) -> Result<Event> {
        let event = self.get(event_id).await?;
        if event.status == EventStatus::Draft.as_str() {
            return Err(EventifyError::EventNotFound { event_id });
        }
        Ok(event)
    }

    pub async fn list_public(&self, filters: EventFilters) -> Result<EventPage> {
        if let (Some(from), Some(to)) = (filters.start_date, filters.end_date) {
            if to < from {
                return Err(EventifyError::InvalidInput("end_date must not be before start_date".to_string()));
            }
        }

        let (events, next) = self.db.events.list_public(&filters).await?;
        Ok(EventPage {
            events,
            next_cursor: next.map(|c| c.encode()),
        })
    }

    pub async fn upcoming(&self, limit: Option<i64>) -> Result<Vec<Event>> {
        let limit = clamp_page_size(Some(limit.unwrap_or(DEFAULT_UPCOMING_LIMIT)));
        self.db.events.upcoming(limit).await
    }

    /// Reject room problems: unknown room, too small, or double-booked
    async fn check_room(&self, event: &Event, exclude: Option<Uuid>) -> Result<()> {
        let Some(room_id) = event.room_id else {
            return Ok(());
        };

        let room = self.db.rooms.find_by_id(room_id).await?
            .ok_or(EventifyError::RoomNotFound { room_id })?;

        if !room.available {
            return Err(EventifyError::InvalidInput(format!("Room '{}' is not available", room.name)));
        }
        if let Some(capacity) = event.capacity {
            if capacity > room.capacity {
                return Err(EventifyError::InvalidInput(format!(
                    "Capacity {} exceeds the capacity of room '{}' ({})",
                    capacity, room.name, room.capacity
                )));
            }
        }

        let conflicts = self.db.events
            .find_room_conflicts(room_id, event.start_at, event.end_at, exclude)
            .await?;
        if !conflicts.is_empty() {
            let ids: Vec<String> = conflicts.iter().map(Uuid::to_string).collect();
            return Err(EventifyError::Conflict(format!(
                "Room '{}' is already booked by event(s) {}",
                room.name,
                ids.join(", ")
            )));
        }

        Ok(())
    }

    pub async fn create(&self, admin_id: Uuid, request: CreateEventRequest) -> Result<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description,
            start_at: request.start_at,
            end_at: request.end_at,
            location: request.location,
            category: request.category,
            visibility: request.visibility.as_str().to_string(),
            capacity: request.capacity,
            attendee_count: 0,
            status: request.status.as_str().to_string(),
            room_id: request.room_id,
            image_url: request.image_url,
            created_by: Some(admin_id),
            created_at: now,
            updated_at: now,
        };

        validate_event(&event)?;
        self.check_room(&event, None).await?;

        let event = self.db.events.create(&event).await?;
        info!(event_id = %event.id, title = %event.title, "Event created");
        log_event_action(event.id, "create", admin_id, Some(&event.title));

        Ok(event)
    }

    pub async fn update(&self, admin_id: Uuid, event_id: Uuid, request: UpdateEventRequest) -> Result<Event> {
        let existing = self.get(event_id).await?;
        let preview = apply_event_update(existing, request.clone());

        validate_event(&preview)?;
        self.check_room(&preview, Some(event_id)).await?;

        // Capacity is checked again against the locked row; a registration may
        // have landed since the read above.
        let event = self.db.events
            .update_with(event_id, |current| {
                let updated = apply_event_update(current, request);
                validate_event(&updated)?;
                Ok(updated)
            })
            .await?;
        log_event_action(event_id, "update", admin_id, None);
        Ok(event)
    }

    pub async fn update_status(&self, admin_id: Uuid, event_id: Uuid, status: EventStatus) -> Result<Event> {
        let event = self.db.events.update_status(event_id, status).await?;
        log_event_action(event_id, "update_status", admin_id, Some(status.as_str()));
        Ok(event)
    }

    pub async fn delete(&self, admin_id: Uuid, event_id: Uuid) -> Result<()> {
        self.db.events.delete(event_id).await?;
        log_event_action(event_id, "delete", admin_id, None);
        Ok(())
    }

    /// Duplicate an event as a draft a week from now
    ///
    /// The copy is created without a room so it cannot collide with the
    /// original's booking.
    pub async fn duplicate(&self, admin_id: Uuid, event_id: Uuid) -> Result<Event> {
        let source = self.get(event_id).await?;
        let mut copy = duplicate_event(&source, admin_id, Utc::now());
        copy.room_id = None;

        let event = self.db.events.create(&copy).await?;
        log_event_action(event.id, "duplicate", admin_id, Some(&format!("from {}", event_id)));
        Ok(event)
    }

    pub async fn created_by(&self, admin_id: Uuid) -> Result<Vec<Event>> {
        self.db.events.by_creator(admin_id).await
    }

    pub async fn attendees(&self, event_id: Uuid) -> Result<Vec<Attendee>> {
        self.get(event_id).await?;
        self.db.events.list_attendees(event_id).await
    }

    pub async fn bulk_delete(&self, admin_id: Uuid, event_ids: &[Uuid]) -> Result<BulkResult> {
        let mut result = BulkResult::default();

        for &event_id in event_ids {
            match self.db.events.delete(event_id).await {
                Ok(()) => result.succeeded.push(event_id),
                Err(e) => {
                    warn!(event_id = %event_id, error = %e, "Bulk delete skipped event");
                    result.failed.push(event_id);
                }
            }
        }

        log_admin_action(
            admin_id,
            "bulk_delete",
            None,
            Some(&format!("{} deleted, {} failed", result.succeeded.len(), result.failed.len())),
        );
        Ok(result)
    }

    pub async fn bulk_update_status(&self, admin_id: Uuid, event_ids: &[Uuid], status: EventStatus) -> Result<BulkResult> {
        let mut result = BulkResult::default();

        for &event_id in event_ids {
            match self.db.events.update_status(event_id, status).await {
                Ok(_) => result.succeeded.push(event_id),
                Err(e) => {
                    warn!(event_id = %event_id, error = %e, "Bulk status update skipped event");
                    result.failed.push(event_id);
                }
            }
        }

        log_admin_action(
            admin_id,
            "bulk_status",
            Some(status.as_str()),
            Some(&format!("{} updated, {} failed", result.succeeded.len(), result.failed.len())),
        );
        Ok(result)
    }

    pub async fn admin_dashboard(&self, admin_id: Uuid) -> Result<AdminDashboard> {
        let events = self.created_by(admin_id).await?;
        Ok(build_admin_dashboard(events, Utc::now()))
    }

    /// Recompute every attendee count from the attendee rows
    pub async fn reconcile_attendee_counts(&self, admin_id: Uuid) -> Result<u64> {
        let changed = self.db.events.recount_attendees().await?;
        debug!(changed = changed, "Attendee counts reconciled");
        log_admin_action(admin_id, "recount_attendees", None, Some(&format!("{} events corrected", changed)));
        Ok(changed)
    }
}
