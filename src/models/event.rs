//! Event model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub visibility: String,
    pub capacity: Option<i32>,
    pub attendee_count: i32,
    pub status: String,
    pub room_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_full(&self) -> bool {
        matches!(self.capacity, Some(c) if self.attendee_count >= c)
    }

    /// Whether new registrations are accepted at `now`
    pub fn accepts_registrations(&self, now: DateTime<Utc>) -> bool {
        let closed = self.status == EventStatus::Draft.as_str()
            || self.status == EventStatus::Cancelled.as_str()
            || self.status == EventStatus::Completed.as_str();
        !closed && self.end_at > now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: Option<String>,
    pub category: Option<String>,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    pub capacity: Option<i32>,
    #[serde(default = "default_status")]
    pub status: EventStatus,
    pub room_id: Option<Uuid>,
    pub image_url: Option<String>,
}

fn default_visibility() -> Visibility {
    Visibility::Public
}

fn default_status() -> EventStatus {
    EventStatus::Published
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<Visibility>,
    pub capacity: Option<i32>,
    pub status: Option<EventStatus>,
    pub room_id: Option<Uuid>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: EventStatus,
}

/// Filters for the public event listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilters {
    pub category: Option<String>,
    pub location: Option<String>,
    /// Case-insensitive match against title or description
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

/// One page of events plus the cursor for the next page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    pub event_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusRequest {
    pub event_ids: Vec<Uuid>,
    pub status: EventStatus,
}

/// Outcome of a bulk admin operation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkResult {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

/// Statistics for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub total_events: usize,
    pub upcoming_events: usize,
    pub total_attendees: i64,
    pub categories: Vec<String>,
    pub events: Vec<Event>,
}
