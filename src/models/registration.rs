//! Registration and attendee models
//!
//! A registration is the user-side record of signing up for an event, an
//! attendee is the event-side mirror of the same fact. Both are written
//! and removed together.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::event::Event;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: String,
    pub attended: bool,
    pub registered_at: DateTime<Utc>,
    pub email_sent: Option<bool>,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub email_message_id: Option<String>,
    pub email_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendee {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub status: String,
    pub attended: bool,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Registered,
    Attended,
    Cancelled,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Registered => "registered",
            ParticipantStatus::Attended => "attended",
            ParticipantStatus::Cancelled => "cancelled",
        }
    }
}

/// Result of a register call; `created` is false when the user was already registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub registration: Registration,
    pub attendee_count: i32,
    pub created: bool,
}

/// Result of an unregister call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnregistrationOutcome {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub attendee_count: i32,
}

/// A user's registration joined with its event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationWithEvent {
    pub registration: Registration,
    pub event: Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRequest {
    pub attended: bool,
}

/// Certificate of participation for a completed, attended event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certificate {
    pub event_id: Uuid,
    pub event_title: String,
    pub category: String,
    pub recipient_name: String,
    pub issued_on: DateTime<Utc>,
}

/// Statistics for the student dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentDashboard {
    pub registrations: Vec<RegistrationWithEvent>,
    pub total_registered: usize,
    pub upcoming: usize,
    pub attended: usize,
}
