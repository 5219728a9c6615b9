//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod event;
pub mod registration;
pub mod room;

// Re-export commonly used models
pub use user::{
    User, UserRole, CreateUserRequest, UpdateProfileRequest, SignUpRequest, SignInRequest,
    PasswordResetRequest, PasswordResetConfirmRequest, AuthSession,
};
pub use event::{
    Event, EventStatus, Visibility, CreateEventRequest, UpdateEventRequest, UpdateStatusRequest,
    EventFilters, EventPage, BulkDeleteRequest, BulkStatusRequest, BulkResult, AdminDashboard,
};
pub use registration::{
    Registration, Attendee, ParticipantStatus, RegistrationOutcome, UnregistrationOutcome,
    RegistrationWithEvent, AttendanceRequest, Certificate, StudentDashboard,
};
pub use room::{Room, CreateRoomRequest, UpdateRoomRequest};
