//! Database repositories module
//! 
//! This module contains all repository implementations for data access

pub mod user;
pub mod event;
pub mod registration;
pub mod room;

// Re-export repositories
pub use user::UserRepository;
pub use event::{EventRepository, EventCursor};
pub use registration::RegistrationRepository;
pub use room::RoomRepository;
