//! Database service layer
//!
//! Bundles the repositories over one shared pool

use crate::database::{DatabasePool, UserRepository, EventRepository, RegistrationRepository, RoomRepository};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub rooms: RoomRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            rooms: RoomRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}
