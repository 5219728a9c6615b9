//! Room service

use tracing::info;
use uuid::Uuid;
use crate::database::repositories::RoomRepository;
use crate::models::room::{CreateRoomRequest, Room, UpdateRoomRequest};
use crate::utils::errors::{EventifyError, Result};
use crate::utils::logging::log_admin_action;

fn validate_room(name: &str, capacity: i32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EventifyError::InvalidInput("Room name is required".to_string()));
    }
    if capacity < 1 {
        return Err(EventifyError::InvalidInput("Room capacity must be at least 1".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
#[derive(Debug)]
pub struct RoomService {
    rooms: RoomRepository,
}

impl RoomService {
    pub fn new(rooms: RoomRepository) -> Self {
        Self { rooms }
    }

    pub async fn list(&self) -> Result<Vec<Room>> {
        self.rooms.list().await
    }

    pub async fn create(&self, admin_id: Uuid, mut request: CreateRoomRequest) -> Result<Room> {
        validate_room(&request.name, request.capacity)?;
        request.name = request.name.trim().to_string();

        let room = self.rooms.create(request).await?;
        info!(room_id = %room.id, name = %room.name, "Room created");
        log_admin_action(admin_id, "create_room", Some(&room.id.to_string()), Some(&room.name));
        Ok(room)
    }

    pub async fn update(&self, admin_id: Uuid, room_id: Uuid, request: UpdateRoomRequest) -> Result<Room> {
        let mut room = self.rooms.find_by_id(room_id).await?
            .ok_or(EventifyError::RoomNotFound { room_id })?;

        if let Some(name) = request.name {
            room.name = name.trim().to_string();
        }
        if let Some(capacity) = request.capacity {
            room.capacity = capacity;
        }
        if let Some(location) = request.location {
            room.location = Some(location);
        }
        if let Some(facilities) = request.facilities {
            room.facilities = facilities;
        }
        if let Some(available) = request.available {
            room.available = available;
        }
        validate_room(&room.name, room.capacity)?;

        let room = self.rooms.update(&room).await?;
        log_admin_action(admin_id, "update_room", Some(&room_id.to_string()), None);
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room() {
        assert!(validate_room("Lab 3", 24).is_ok());
        assert!(validate_room(" ", 24).is_err());
        assert!(validate_room("Lab 3", 0).is_err());
    }
}
