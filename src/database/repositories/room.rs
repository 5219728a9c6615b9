//! Room repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::room::{Room, CreateRoomRequest};
use crate::utils::errors::EventifyError;

const ROOM_COLUMNS: &str = "id, name, capacity, location, facilities, available, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateRoomRequest) -> Result<Room, EventifyError> {
        let now = Utc::now();
        let room = sqlx::query_as::<_, Room>(&format!(
            r#"
            INSERT INTO rooms (id, name, capacity, location, facilities, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7)
            RETURNING {}
            "#,
            ROOM_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(request.capacity)
        .bind(&request.location)
        .bind(&request.facilities)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(room)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Room>, EventifyError> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {} FROM rooms WHERE id = $1",
            ROOM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    /// All rooms ordered by name
    pub async fn list(&self) -> Result<Vec<Room>, EventifyError> {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "SELECT {} FROM rooms ORDER BY name ASC",
            ROOM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    /// Write back the editable fields of `room`
    pub async fn update(&self, room: &Room) -> Result<Room, EventifyError> {
        let updated = sqlx::query_as::<_, Room>(&format!(
            r#"
            UPDATE rooms
            SET name = $2, capacity = $3, location = $4, facilities = $5, available = $6, updated_at = $7
            WHERE id = $1
            RETURNING {}
            "#,
            ROOM_COLUMNS
        ))
        .bind(room.id)
        .bind(&room.name)
        .bind(room.capacity)
        .bind(&room.location)
        .bind(&room.facilities)
        .bind(room.available)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EventifyError::RoomNotFound { room_id: room.id })?;

        Ok(updated)
    }
}
