//! Room handlers

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::room::{CreateRoomRequest, UpdateRoomRequest};
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::response::{created, success};

pub async fn list_rooms(State(state): State<AppState>, _user: CurrentUser) -> Result<Response> {
    let rooms = state.services.room_service.list().await?;
    Ok(success(rooms, "Rooms retrieved"))
}

pub async fn create_room(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Response> {
    let room = state.services.room_service.create(admin.user_id(), request).await?;
    Ok(created(room, "Room created"))
}

pub async fn update_room(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(room_id): Path<Uuid>,
    Json(request): Json<UpdateRoomRequest>,
) -> Result<Response> {
    let room = state.services.room_service.update(admin.user_id(), room_id, request).await?;
    Ok(success(room, "Room updated"))
}
