//! Admin event management handlers

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde_json::json;
use uuid::Uuid;
use crate::middleware::AdminUser;
use crate::models::event::{
    BulkDeleteRequest, BulkStatusRequest, CreateEventRequest, UpdateEventRequest, UpdateStatusRequest,
};
use crate::models::registration::AttendanceRequest;
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::response::{created, empty_success, success};

pub async fn create_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<CreateEventRequest>,
) -> Result<Response> {
    let event = state.services.event_service.create(admin.user_id(), request).await?;
    Ok(created(event, "Event created successfully"))
}

pub async fn my_events(State(state): State<AppState>, AdminUser(admin): AdminUser) -> Result<Response> {
    let events = state.services.event_service.created_by(admin.user_id()).await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Response> {
    let event = state.services.event_service.update(admin.user_id(), event_id, request).await?;
    Ok(success(event, "Event updated successfully"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response> {
    state.services.event_service.delete(admin.user_id(), event_id).await?;
    Ok(empty_success("Event deleted successfully"))
}

pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Response> {
    let event = state.services.event_service
        .update_status(admin.user_id(), event_id, request.status)
        .await?;
    Ok(success(event, "Event status updated"))
}

pub async fn duplicate_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response> {
    let event = state.services.event_service.duplicate(admin.user_id(), event_id).await?;
    Ok(created(event, "Event duplicated as draft"))
}

pub async fn attendees(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response> {
    let attendees = state.services.event_service.attendees(event_id).await?;
    Ok(success(attendees, "Attendees retrieved"))
}

pub async fn mark_attendance(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AttendanceRequest>,
) -> Result<Response> {
    let registration = state.services.registration_service
        .mark_attendance(event_id, user_id, request.attended)
        .await?;
    Ok(success(registration, "Attendance updated"))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Response> {
    let result = state.services.event_service.bulk_delete(admin.user_id(), &request.event_ids).await?;
    let message = format!("{} deleted, {} failed", result.succeeded.len(), result.failed.len());
    Ok(success(result, message))
}

pub async fn bulk_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<BulkStatusRequest>,
) -> Result<Response> {
    let result = state.services.event_service
        .bulk_update_status(admin.user_id(), &request.event_ids, request.status)
        .await?;
    let message = format!("{} updated, {} failed", result.succeeded.len(), result.failed.len());
    Ok(success(result, message))
}

pub async fn dashboard(State(state): State<AppState>, AdminUser(admin): AdminUser) -> Result<Response> {
    let dashboard = state.services.event_service.admin_dashboard(admin.user_id()).await?;
    Ok(success(dashboard, "Dashboard retrieved"))
}

pub async fn recount_attendees(State(state): State<AppState>, AdminUser(admin): AdminUser) -> Result<Response> {
    let corrected = state.services.event_service.reconcile_attendee_counts(admin.user_id()).await?;
    Ok(success(json!({ "events_corrected": corrected }), "Attendee counts reconciled"))
}
