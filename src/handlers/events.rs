//! Public event and registration handlers

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;
use crate::middleware::StudentUser;
use crate::models::event::EventFilters;
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::response::{created, success};

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

pub async fn list_events(State(state): State<AppState>, Query(filters): Query<EventFilters>) -> Result<Response> {
    let page = state.services.event_service.list_public(filters).await?;
    Ok(success(page, "Events retrieved"))
}

pub async fn upcoming_events(State(state): State<AppState>, Query(query): Query<UpcomingQuery>) -> Result<Response> {
    let events = state.services.event_service.upcoming(query.limit).await?;
    Ok(success(events, "Upcoming events retrieved"))
}

pub async fn get_event(State(state): State<AppState>, Path(event_id): Path<Uuid>) -> Result<Response> {
    let event = state.services.event_service.get_public(event_id).await?;
    Ok(success(event, "Event retrieved"))
}

/// 201 for a new registration, 200 when the caller was already registered
pub async fn register(
    State(state): State<AppState>,
    StudentUser(context): StudentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response> {
    let outcome = state.services.registration_service
        .register(event_id, context.user_id())
        .await?;

    if outcome.created {
        Ok(created(outcome, "Successfully registered for the event"))
    } else {
        Ok(success(outcome, "Already registered for this event"))
    }
}

pub async fn unregister(
    State(state): State<AppState>,
    StudentUser(context): StudentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response> {
    let outcome = state.services.registration_service
        .unregister(event_id, context.user_id())
        .await?;
    Ok(success(outcome, "Successfully unregistered from the event"))
}
