//! Handlers for the signed-in user's own account

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use tracing::warn;
use crate::middleware::CurrentUser;
use crate::models::user::UpdateProfileRequest;
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::response::{empty_success, success};

pub async fn get_profile(State(state): State<AppState>, CurrentUser(context): CurrentUser) -> Result<Response> {
    let user = state.services.user_service.get_profile(context.user_id()).await?;
    Ok(success(user, "Profile retrieved"))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(context): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Response> {
    let user = state.services.user_service.update_profile(context.user_id(), request).await?;
    Ok(success(user, "Profile updated successfully"))
}

/// Delete the account, then revoke the session that made the request
pub async fn delete_account(State(state): State<AppState>, CurrentUser(context): CurrentUser) -> Result<Response> {
    state.services.user_service.delete_account(context.user_id()).await?;

    if let Err(e) = state.services.auth_service.sign_out(&context).await {
        warn!(user_id = %context.user_id(), error = %e, "Session not revoked after account deletion");
    }

    Ok(empty_success("Account deleted"))
}

pub async fn my_registrations(State(state): State<AppState>, CurrentUser(context): CurrentUser) -> Result<Response> {
    let registrations = state.services.user_service.registrations(context.user_id()).await?;
    Ok(success(registrations, "Registrations retrieved"))
}

pub async fn dashboard(State(state): State<AppState>, CurrentUser(context): CurrentUser) -> Result<Response> {
    let dashboard = state.services.user_service.dashboard(context.user_id(), Utc::now()).await?;
    Ok(success(dashboard, "Dashboard retrieved"))
}

pub async fn certificates(State(state): State<AppState>, CurrentUser(context): CurrentUser) -> Result<Response> {
    let certificates = state.services.user_service.certificates(context.user_id()).await?;
    Ok(success(certificates, "Certificates retrieved"))
}
