//! Account and session handlers

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use crate::middleware::CurrentUser;
use crate::models::user::{PasswordResetConfirmRequest, PasswordResetRequest, SignInRequest, SignUpRequest};
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::response::{created, empty_success, success};

pub async fn sign_up(State(state): State<AppState>, Json(request): Json<SignUpRequest>) -> Result<Response> {
    let session = state.services.auth_service.sign_up(request).await?;
    Ok(created(session, "Account created"))
}

pub async fn sign_in(State(state): State<AppState>, Json(request): Json<SignInRequest>) -> Result<Response> {
    let session = state.services.auth_service.sign_in(request).await?;
    Ok(success(session, "Signed in"))
}

pub async fn sign_out(State(state): State<AppState>, CurrentUser(context): CurrentUser) -> Result<Response> {
    state.services.auth_service.sign_out(&context).await?;
    Ok(empty_success("Signed out"))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Response> {
    state.services.auth_service.request_password_reset(&request.email).await?;
    Ok(empty_success("If an account exists for that email, a reset link has been sent"))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<Response> {
    state.services.auth_service
        .confirm_password_reset(&request.token, &request.new_password)
        .await?;
    Ok(empty_success("Password updated"))
}

pub async fn me(CurrentUser(context): CurrentUser) -> Response {
    success(context.user, "Current user")
}
