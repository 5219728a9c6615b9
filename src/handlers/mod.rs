//! HTTP handlers module
//!
//! Handlers are grouped by resource; `create_router` wires them to paths
//! and layers.

pub mod admin;
pub mod auth;
pub mod events;
pub mod health;
pub mod profile;
pub mod rooms;

use axum::routing::{get, post, put};
use axum::{middleware as axum_middleware, Router};
use crate::middleware::cors::cors_layer;
use crate::middleware::logging::{log_request_timing, trace_layer};
use crate::middleware::rate_limit::limit_auth_requests;
use crate::state::AppState;

/// Build the full API router
pub fn create_router(state: AppState) -> Router {
    let public_auth = Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/signin", post(auth::sign_in))
        .route("/password-reset", post(auth::request_password_reset))
        .route("/password-reset/confirm", post(auth::confirm_password_reset))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), limit_auth_requests));

    let auth_routes = Router::new()
        .merge(public_auth)
        .route("/signout", post(auth::sign_out))
        .route("/me", get(auth::me));

    let event_routes = Router::new()
        .route("/", get(events::list_events))
        .route("/upcoming", get(events::upcoming_events))
        .route("/:id", get(events::get_event))
        .route("/:id/registration", post(events::register).delete(events::unregister));

    let me_routes = Router::new()
        .route("/", axum::routing::delete(profile::delete_account))
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/registrations", get(profile::my_registrations))
        .route("/dashboard", get(profile::dashboard))
        .route("/certificates", get(profile::certificates));

    let admin_routes = Router::new()
        .route("/events", get(admin::my_events).post(admin::create_event))
        .route("/events/bulk-delete", post(admin::bulk_delete))
        .route("/events/bulk-status", post(admin::bulk_status))
        .route("/events/:id", put(admin::update_event).delete(admin::delete_event))
        .route("/events/:id/status", put(admin::update_status))
        .route("/events/:id/duplicate", post(admin::duplicate_event))
        .route("/events/:id/attendees", get(admin::attendees))
        .route("/events/:id/attendees/:user_id/attendance", put(admin::mark_attendance))
        .route("/dashboard", get(admin::dashboard))
        .route("/rooms", post(rooms::create_room))
        .route("/rooms/:id", put(rooms::update_room))
        .route("/maintenance/recount", post(admin::recount_attendees));

    let cors = cors_layer(&state.settings.server);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/events", event_routes)
        .nest("/api/me", me_routes)
        .route("/api/rooms", get(rooms::list_rooms))
        .nest("/api/admin", admin_routes)
        .layer(axum_middleware::from_fn(log_request_timing))
        .layer(trace_layer())
        .layer(cors)
        .with_state(state)
}
