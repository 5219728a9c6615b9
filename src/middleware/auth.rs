//! Authentication extractors
//!
//! Handlers take `CurrentUser`, `AdminUser` or `StudentUser` as an argument
//! to require a signed-in caller with the matching role.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use tracing::debug;
use crate::services::AuthContext;
use crate::state::AppState;
use crate::utils::errors::{EventifyError, Result};

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| EventifyError::Authentication("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| EventifyError::Authentication("Malformed authorization header".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| EventifyError::Authentication("Expected a bearer token".to_string()))?;

    Ok(token)
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthContext> {
    let token = bearer_token(&parts.headers)?;
    let context = state.services.auth_service.authenticate(token).await?;
    debug!(user_id = %context.user.id, role = %context.user.role, "Request authenticated");
    Ok(context)
}

/// Any signed-in user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

/// Signed-in user with the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthContext);

/// Signed-in user with the student role
#[derive(Debug, Clone)]
pub struct StudentUser(pub AuthContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = EventifyError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        authenticate(parts, state).await.map(CurrentUser)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = EventifyError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let context = authenticate(parts, state).await?;
        context.require_admin()?;
        Ok(AdminUser(context))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for StudentUser {
    type Rejection = EventifyError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let context = authenticate(parts, state).await?;
        context.require_student()?;
        Ok(StudentUser(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers("bearer  xyz ")).unwrap(), "xyz");
    }

    #[test]
    fn test_bearer_token_rejections() {
        assert_matches!(bearer_token(&HeaderMap::new()), Err(EventifyError::Authentication(_)));
        assert_matches!(bearer_token(&headers("Basic dXNlcjpwYXNz")), Err(EventifyError::Authentication(_)));
        assert_matches!(bearer_token(&headers("Bearer ")), Err(EventifyError::Authentication(_)));
    }
}
