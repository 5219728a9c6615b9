//! Account, session and password reset tests
//!
//! These need Redis; a container is started unless `TEST_REDIS_URL` is set.

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;
use eventify::models::user::{SignInRequest, SignUpRequest};
use eventify::services::AuthStateChange;
use eventify::EventifyError;

use helpers::*;

async fn context() -> TestContext {
    let config = TestConfig {
        use_redis: true,
        ..TestConfig::default()
    };
    TestContext::new_with_config(config).await.expect("Failed to create test context")
}

fn student_sign_up(email: &str) -> SignUpRequest {
    SignUpRequest {
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
        display_name: "Nadia Rahman".to_string(),
        student_id: Some("2020-331-042".to_string()),
        session: Some("2020-21".to_string()),
        phone: None,
    }
}

/// Pull the reset token out of the last reset email's text body
async fn reset_token_from_email(ctx: &TestContext) -> String {
    let messages = ctx.email_mock.sent_messages().await;
    let text = messages
        .last()
        .and_then(|m| m["text"].as_str())
        .expect("Reset email should have been sent")
        .to_string();
    let start = text.find("token=").expect("Reset link missing") + "token=".len();
    text[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[tokio::test]
#[serial]
async fn test_sign_up_creates_student_and_session() {
    let ctx = context().await;
    let auth = &ctx.services.auth_service;
    let mut changes = auth.subscribe();

    let session = auth.sign_up(student_sign_up("Nadia@Uni.Test")).await.expect("Sign-up should succeed");

    assert_eq!(session.user.email, "nadia@uni.test");
    assert_eq!(session.user.role, "student");
    assert!(session.user.profile_complete);
    assert!(session.user.password_hash.starts_with("pbkdf2-sha256$"));

    let context = auth.authenticate(&session.token).await.expect("Token should authenticate");
    assert_eq!(context.user_id(), session.user.id);

    assert_matches!(changes.try_recv(), Ok(AuthStateChange::SignedUp { user_id }) if user_id == session.user.id);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_configured_admin_email_gets_admin_role() {
    let ctx = context().await;

    let mut request = student_sign_up(TEST_ADMIN_EMAIL);
    request.student_id = None;
    request.session = None;
    let session = ctx.services.auth_service.sign_up(request).await.unwrap();

    assert_eq!(session.user.role, "admin");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_duplicate_email_rejected_case_insensitively() {
    let ctx = context().await;
    let auth = &ctx.services.auth_service;

    auth.sign_up(student_sign_up("dup@uni.test")).await.unwrap();
    let result = auth.sign_up(student_sign_up("DUP@uni.test")).await;

    assert_matches!(result, Err(EventifyError::DuplicateAccount { .. }));
    assert_eq!(ctx.database.count_records("users").await.unwrap(), 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_sign_up_validation() {
    let ctx = context().await;
    let auth = &ctx.services.auth_service;

    let mut weak = student_sign_up("weak@uni.test");
    weak.password = "password".to_string();
    assert_matches!(auth.sign_up(weak).await, Err(EventifyError::InvalidInput(_)));

    let mut no_session = student_sign_up("nosession@uni.test");
    no_session.session = None;
    assert_matches!(auth.sign_up(no_session).await, Err(EventifyError::InvalidInput(_)));

    assert_matches!(auth.sign_up(student_sign_up("not-an-email")).await, Err(EventifyError::InvalidInput(_)));

    assert_eq!(ctx.database.count_records("users").await.unwrap(), 0);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_sign_in_checks_password() {
    let ctx = context().await;
    let auth = &ctx.services.auth_service;
    auth.sign_up(student_sign_up("signin@uni.test")).await.unwrap();

    let ok = auth.sign_in(SignInRequest {
        email: " SIGNIN@uni.test ".to_string(),
        password: TEST_PASSWORD.to_string(),
    }).await;
    assert!(ok.is_ok());

    let wrong = auth.sign_in(SignInRequest {
        email: "signin@uni.test".to_string(),
        password: "wrongpass1".to_string(),
    }).await;
    let unknown = auth.sign_in(SignInRequest {
        email: "nobody@uni.test".to_string(),
        password: TEST_PASSWORD.to_string(),
    }).await;

    // Same message either way so accounts cannot be probed
    let (Err(EventifyError::Authentication(a)), Err(EventifyError::Authentication(b))) = (wrong, unknown) else {
        panic!("Both sign-ins should fail authentication");
    };
    assert_eq!(a, b);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_sign_out_revokes_session() {
    let ctx = context().await;
    let auth = &ctx.services.auth_service;

    let session = auth.sign_up(student_sign_up("signout@uni.test")).await.unwrap();
    let context = auth.authenticate(&session.token).await.unwrap();

    auth.sign_out(&context).await.unwrap();

    assert_matches!(auth.authenticate(&session.token).await, Err(EventifyError::Authentication(_)));
    assert_matches!(auth.authenticate("not.a.token").await, Err(EventifyError::Token(_)));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_password_reset_flow() {
    let ctx = context().await;
    ctx.email_mock.mock_accept("msg_reset").await;
    let auth = &ctx.services.auth_service;
    auth.sign_up(student_sign_up("reset@uni.test")).await.unwrap();

    auth.request_password_reset("reset@uni.test").await.unwrap();
    let token = reset_token_from_email(&ctx).await;
    assert!(!token.is_empty());

    auth.confirm_password_reset(&token, "newpass42").await.expect("Reset should succeed");

    // Tokens are single use
    let reused = auth.confirm_password_reset(&token, "another42").await;
    assert_matches!(reused, Err(EventifyError::Authentication(_)));

    let old = auth.sign_in(SignInRequest {
        email: "reset@uni.test".to_string(),
        password: TEST_PASSWORD.to_string(),
    }).await;
    assert_matches!(old, Err(EventifyError::Authentication(_)));

    let new = auth.sign_in(SignInRequest {
        email: "reset@uni.test".to_string(),
        password: "newpass42".to_string(),
    }).await;
    assert!(new.is_ok());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_password_reset_for_unknown_email_is_silent() {
    let ctx = context().await;
    ctx.email_mock.mock_accept("msg_reset").await;

    ctx.services.auth_service.request_password_reset("ghost@uni.test").await.unwrap();
    assert!(ctx.email_mock.sent_messages().await.is_empty());

    ctx.cleanup().await.unwrap();
}
