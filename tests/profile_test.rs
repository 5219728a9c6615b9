//! Profile edits and certificates against a real PostgreSQL

mod helpers;

use assert_matches::assert_matches;
use chrono::Duration;
use serial_test::serial;
use uuid::Uuid;
use eventify::models::event::EventStatus;
use eventify::models::user::{CreateUserRequest, UpdateProfileRequest, UserRole};
use eventify::services::auth::hash_password;
use eventify::EventifyError;

use helpers::*;

#[tokio::test]
#[serial]
async fn test_profile_update_persists_and_completes_profile() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let fresh = ctx.db.users
        .create(CreateUserRequest {
            display_name: "Nadia Rahman".to_string(),
            email: format!("{}@campus.example.edu", Uuid::new_v4().simple()),
            role: UserRole::Student,
            student_id: None,
            session: None,
            phone: None,
            password_hash: hash_password(TEST_PASSWORD, TEST_PBKDF2_ITERATIONS),
            profile_complete: false,
        })
        .await
        .unwrap();
    let users = &ctx.services.user_service;

    // Students cannot save without an id and a session
    let partial = UpdateProfileRequest {
        department: Some("Physics".to_string()),
        ..UpdateProfileRequest::default()
    };
    assert_matches!(users.update_profile(fresh.id, partial).await, Err(EventifyError::InvalidInput(_)));
    let unchanged = ctx.db.users.find_by_id(fresh.id).await.unwrap().unwrap();
    assert_eq!(unchanged.department, None);
    assert!(!unchanged.profile_complete);

    let complete = UpdateProfileRequest {
        student_id: Some(" 2022-117-045 ".to_string()),
        session: Some("2022-23".to_string()),
        department: Some("Physics".to_string()),
        phone: Some("+8801712345678".to_string()),
        bio: Some("Likes telescopes".to_string()),
        ..UpdateProfileRequest::default()
    };
    let returned = users.update_profile(fresh.id, complete).await.unwrap();
    assert!(returned.profile_complete);

    let stored = ctx.db.users.find_by_id(fresh.id).await.unwrap().unwrap();
    assert!(stored.profile_complete);
    assert_eq!(stored.student_id.as_deref(), Some("2022-117-045"));
    assert_eq!(stored.session.as_deref(), Some("2022-23"));
    assert_eq!(stored.department.as_deref(), Some("Physics"));
    assert_eq!(stored.bio.as_deref(), Some("Likes telescopes"));

    // An empty string clears an optional field
    let clear_bio = UpdateProfileRequest {
        bio: Some(String::new()),
        ..UpdateProfileRequest::default()
    };
    users.update_profile(fresh.id, clear_bio).await.unwrap();
    let stored = ctx.db.users.find_by_id(fresh.id).await.unwrap().unwrap();
    assert_eq!(stored.bio, None);
    assert!(stored.profile_complete);

    assert_matches!(
        users.update_profile(Uuid::new_v4(), UpdateProfileRequest::default()).await,
        Err(EventifyError::UserNotFound { .. })
    );

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_certificates_only_for_attended_completed_events() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let admin = create_test_admin(&ctx.db).await;
    let student = create_test_student(&ctx.db).await;
    let registrations = &ctx.services.registration_service;
    let events = &ctx.services.event_service;

    let mut uncategorised = event_template(Some(10), Duration::days(2));
    uncategorised.category = None;
    let attended_completed = insert_event(&ctx.db, uncategorised).await;
    let attended_published = create_test_event(&ctx.db, Some(10)).await;
    let missed_completed = create_test_event(&ctx.db, Some(10)).await;

    for event in [&attended_completed, &attended_published, &missed_completed] {
        registrations.register(event.id, student.id).await.unwrap();
    }
    registrations.mark_attendance(attended_completed.id, student.id, true).await.unwrap();
    registrations.mark_attendance(attended_published.id, student.id, true).await.unwrap();

    assert!(ctx.services.user_service.certificates(student.id).await.unwrap().is_empty());

    events.update_status(admin.id, attended_completed.id, EventStatus::Completed).await.unwrap();
    events.update_status(admin.id, missed_completed.id, EventStatus::Completed).await.unwrap();

    let certificates = ctx.services.user_service.certificates(student.id).await.unwrap();
    assert_eq!(certificates.len(), 1);
    let certificate = &certificates[0];
    assert_eq!(certificate.event_id, attended_completed.id);
    assert_eq!(certificate.event_title, attended_completed.title);
    assert_eq!(certificate.category, "General");
    assert_eq!(certificate.recipient_name, student.display_name);

    ctx.cleanup().await.unwrap();
}
