//! Test data builders for users, rooms and events

use chrono::{Duration, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;
use eventify::database::DatabaseService;
use eventify::models::event::{Event, EventStatus, Visibility};
use eventify::models::room::{CreateRoomRequest, Room};
use eventify::models::user::{CreateUserRequest, User, UserRole};
use eventify::services::auth::hash_password;

/// Password every seeded account uses
pub const TEST_PASSWORD: &str = "campus2024";

/// Iterations used for seeded accounts and test settings
pub const TEST_PBKDF2_ITERATIONS: u32 = 1_000;

pub async fn create_test_user(db: &DatabaseService, role: UserRole) -> User {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    // fake can repeat addresses across calls
    let email = format!("{}.{}", &Uuid::new_v4().simple().to_string()[..8], email);

    db.users
        .create(CreateUserRequest {
            display_name: name,
            email,
            role,
            student_id: matches!(role, UserRole::Student).then(|| "2021-331-001".to_string()),
            session: matches!(role, UserRole::Student).then(|| "2021-22".to_string()),
            phone: None,
            password_hash: hash_password(TEST_PASSWORD, TEST_PBKDF2_ITERATIONS),
            profile_complete: true,
        })
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_student(db: &DatabaseService) -> User {
    create_test_user(db, UserRole::Student).await
}

pub async fn create_test_admin(db: &DatabaseService) -> User {
    create_test_user(db, UserRole::Admin).await
}

/// Published public event starting `starts_in` from now and lasting two hours
pub fn event_template(capacity: Option<i32>, starts_in: Duration) -> Event {
    let now = Utc::now();
    let start_at = now + starts_in;

    Event {
        id: Uuid::new_v4(),
        title: format!("Workshop {}", &Uuid::new_v4().simple().to_string()[..6]),
        description: Some("Hands-on session".to_string()),
        start_at,
        end_at: start_at + Duration::hours(2),
        location: Some("Main Auditorium".to_string()),
        category: Some("Workshop".to_string()),
        visibility: Visibility::Public.as_str().to_string(),
        capacity,
        attendee_count: 0,
        status: EventStatus::Published.as_str().to_string(),
        room_id: None,
        image_url: None,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub async fn create_test_event(db: &DatabaseService, capacity: Option<i32>) -> Event {
    insert_event(db, event_template(capacity, Duration::days(7))).await
}

pub async fn insert_event(db: &DatabaseService, event: Event) -> Event {
    db.events.create(&event).await.expect("Failed to create test event")
}

pub async fn create_test_room(db: &DatabaseService, capacity: i32) -> Room {
    db.rooms
        .create(CreateRoomRequest {
            name: format!("Room {}", &Uuid::new_v4().simple().to_string()[..4]),
            capacity,
            location: Some("Science Building".to_string()),
            facilities: vec!["projector".to_string()],
        })
        .await
        .expect("Failed to create test room")
}
