//! Room administration tests

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;
use uuid::Uuid;
use eventify::models::room::{CreateRoomRequest, UpdateRoomRequest};
use eventify::EventifyError;

use helpers::*;

fn room_request(name: &str, capacity: i32) -> CreateRoomRequest {
    CreateRoomRequest {
        name: name.to_string(),
        capacity,
        location: Some("Library Annex".to_string()),
        facilities: vec!["whiteboard".to_string()],
    }
}

#[tokio::test]
#[serial]
async fn test_room_create_and_update() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let admin = create_test_admin(&ctx.db).await;
    let rooms = &ctx.services.room_service;

    let room = rooms.create(admin.id, room_request("  Seminar Room 2 ", 35)).await.unwrap();
    assert_eq!(room.name, "Seminar Room 2");
    assert_eq!(room.capacity, 35);
    assert!(room.available);

    let update = UpdateRoomRequest {
        capacity: Some(60),
        facilities: Some(vec!["projector".to_string(), "microphone".to_string()]),
        available: Some(false),
        ..UpdateRoomRequest::default()
    };
    rooms.update(admin.id, room.id, update).await.unwrap();

    let stored = ctx.db.rooms.find_by_id(room.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Seminar Room 2");
    assert_eq!(stored.capacity, 60);
    assert_eq!(stored.facilities, vec!["projector".to_string(), "microphone".to_string()]);
    assert!(!stored.available);
    assert_eq!(stored.location.as_deref(), Some("Library Annex"));

    let listed = rooms.list().await.unwrap();
    assert!(listed.iter().any(|r| r.id == room.id));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_room_validation() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let admin = create_test_admin(&ctx.db).await;
    let rooms = &ctx.services.room_service;

    assert_matches!(rooms.create(admin.id, room_request("   ", 10)).await, Err(EventifyError::InvalidInput(_)));
    assert_matches!(rooms.create(admin.id, room_request("Lab 4", 0)).await, Err(EventifyError::InvalidInput(_)));
    assert!(rooms.list().await.unwrap().is_empty());

    let room = rooms.create(admin.id, room_request("Lab 4", 12)).await.unwrap();
    let shrink = UpdateRoomRequest { capacity: Some(0), ..UpdateRoomRequest::default() };
    assert_matches!(rooms.update(admin.id, room.id, shrink).await, Err(EventifyError::InvalidInput(_)));
    assert_eq!(ctx.db.rooms.find_by_id(room.id).await.unwrap().unwrap().capacity, 12);

    assert_matches!(
        rooms.update(admin.id, Uuid::new_v4(), UpdateRoomRequest::default()).await,
        Err(EventifyError::RoomNotFound { .. })
    );

    ctx.cleanup().await.unwrap();
}
