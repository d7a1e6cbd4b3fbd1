use std::time::Duration;

use barber_core::models::UserType;
use barber_core::screens::{SlotInput, WeeklySchedule};
use barber_core::{BookingError, NoticeLevel, ValidationError};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{context, slot_json};

const LIST: &str = "/schedules/barber/7";

/// First load answers `first`, every later one answers `then`.
async fn mount_lists(server: &MockServer, first: serde_json::Value, then: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(LIST))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST))
        .respond_with(ResponseTemplate::new(200).set_body_json(then))
        .mount(server)
        .await;
}

#[tokio::test]
async fn rows_are_ordered_by_weekday() {
    let server = MockServer::start().await;
    let list = json!([slot_json(3, 4, true), slot_json(1, 0, true), slot_json(2, 2, false)]);
    mount_lists(&server, list.clone(), list).await;
    let (ctx, _notices) = context(&server, UserType::Barber);

    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    let weekdays: Vec<&str> = schedule.rows().iter().map(|r| r.weekday).collect();
    assert_eq!(weekdays, vec!["Monday", "Wednesday", "Friday"]);
}

#[tokio::test]
async fn toggle_sends_the_flag_and_keeps_the_server_view() {
    let server = MockServer::start().await;
    mount_lists(
        &server,
        json!([slot_json(1, 0, true)]),
        json!([slot_json(1, 0, false)]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/schedules/1"))
        .and(body_json(json!({ "active": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    schedule.toggle_active(1).await.expect("toggle");

    assert!(!schedule.slots()[0].active);
    assert_eq!(notices.drain()[0].message, "Schedule slot deactivated");
}

#[tokio::test]
async fn refused_toggle_is_reverted() {
    let server = MockServer::start().await;
    let list = json!([slot_json(1, 0, true), slot_json(2, 1, true)]);
    mount_lists(&server, list.clone(), list).await;
    Mock::given(method("PUT"))
        .and(path("/schedules/1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Database error" })))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    let err = schedule.toggle_active(1).await.expect_err("refused");

    assert!(matches!(err, BookingError::Mutation { id: 1, .. }));
    assert!(schedule.slots().iter().all(|s| s.active));
    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(
        notices[0].message,
        "Could not deactivate schedule slot #1: Database error"
    );
}

#[tokio::test]
async fn delete_removes_the_slot() {
    let server = MockServer::start().await;
    mount_lists(
        &server,
        json!([slot_json(1, 0, true), slot_json(2, 1, true)]),
        json!([slot_json(1, 0, true)]),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/schedules/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "deleted" })))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    schedule.delete(2).await.expect("delete");

    let ids: Vec<_> = schedule.slots().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(notices.drain()[0].message, "Schedule slot deleted");
}

#[tokio::test]
async fn invalid_slot_is_rejected_locally() {
    let server = MockServer::start().await;
    mount_lists(&server, json!([]), json!([])).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    let result = schedule
        .add(SlotInput {
            day_of_week: 1,
            start_time: "18:00".to_string(),
            end_time: "09:00".to_string(),
        })
        .await;

    assert!(matches!(result, Err(BookingError::Validation(_))));
    assert_eq!(notices.count(NoticeLevel::Warning), 1);
}

#[tokio::test]
async fn default_week_is_created_by_the_server() {
    let server = MockServer::start().await;
    mount_lists(
        &server,
        json!([]),
        json!([slot_json(10, 0, true), slot_json(11, 1, true)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/schedules/barber/7/default"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, _notices) = context(&server, UserType::Barber);
    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    schedule.create_defaults().await.expect("defaults");

    assert_eq!(schedule.slots().len(), 2);
}

#[tokio::test]
async fn slot_stays_locked_while_its_delete_is_outstanding() {
    let server = MockServer::start().await;
    mount_lists(&server, json!([slot_json(1, 0, true)]), json!([])).await;
    Mock::given(method("DELETE"))
        .and(path("/schedules/1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    let (deleted, toggled) = tokio::join!(schedule.delete(1), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(schedule.is_saving(1));
        schedule.toggle_active(1).await
    });

    deleted.expect("delete");
    assert!(matches!(
        toggled,
        Err(BookingError::Validation(ValidationError::MutationInFlight(1)))
    ));
    assert!(schedule.slots().is_empty());
    assert_eq!(notices.count(NoticeLevel::Warning), 1);
}

#[tokio::test]
async fn failed_delete_keeps_the_slot() {
    let server = MockServer::start().await;
    let list = json!([slot_json(1, 0, true)]);
    mount_lists(&server, list.clone(), list).await;
    Mock::given(method("DELETE"))
        .and(path("/schedules/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Slot not found" })))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    let err = schedule.delete(1).await.expect_err("refused");

    assert!(matches!(err, BookingError::Mutation { id: 1, .. }));
    assert_eq!(schedule.slots().len(), 1);
    assert!(!schedule.is_saving(1));
    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(
        notices[0].message,
        "Could not delete schedule slot #1: Slot not found"
    );
}

#[tokio::test]
async fn add_succeeds_even_when_the_reload_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/schedules"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let schedule = WeeklySchedule::open(ctx).await.expect("open");

    schedule
        .add(SlotInput {
            day_of_week: 2,
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
        })
        .await
        .expect("the slot was created");

    let notices = notices.drain();
    let seen: Vec<_> = notices
        .iter()
        .map(|n| (n.level, n.message.as_str()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (NoticeLevel::Success, "Schedule slot added"),
            (NoticeLevel::Error, "Could not load schedule: db down"),
        ]
    );
}
