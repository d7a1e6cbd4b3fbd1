use barber_core::models::{AppointmentAction, AppointmentStatus, UserType};
use barber_core::screens::AppointmentBook;
use barber_core::{BookingError, NoticeLevel, ValidationError};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{appointment_json, context};

const LIST: &str = "/appointments/user/7";

async fn mount_list(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(LIST))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn open_splits_upcoming_from_the_rest() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            appointment_json(1, "scheduled", "2030-01-10T10:00:00"),
            appointment_json(2, "scheduled", "2020-01-10T10:00:00"),
            appointment_json(3, "cancelled", "2030-02-10T10:00:00"),
        ]),
    )
    .await;
    let (ctx, _notices) = context(&server, UserType::Client);

    let book = AppointmentBook::open(ctx).await.expect("open");
    let now = NaiveDate::from_ymd_opt(2025, 6, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("now");
    let view = book.view(now);

    let ids = |list: &[barber_core::models::Appointment]| list.iter().map(|a| a.id).collect::<Vec<_>>();
    assert_eq!(ids(&view.upcoming), vec![1]);
    assert_eq!(ids(&view.other), vec![2, 3]);
    assert_eq!(book.actions_for(1), &[AppointmentAction::Cancel]);
    assert!(book.actions_for(3).is_empty());
}

#[tokio::test]
async fn cancel_sends_only_the_status_and_resyncs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([appointment_json(1, "scheduled", "2030-01-10T10:00:00")])),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_list(
        &server,
        json!([appointment_json(1, "cancelled", "2030-01-10T10:00:00")]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/appointments/1"))
        .and(body_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Client);
    let book = AppointmentBook::open(ctx).await.expect("open");

    book.cancel(1).await.expect("cancel");

    assert_eq!(book.appointments()[0].status, AppointmentStatus::Cancelled);
    assert!(!book.is_saving(1));
    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Appointment cancelled");
}

#[tokio::test]
async fn refused_cancel_restores_the_appointment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([appointment_json(1, "scheduled", "2030-01-10T10:00:00")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/appointments/1"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Too late to cancel" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Client);
    let book = AppointmentBook::open(ctx).await.expect("open");

    let err = book.cancel(1).await.expect_err("refused");

    assert!(matches!(err, BookingError::Mutation { id: 1, .. }));
    assert_eq!(book.appointments()[0].status, AppointmentStatus::Scheduled);
    assert_eq!(book.actions_for(1), &[AppointmentAction::Cancel]);
    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(
        notices[0].message,
        "Could not cancel appointment #1: Too late to cancel"
    );
}

#[tokio::test]
async fn clients_cannot_complete_appointments() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([appointment_json(1, "scheduled", "2030-01-10T10:00:00")]),
    )
    .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Client);
    let book = AppointmentBook::open(ctx).await.expect("open");

    let err = book.complete(1).await.expect_err("not allowed");

    assert!(matches!(
        err,
        BookingError::Validation(ValidationError::TransitionNotAllowed { .. })
    ));
    assert_eq!(notices.count(NoticeLevel::Warning), 1);
}

#[tokio::test]
async fn barbers_complete_scheduled_appointments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([appointment_json(5, "scheduled", "2030-01-10T10:00:00")])),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_list(
        &server,
        json!([appointment_json(5, "completed", "2030-01-10T10:00:00")]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/appointments/5"))
        .and(body_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let book = AppointmentBook::open(ctx).await.expect("open");

    book.complete(5).await.expect("complete");

    assert_eq!(book.appointments()[0].status, AppointmentStatus::Completed);
    assert!(book.actions_for(5).is_empty());
    assert_eq!(notices.drain()[0].message, "Appointment marked as completed");
}

#[tokio::test]
async fn terminal_appointments_cannot_be_cancelled() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([appointment_json(2, "completed", "2020-01-10T10:00:00")]),
    )
    .await;
    let (ctx, _notices) = context(&server, UserType::Barber);
    let book = AppointmentBook::open(ctx).await.expect("open");

    let err = book.cancel(2).await.expect_err("terminal");

    assert_eq!(
        err.to_string(),
        "Cannot cancel an appointment that is completed"
    );
}
