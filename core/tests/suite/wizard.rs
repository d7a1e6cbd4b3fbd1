use barber_core::models::UserType;
use barber_core::screens::{BookingWizard, WizardStep};
use barber_core::{BookingError, NoticeLevel, ValidationError};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{context, user_json};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 5, d).expect("date")
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/barbers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json(3, "Rui", "barber")])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/barber/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 9,
            "name": "Fade",
            "description": "Skin fade",
            "price": 35.0,
            "duration": 30
        }])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn booking_posts_the_joined_local_date_time() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("GET"))
        .and(path("/availability/3"))
        .and(query_param("date", "2030-05-06"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["10:30", "11:00"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/appointments"))
        .and(body_json(json!({
            "client_id": 7,
            "barber_id": 3,
            "service_id": 9,
            "appointment_date": "2030-05-06T10:30:00",
            "notes": "Short on the sides"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 40 })))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Client);

    let mut wizard = BookingWizard::open(ctx).await.expect("open");
    wizard.select_barber(3).await.expect("barber");
    wizard.select_service(9).expect("service");
    wizard.select_date(day(6), day(1)).await.expect("date");
    assert_eq!(wizard.available_times(), ["10:30", "11:00"]);
    wizard.select_time("10:30").expect("time");
    wizard.set_notes("Short on the sides");
    wizard.review().expect("complete");
    assert_eq!(wizard.step(), WizardStep::Confirm);

    wizard.submit().await.expect("booked");

    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Appointment booked");
}

#[tokio::test]
async fn past_dates_never_query_availability() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("GET"))
        .and(path("/availability/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let (ctx, _notices) = context(&server, UserType::Client);
    let mut wizard = BookingWizard::open(ctx).await.expect("open");
    wizard.select_barber(3).await.expect("barber");

    let err = wizard.select_date(day(1), day(2)).await.expect_err("past");

    assert!(matches!(
        err,
        BookingError::Validation(ValidationError::PastDate(_))
    ));
    assert_eq!(wizard.selection().date, None);
}

#[tokio::test]
async fn changing_barber_clears_the_service() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let (ctx, _notices) = context(&server, UserType::Client);
    let mut wizard = BookingWizard::open(ctx).await.expect("open");
    wizard.select_barber(3).await.expect("barber");
    wizard.select_service(9).expect("service");

    wizard.select_barber(3).await.expect("barber again");

    assert_eq!(wizard.selection().service_id, None);
    assert_eq!(wizard.step(), WizardStep::Service);
}

#[tokio::test]
async fn conflicting_booking_shows_the_server_message() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("GET"))
        .and(path("/availability/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["10:30"])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Time slot already taken" })),
        )
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Client);
    let mut wizard = BookingWizard::open(ctx).await.expect("open");
    wizard.select_barber(3).await.expect("barber");
    wizard.select_service(9).expect("service");
    wizard.select_date(day(6), day(1)).await.expect("date");
    wizard.select_time("10:30").expect("time");

    let err = wizard.submit().await.expect_err("conflict");

    assert!(matches!(err, BookingError::Api(_)));
    assert_eq!(
        notices.drain()[0].message,
        "Could not book appointment: Time slot already taken"
    );
}
