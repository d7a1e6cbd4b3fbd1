use std::time::Duration;

use barber_core::ApiError;
use barber_core::models::UserType;
use barber_core::retry::RetryConfig;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{client, session, user_json};

#[tokio::test]
async fn authenticated_routes_carry_session_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/barbers"))
        .and(header("authorization", "Bearer tok-abc"))
        .and(header("x-user-id", "7"))
        .and(header("x-user-type", "client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json(3, "Rui", "barber")])))
        .expect(1)
        .mount(&server)
        .await;

    let barbers = client(&server)
        .with_session(session(UserType::Client))
        .barbers()
        .await
        .expect("barbers");

    assert_eq!(barbers.len(), 1);
    assert_eq!(barbers[0].user_type, UserType::Barber);
}

#[tokio::test]
async fn authenticated_route_without_session_never_hits_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server).barbers().await.expect_err("no session");

    assert!(matches!(err, ApiError::NotAuthenticated));
}

#[tokio::test]
async fn server_error_text_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/appointments/4"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Horário indisponível" })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .with_session(session(UserType::Client))
        .update_appointment(4, &Default::default())
        .await
        .expect_err("conflict");

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.to_string(), "Horário indisponível");
}

#[tokio::test]
async fn validation_error_lists_are_joined() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": ["Email already registered", "Phone is required"]
        })))
        .mount(&server)
        .await;
    let form = barber_core::models::RegisterUser {
        name: "Ana Souza".to_string(),
        email: "ana@example.com".to_string(),
        password: "Secret123".to_string(),
        confirm_password: "Secret123".to_string(),
        phone: "555-0101".to_string(),
        user_type: UserType::Client,
    };

    let err = client(&server).register(&form).await.expect_err("rejected");

    assert_eq!(
        err.to_string(),
        "Email already registered; Phone is required"
    );
}

#[tokio::test]
async fn login_without_embedded_user_fetches_the_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "rui@example.com", "password": "Secret123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t-1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(7, "Rui", "barber")))
        .expect(1)
        .mount(&server)
        .await;

    let session = client(&server)
        .login("rui@example.com", "Secret123")
        .await
        .expect("login");

    assert_eq!(session.token, "t-1");
    assert_eq!(session.user_id, 7);
    assert!(session.is_barber());
}

#[tokio::test]
async fn availability_passes_the_date_as_a_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/availability/3"))
        .and(query_param("date", "2030-05-06"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["09:00", "09:30"])))
        .expect(1)
        .mount(&server)
        .await;
    let date = NaiveDate::from_ymd_opt(2030, 5, 6).expect("date");

    let times = client(&server)
        .with_session(session(UserType::Client))
        .available_times(3, date)
        .await
        .expect("times");

    assert_eq!(times, vec!["09:00".to_string(), "09:30".to_string()]);
}

#[tokio::test]
async fn reads_retry_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/barbers"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/barbers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let retry = RetryConfig {
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
        backoff_multiplier: 2.0,
        jitter: false,
    };

    let barbers = barber_core::BookingClient::new(&server.uri(), Duration::from_secs(2))
        .expect("client")
        .with_retry(retry)
        .with_session(session(UserType::Client))
        .barbers()
        .await
        .expect("third attempt succeeds");

    assert!(barbers.is_empty());
}

#[tokio::test]
async fn writes_are_not_retried_by_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/schedules/2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .with_retry(RetryConfig::default())
        .with_session(session(UserType::Barber))
        .delete_slot(2)
        .await
        .expect_err("unavailable");

    assert_eq!(err.status(), Some(503));
}
