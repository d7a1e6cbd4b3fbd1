// Aggregates all former standalone integration tests as modules.
mod appointment_book;
mod client;
mod schedule;
mod services;
mod wizard;

use std::sync::Arc;
use std::time::Duration;

use barber_core::models::UserType;
use barber_core::retry::RetryConfig;
use barber_core::{BookingClient, NoticeBuffer, ScreenContext, Session};
use serde_json::{Value, json};
use wiremock::MockServer;

pub(crate) fn session(user_type: UserType) -> Session {
    Session {
        token: "tok-abc".to_string(),
        user_id: 7,
        user_type,
        name: "Rui".to_string(),
    }
}

pub(crate) fn client(server: &MockServer) -> BookingClient {
    BookingClient::new(&server.uri(), Duration::from_secs(2))
        .expect("client")
        .with_retry(RetryConfig::disabled())
}

/// Screen context against `server`, with a buffer collecting notices.
pub(crate) fn context(server: &MockServer, user_type: UserType) -> (ScreenContext, NoticeBuffer) {
    let notices = NoticeBuffer::new();
    let ctx = ScreenContext::new(
        client(server).with_session(session(user_type)),
        Arc::new(notices.clone()),
    )
    .with_retry(RetryConfig::disabled());
    (ctx, notices)
}

pub(crate) fn appointment_json(id: i64, status: &str, date: &str) -> Value {
    json!({
        "id": id,
        "client_name": "Ana",
        "barber_name": "Rui",
        "service_name": "Fade",
        "service_price": 35.0,
        "appointment_date": date,
        "end_time": date,
        "status": status,
        "notes": null
    })
}

pub(crate) fn slot_json(id: i64, day: u8, active: bool) -> Value {
    json!({
        "id": id,
        "barber_id": 7,
        "day_of_week": day,
        "start_time": "09:00",
        "end_time": "18:00",
        "active": active
    })
}

pub(crate) fn user_json(id: i64, name: &str, user_type: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "phone": "555-0100",
        "type": user_type,
        "avatar_url": null
    })
}
