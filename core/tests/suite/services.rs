use barber_core::models::UserType;
use barber_core::screens::{ServiceCatalog, ServiceInput};
use barber_core::{BookingError, ValidationError};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::context;

fn service_json(id: i64, name: &str, price: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "price": price,
        "duration": 30,
        "barber_id": 7
    })
}

#[tokio::test]
async fn edit_that_fails_restores_the_old_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/barber/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([service_json(4, "Fade", 35.0)])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/services/4"))
        .and(body_json(json!({
            "name": "Fade",
            "description": "",
            "price": 40.0,
            "duration": 30
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "Price locked" })))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let catalog = ServiceCatalog::open(ctx).await.expect("open");

    let result = catalog
        .edit(
            4,
            ServiceInput {
                name: " Fade ".to_string(),
                description: String::new(),
                price: 40.0,
                duration: 30,
            },
        )
        .await;

    assert!(result.is_err());
    assert_eq!(catalog.services()[0].price, 35.0);
    assert_eq!(
        notices.drain()[0].message,
        "Could not update service #4: Price locked"
    );
}

#[tokio::test]
async fn clients_cannot_manage_services() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let (ctx, _notices) = context(&server, UserType::Client);

    let result = ServiceCatalog::open(ctx).await;

    assert!(matches!(
        result,
        Err(BookingError::Validation(ValidationError::BarberOnly(_)))
    ));
}

#[tokio::test]
async fn added_service_is_not_reported_as_failed_when_the_reload_breaks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/barber/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/barber/7"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": "maintenance" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let (ctx, notices) = context(&server, UserType::Barber);
    let catalog = ServiceCatalog::open(ctx).await.expect("open");

    catalog
        .add(ServiceInput {
            name: "Beard trim".to_string(),
            description: String::new(),
            price: 15.0,
            duration: 20,
        })
        .await
        .expect("the service was created");

    let notices = notices.drain();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].message, "Service added");
    assert_eq!(notices[1].message, "Could not load services: maintenance");
}
