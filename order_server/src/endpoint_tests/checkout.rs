use actix_web::{http::StatusCode, web, web::ServiceConfig};
use order_engine::{
    db_types::OrderStatusType,
    order_objects::CheckoutResult,
    test_utils::fake_provider::FakeProvider,
    OrdersApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::{post_json, TestBackend};
use crate::routes::CheckoutRoute;

fn configure(backend: &TestBackend) -> impl FnOnce(&mut ServiceConfig) {
    let api = backend.checkout_api();
    move |cfg: &mut ServiceConfig| {
        cfg.service(CheckoutRoute::<SqliteDatabase, FakeProvider>::new()).app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn checkout_creates_a_pending_order_and_session() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let cart = json!({
        "items": [
            { "id": 1, "title": "Core Kit", "price": "120.50", "quantity": 2 },
            { "name": "Sticker", "price": 0.25, "quantity": "4" }
        ],
        "customerEmail": "alice@example.com",
        "customerName": "Alice",
        "address": { "line1": "1 Main St", "city": "Bangkok" }
    });
    let (status, body) = post_json("/checkout", cart, configure(&backend)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result: CheckoutResult = serde_json::from_str(&body).unwrap();
    assert!(result.session_id.starts_with("cs_fake_"));
    assert_eq!(result.url.as_deref(), Some(format!("https://pay.example/{}", result.session_id).as_str()));
    let order = result.order;
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.total.to_string(), "242.00");
    assert_eq!(order.currency, "thb");
    assert_eq!(order.session_id.as_deref(), Some(result.session_id.as_str()));
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].name, "Core Kit");
    assert_eq!(order.customer.customer_email.as_deref(), Some("alice@example.com"));
    assert!(order.customer.address.as_deref().unwrap_or_default().contains("Bangkok"));

    let stored = OrdersApi::new(backend.db.clone()).order_by_session(&result.session_id).await.unwrap();
    assert_eq!(stored.map(|o| o.id), Some(order.id));
}

#[actix_web::test]
async fn invalid_carts_are_rejected() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let carts = [
        json!({ "items": [] }),
        json!({}),
        json!({ "items": [{ "name": "Free lunch", "price": 0, "quantity": 1 }] }),
        json!({ "items": [{ "name": "Refund", "price": "-5.00", "quantity": 1 }] }),
        json!({ "items": [{ "name": "Half", "price": "5.00", "quantity": 0.5 }] }),
    ];
    for cart in carts {
        let (status, body) = post_json("/checkout", cart.clone(), configure(&backend)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{cart}: {body}");
        let json: Value = serde_json::from_str(&body).unwrap();
        assert!(json["error"].as_str().unwrap_or_default().starts_with("Could not read request body"), "{body}");
    }
    let orders = OrdersApi::new(backend.db.clone()).orders().await.unwrap();
    assert!(orders.is_empty());
    assert_eq!(backend.provider.created_sessions(), 0);
}

#[actix_web::test]
async fn provider_outage_is_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    backend.provider.fail_requests(true);
    let cart = json!({ "items": [{ "name": "Core Kit", "price": "120.50" }] });
    let (status, body) = post_json("/checkout", cart, configure(&backend)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("provider unavailable"), "{body}");
    let orders = OrdersApi::new(backend.db.clone()).orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatusType::Pending);
    assert_eq!(orders[0].session_id, None);
}
