use actix_web::{http::StatusCode, web, web::ServiceConfig};
use order_engine::{
    db_types::{OrderStatusType, ProductId},
    order_objects::{CheckoutItem, CheckoutRequest, CheckoutResult, VerifyResult},
    test_utils::fake_provider::{FakeProvider, FAKE_SIGNATURE},
    InventoryApi,
    OrdersApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::{post_json, post_raw, TestBackend};
use crate::{
    config::ProxyConfig,
    routes::{PaymentWebhookRoute, VerifySessionRoute},
};

fn configure(backend: &TestBackend) -> impl FnOnce(&mut ServiceConfig) {
    let api = backend.reconciliation_api();
    move |cfg: &mut ServiceConfig| {
        cfg.service(PaymentWebhookRoute::<SqliteDatabase, FakeProvider>::new())
            .service(VerifySessionRoute::<SqliteDatabase, FakeProvider>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(ProxyConfig::default()));
    }
}

async fn place_order(backend: &TestBackend, stock: i64, quantity: i64) -> CheckoutResult {
    InventoryApi::new(backend.db.clone()).restock(ProductId(1), stock).await.unwrap();
    let item = CheckoutItem::new("Core Kit", json!("120.50"), quantity).with_product_id(1);
    backend.checkout_api().checkout(CheckoutRequest::new(vec![item])).await.unwrap()
}

async fn stock(backend: &TestBackend) -> i64 {
    let record = InventoryApi::new(backend.db.clone()).stock_for(ProductId(1)).await.unwrap();
    record.map(|r| r.quantity).unwrap_or_default()
}

async fn status_of(backend: &TestBackend, session_id: &str) -> OrderStatusType {
    let order = OrdersApi::new(backend.db.clone()).order_by_session(session_id).await.unwrap();
    order.expect("order exists").status
}

fn completed_payload(backend: &TestBackend, session_id: &str) -> Vec<u8> {
    let session = backend.provider.settle(session_id).expect("session exists");
    FakeProvider::event_payload("checkout.session.completed", &session)
}

#[actix_web::test]
async fn webhook_confirms_the_order() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let checkout = place_order(&backend, 5, 2).await;
    let payload = completed_payload(&backend, &checkout.session_id);

    let (status, body) =
        post_raw("/webhook", payload.clone(), &[("Fake-Signature", FAKE_SIGNATURE)], configure(&backend)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["received"], true);
    assert_eq!(json["outcome"]["result"], "confirmed");
    assert_eq!(json["outcome"]["transition"], "applied");
    assert_eq!(json["outcome"]["order"]["status"], "paid");
    assert_eq!(stock(&backend).await, 3);

    // Redelivery is acknowledged and changes nothing
    let (status, body) =
        post_raw("/webhook", payload, &[("Fake-Signature", FAKE_SIGNATURE)], configure(&backend)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["outcome"]["transition"], "no_change");
    assert_eq!(stock(&backend).await, 3);
}

#[actix_web::test]
async fn forged_webhooks_are_rejected() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let checkout = place_order(&backend, 5, 2).await;
    let payload = completed_payload(&backend, &checkout.session_id);

    let (status, body) =
        post_raw("/webhook", payload.clone(), &[("Fake-Signature", "forged")], configure(&backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"The payment notification could not be authenticated."#), "{body}");

    let (status, _) = post_raw("/webhook", payload, &[], configure(&backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(status_of(&backend, &checkout.session_id).await, OrderStatusType::Pending);
    assert_eq!(stock(&backend).await, 5);
}

#[actix_web::test]
async fn stock_shortfall_is_acknowledged_but_not_applied() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let checkout = place_order(&backend, 1, 2).await;
    let payload = completed_payload(&backend, &checkout.session_id);

    let (status, body) =
        post_raw("/webhook", payload, &[("Fake-Signature", FAKE_SIGNATURE)], configure(&backend)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["received"], true);
    assert!(json.get("outcome").is_none());
    assert!(json["error"].as_str().unwrap_or_default().starts_with("Not enough stock of product 1"), "{body}");
    assert_eq!(status_of(&backend, &checkout.session_id).await, OrderStatusType::Pending);
    assert_eq!(stock(&backend).await, 1);
}

#[actix_web::test]
async fn ignored_events_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let payload = json!({ "type": "customer.created" }).to_string().into_bytes();
    let (status, body) =
        post_raw("/webhook", payload, &[("Fake-Signature", FAKE_SIGNATURE)], configure(&backend)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["outcome"]["result"], "ignored");
    assert_eq!(json["outcome"]["event_type"], "customer.created");
}

#[actix_web::test]
async fn verify_session_confirms_settled_payments() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let checkout = place_order(&backend, 5, 2).await;

    let body = json!({ "sessionId": checkout.session_id });
    let (status, response) = post_json("/verify-session", body.clone(), configure(&backend)).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    let result: VerifyResult = serde_json::from_str(&response).unwrap();
    assert!(!result.confirmed);
    assert_eq!(result.order.map(|o| o.status), Some(OrderStatusType::Pending));

    backend.provider.settle(&checkout.session_id);
    let (status, response) = post_json("/verify-session", body, configure(&backend)).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    let result: VerifyResult = serde_json::from_str(&response).unwrap();
    assert!(result.confirmed);
    assert_eq!(result.order.map(|o| o.status), Some(OrderStatusType::Paid));
    assert_eq!(stock(&backend).await, 3);
}

#[actix_web::test]
async fn verify_session_errors() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let (status, _) = post_json("/verify-session", json!({}), configure(&backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_json("/verify-session", json!({ "session_id": "cs_nope" }), configure(&backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    backend.provider.fail_requests(true);
    let (status, _) = post_json("/verify-session", json!({ "session_id": "cs_nope" }), configure(&backend)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
