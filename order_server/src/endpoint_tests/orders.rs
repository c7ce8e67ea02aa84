use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use order_engine::{
    db_types::{CustomerDetails, InventoryRecord, LineItem, Money, Order, OrderId, OrderStatusType, ProductId},
    traits::PaymentGatewayError,
    InventoryApi,
    OrdersApi,
};
use serde_json::Value;

use super::helpers::get_request;
use crate::{
    endpoint_tests::mocks::{MockInventoryManager, MockOrderManager},
    routes::{OrderByIdRoute, OrderBySessionRoute, OrdersRoute, StockRoute},
};

#[actix_web::test]
async fn fetch_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders", configure).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Order> = serde_json::from_str(&body).expect("Not a list of orders");
    assert_eq!(orders, orders_response());
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json[0]["status"], "paid");
    assert_eq!(json[0]["total"], 24100);
    assert_eq!(json[0]["customer_email"], "alice@example.com");
    assert_eq!(json[0]["items"][0]["name"], "Core Kit");
}

#[actix_web::test]
async fn fetch_order_by_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/2", configure).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.id, OrderId(2));
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/99", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order #99 does not exist"}"#);
}

#[actix_web::test]
async fn fetch_order_with_bad_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/abc", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("'abc' is not a valid order id"), "{body}");
}

#[actix_web::test]
async fn fetch_order_by_session() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/session/cs_test_1", configure).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.id, OrderId(1));
    let (status, _) = get_request("/orders/session/cs_unknown", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn backend_failure_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders", |cfg: &mut ServiceConfig| {
        let mut orders = MockOrderManager::new();
        orders.expect_fetch_orders().returning(|| Err(PaymentGatewayError::DatabaseError("disk full".into())));
        cfg.service(OrdersRoute::<MockOrderManager>::new()).app_data(web::Data::new(OrdersApi::new(orders)));
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("disk full"));
}

#[actix_web::test]
async fn fetch_stock() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/inventory/1", configure_inventory).await;
    assert_eq!(status, StatusCode::OK);
    let record: InventoryRecord = serde_json::from_str(&body).unwrap();
    assert_eq!(record.product_id, ProductId(1));
    assert_eq!(record.quantity, 5);

    let (status, _) = get_request("/inventory/2", configure_inventory).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get_request("/inventory/two", configure_inventory).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut orders = MockOrderManager::new();
    orders.expect_fetch_orders().returning(|| Ok(orders_response()));
    orders.expect_fetch_order_by_id().returning(|id| Ok(orders_response().into_iter().find(|o| o.id == id)));
    orders.expect_fetch_order_by_session().returning(|session_id| {
        Ok(orders_response().into_iter().find(|o| o.session_id.as_deref() == Some(session_id)))
    });
    cfg.service(OrdersRoute::<MockOrderManager>::new())
        .service(OrderBySessionRoute::<MockOrderManager>::new())
        .service(OrderByIdRoute::<MockOrderManager>::new())
        .app_data(web::Data::new(OrdersApi::new(orders)));
}

fn configure_inventory(cfg: &mut ServiceConfig) {
    let mut inventory = MockInventoryManager::new();
    inventory.expect_fetch_stock().returning(|product_id| {
        let record = InventoryRecord {
            product_id,
            quantity: 5,
            updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        };
        Ok((product_id == ProductId(1)).then_some(record))
    });
    cfg.service(StockRoute::<MockInventoryManager>::new()).app_data(web::Data::new(InventoryApi::new(inventory)));
}

// Mock response to `fetch_orders`, newest first
fn orders_response() -> Vec<Order> {
    vec![
        Order {
            id: OrderId(1),
            items: vec![LineItem {
                id: 1,
                order_id: OrderId(1),
                product_id: Some(ProductId(1)),
                name: "Core Kit".into(),
                unit_price: Money::from_minor(12050),
                quantity: 2,
            }],
            total: Money::from_minor(24100),
            currency: "thb".into(),
            customer: CustomerDetails {
                customer_email: Some("alice@example.com".into()),
                customer_name: Some("Alice".into()),
                ..CustomerDetails::default()
            },
            status: OrderStatusType::Paid,
            session_id: Some("cs_test_1".into()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 32, 0).unwrap(),
        },
        Order {
            id: OrderId(2),
            items: vec![LineItem {
                id: 2,
                order_id: OrderId(2),
                product_id: None,
                name: "Sticker".into(),
                unit_price: Money::from_minor(500),
                quantity: 1,
            }],
            total: Money::from_minor(500),
            currency: "thb".into(),
            customer: CustomerDetails::default(),
            status: OrderStatusType::Pending,
            session_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        },
    ]
}
