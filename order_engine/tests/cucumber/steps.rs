use std::{str::FromStr, sync::atomic::Ordering, time::Duration};

use cucumber::{then, when};
use order_engine::{
    db_types::{Money, OrderStatusType, ProductId},
    order_objects::{CheckoutItem, CheckoutRequest},
    test_utils::fake_provider::{FakeProvider, FAKE_SIGNATURE},
    OrderFlowError,
    OrderManagement,
};
use serde_json::json;

use crate::cucumber::ShopWorld;

#[when(expr = "'{word}' checks out {int} of product {int} at {word} THB as order {word}")]
async fn checkout(world: &mut ShopWorld, customer: String, quantity: i64, product_id: i64, price: String, name: String) {
    let item = CheckoutItem::new(format!("Product {product_id}"), json!(price), quantity).with_product_id(product_id);
    let request = CheckoutRequest::new(vec![item]).with_email(format!("{customer}@example.com"));
    let result = world.system().checkout.checkout(request).await;
    if let Some(result) = world.record(result) {
        world.checkouts.insert(name, result);
    }
}

#[when(expr = "the customer pays for order {word}")]
async fn customer_pays(world: &mut ShopWorld, name: String) {
    let session_id = world.checkout(&name).session_id.clone();
    world.system().provider.settle(&session_id).expect("No such session");
}

#[when(expr = "the payment session for order {word} expires")]
async fn session_expires(world: &mut ShopWorld, name: String) {
    let session_id = world.checkout(&name).session_id.clone();
    world.system().provider.expire(&session_id).expect("No such session");
}

#[when(expr = "the provider pushes {string} for order {word}")]
async fn provider_pushes(world: &mut ShopWorld, event_type: String, name: String) {
    push(world, event_type, name, FAKE_SIGNATURE).await;
}

#[when(expr = "a forged {string} push arrives for order {word}")]
async fn forged_push(world: &mut ShopWorld, event_type: String, name: String) {
    push(world, event_type, name, "forged").await;
}

async fn push(world: &mut ShopWorld, event_type: String, name: String, signature: &str) {
    let session_id = world.checkout(&name).session_id.clone();
    let session = world.system().provider.session(&session_id).expect("No such session");
    let payload = FakeProvider::event_payload(&event_type, &session);
    let result = world.system().reconciliation.handle_push(&payload, signature).await;
    world.record(result);
}

#[when(expr = "the browser verifies the session for order {word}")]
async fn browser_verifies(world: &mut ShopWorld, name: String) {
    let session_id = world.checkout(&name).session_id.clone();
    let result = world.system().reconciliation.verify_session(&session_id).await;
    world.record(result);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut ShopWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "order {word} is {word}")]
async fn order_status(world: &mut ShopWorld, name: String, status: String) {
    let expected = OrderStatusType::from_str(&status).expect("Not a valid order status");
    let id = world.checkout(&name).order.id;
    let order = world.system().db.fetch_order_by_id(id).await.expect("Error fetching order").expect("No such order");
    assert_eq!(order.status, expected, "Order {name} has the wrong status");
}

#[then(expr = "order {word} has a total of {word} THB")]
async fn order_total(world: &mut ShopWorld, name: String, total: String) {
    let expected = Money::from_decimal_str(&total).expect("Not a valid amount");
    assert_eq!(world.checkout(&name).order.total, expected);
}

#[then(expr = "product {int} has {int} units in stock")]
async fn stock_level(world: &mut ShopWorld, product_id: i64, quantity: i64) {
    let record = world.system().inventory.stock_for(ProductId(product_id)).await.expect("Error fetching stock");
    assert_eq!(record.map(|r| r.quantity), Some(quantity));
}

#[then(expr = "the last call was refused because of {word}")]
async fn last_error(world: &mut ShopWorld, reason: String) {
    let err = world.last_error.as_ref().expect("The last call succeeded");
    let matched = match reason.as_str() {
        "signature" => matches!(err, OrderFlowError::Signature(_)),
        "stock" => matches!(err, OrderFlowError::InsufficientStock { .. }),
        "validation" => matches!(err, OrderFlowError::Validation(_)),
        "status" => matches!(err, OrderFlowError::InvalidTransition { .. }),
        other => panic!("Unknown failure reason: {other}"),
    };
    assert!(matched, "Expected a {reason} failure, got {err}");
}

#[then("the last call succeeded")]
async fn last_call_succeeded(world: &mut ShopWorld) {
    assert!(world.last_error.is_none(), "The last call failed: {:?}", world.last_error);
}

#[then(expr = "{int} order paid notification(s) was/were sent")]
async fn paid_notifications(world: &mut ShopWorld, count: i32) {
    assert_eq!(world.system().orders_paid.load(Ordering::SeqCst), count);
}

#[then(expr = "{int} payment failed notification(s) was/were sent")]
async fn failed_notifications(world: &mut ShopWorld, count: i32) {
    assert_eq!(world.system().payments_failed.load(Ordering::SeqCst), count);
}
