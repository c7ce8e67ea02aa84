#![allow(dead_code)]
use log::*;
use order_engine::{
    db_types::{Money, OrderId, ProductId},
    events::EventProducers,
    order_objects::{CheckoutItem, CheckoutRequest, CheckoutResult},
    test_utils::{
        fake_provider::FakeProvider,
        prepare_env::{drop_database, prepare_test_env, random_db_path},
    },
    traits::{ProviderSession, RedirectUrls},
    CheckoutApi,
    InventoryApi,
    OrderFlowApi,
    PaymentGatewayDatabase,
    ReconciliationApi,
    SqliteDatabase,
};
use serde_json::json;

pub struct TestSystem {
    pub db: SqliteDatabase,
    pub provider: FakeProvider,
    pub checkout: CheckoutApi<SqliteDatabase, FakeProvider>,
    pub reconciliation: ReconciliationApi<SqliteDatabase, FakeProvider>,
    pub inventory: InventoryApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating database");
        let provider = FakeProvider::new();
        let urls = RedirectUrls {
            success_url: "https://shop.example/success".into(),
            cancel_url: "https://shop.example/cancel".into(),
        };
        let checkout = CheckoutApi::new(db.clone(), provider.clone(), "THB", urls);
        let flow = OrderFlowApi::new(db.clone(), producers);
        let reconciliation = ReconciliationApi::new(flow, provider.clone());
        let inventory = InventoryApi::new(db.clone());
        Self { db, provider, checkout, reconciliation, inventory }
    }

    pub fn flow(&self) -> &OrderFlowApi<SqliteDatabase> {
        self.reconciliation.flow()
    }

    pub async fn restock(&self, product_id: i64, quantity: i64) {
        self.inventory.restock(ProductId(product_id), quantity).await.expect("Error restocking");
    }

    pub async fn stock(&self, product_id: i64) -> i64 {
        self.inventory.stock_for(ProductId(product_id)).await.expect("Error fetching stock").map(|r| r.quantity).unwrap_or(0)
    }

    /// Checks out a single product line and returns the result.
    pub async fn order(&self, product_id: i64, price: &str, quantity: i64) -> CheckoutResult {
        let item = CheckoutItem::new(format!("Product {product_id}"), json!(price), quantity).with_product_id(product_id);
        let request = CheckoutRequest::new(vec![item]).with_email("buyer@example.com");
        self.checkout.checkout(request).await.expect("Error during checkout")
    }

    /// The provider's view of the session after the customer has paid.
    pub fn pay(&self, session_id: &str) -> ProviderSession {
        self.provider.settle(session_id).expect("No such session")
    }

    pub async fn tear_down(self) {
        let mut db = self.db;
        let url = db.url().to_string();
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop_database(&url).await;
    }
}

pub fn price(s: &str) -> Money {
    Money::from_decimal_str(s).expect("Not a valid amount")
}

pub fn order_id(result: &CheckoutResult) -> OrderId {
    result.order.id
}
