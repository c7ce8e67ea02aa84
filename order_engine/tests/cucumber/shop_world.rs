use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
};

use cucumber::World;
use futures_util::FutureExt;
use log::*;
use order_engine::{
    events::{EventHandlers, EventHooks},
    order_objects::CheckoutResult,
    test_utils::{
        fake_provider::FakeProvider,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    traits::RedirectUrls,
    CheckoutApi,
    InventoryApi,
    OrderFlowError,
    OrderFlowApi,
    PaymentGatewayDatabase,
    ReconciliationApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct ShopWorld {
    pub system: Option<OrderSystem>,
    /// Checkouts by the name the scenario gave them
    pub checkouts: HashMap<String, CheckoutResult>,
    pub last_error: Option<OrderFlowError>,
}

impl ShopWorld {
    pub fn system(&self) -> &OrderSystem {
        self.system.as_ref().expect("Order system not initialised")
    }

    pub fn checkout(&self, name: &str) -> &CheckoutResult {
        self.checkouts.get(name).unwrap_or_else(|| panic!("No checkout named {name}"))
    }

    pub fn record<T>(&mut self, result: Result<T, OrderFlowError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🥒️ Call failed: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

pub struct OrderSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub provider: FakeProvider,
    pub checkout: CheckoutApi<SqliteDatabase, FakeProvider>,
    pub reconciliation: ReconciliationApi<SqliteDatabase, FakeProvider>,
    pub inventory: InventoryApi<SqliteDatabase>,
    pub orders_paid: Arc<AtomicI32>,
    pub payments_failed: Arc<AtomicI32>,
}

impl Debug for OrderSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderSystem ({})", self.db_path)
    }
}

impl OrderSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");

        let orders_paid = Arc::new(AtomicI32::new(0));
        let payments_failed = Arc::new(AtomicI32::new(0));
        let mut hooks = EventHooks::default();
        let counter = Arc::clone(&orders_paid);
        hooks.on_order_paid(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}.boxed()
        });
        let counter = Arc::clone(&payments_failed);
        hooks.on_payment_failed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}.boxed()
        });
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let provider = FakeProvider::new();
        let urls = RedirectUrls::default();
        let checkout = CheckoutApi::new(db.clone(), provider.clone(), "thb", urls);
        let reconciliation = ReconciliationApi::new(OrderFlowApi::new(db.clone(), producers), provider.clone());
        let inventory = InventoryApi::new(db.clone());
        Self { db_path: url, db, provider, checkout, reconciliation, inventory, orders_paid, payments_failed }
    }

    pub async fn close(&mut self) {
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
