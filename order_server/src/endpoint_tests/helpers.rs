use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use order_engine::{
    test_utils::{fake_provider::FakeProvider, prepare_env::prepare_test_db},
    traits::RedirectUrls,
    CheckoutApi,
    OrderFlowApi,
    ReconciliationApi,
    SqliteDatabase,
};

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    call(TestRequest::get().uri(path), configure).await
}

pub async fn post_json<F>(path: &str, body: serde_json::Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    call(TestRequest::post().uri(path).set_json(body), configure).await
}

/// Posts the raw bytes, as the payment provider does with its notifications.
pub async fn post_raw<F>(path: &str, body: Vec<u8>, headers: &[(&str, &str)], configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri(path).set_payload(body);
    for &(name, value) in headers {
        req = req.insert_header((name, value));
    }
    call(req, configure).await
}

async fn call<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// A migrated scratch database, the fake payment provider, and the engine APIs wired to both.
pub struct TestBackend {
    pub db: SqliteDatabase,
    pub provider: FakeProvider,
}

impl TestBackend {
    pub async fn new() -> Self {
        let db = prepare_test_db(5).await;
        Self { db, provider: FakeProvider::new() }
    }

    pub fn checkout_api(&self) -> CheckoutApi<SqliteDatabase, FakeProvider> {
        let urls = RedirectUrls {
            success_url: "https://shop.example/success?session_id={CHECKOUT_SESSION_ID}".into(),
            cancel_url: "https://shop.example/cart".into(),
        };
        CheckoutApi::new(self.db.clone(), self.provider.clone(), "thb", urls)
    }

    pub fn reconciliation_api(&self) -> ReconciliationApi<SqliteDatabase, FakeProvider> {
        let flow = OrderFlowApi::new(self.db.clone(), Default::default());
        ReconciliationApi::new(flow, self.provider.clone())
    }
}
