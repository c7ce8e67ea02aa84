use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use order_engine::{
    events::EventProducers,
    CheckoutApi,
    InventoryApi,
    OrderFlowApi,
    OrdersApi,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::stripe::StripeProvider,
    notifications::{create_notification_handlers, Notifier},
    routes::{
        health,
        CheckoutRoute,
        OrderByIdRoute,
        OrderBySessionRoute,
        OrdersRoute,
        PaymentWebhookRoute,
        StockRoute,
        VerifySessionRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Connected to database at {}", config.database_url);
    let provider =
        StripeProvider::new(config.stripe.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let handlers = create_notification_handlers(Notifier::new(config.notifications.clone()), config.event_buffer);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Customer notification handlers started");
    let srv = create_server_instance(config, db, provider, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: StripeProvider,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let proxy = config.proxy_config();
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(
            db.clone(),
            provider.clone(),
            &config.stripe.currency,
            config.redirect_urls.clone(),
        )
        .with_policy(config.input_policy);
        let flow_api = OrderFlowApi::new(db.clone(), producers.clone());
        let reconciliation_api = ReconciliationApi::new(flow_api, provider.clone());
        let orders_api = OrdersApi::new(db.clone());
        let inventory_api = InventoryApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(CheckoutRoute::<SqliteDatabase, StripeProvider>::new())
            .service(VerifySessionRoute::<SqliteDatabase, StripeProvider>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderBySessionRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(StockRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("shop::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(inventory_api))
            .app_data(web::Data::new(proxy))
            .service(health)
            .service(PaymentWebhookRoute::<SqliteDatabase, StripeProvider>::new())
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
